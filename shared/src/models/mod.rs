//! Domain models for the Paintrack warehouse platform

mod article;
mod batch;
mod draft;
mod inventory;
mod ledger;
mod user;

pub use article::*;
pub use batch::*;
pub use draft::*;
pub use inventory::*;
pub use ledger::*;
pub use user::*;
