//! HTTP handlers

mod articles;
mod auth;
mod draft_groups;
mod drafts;
mod inventory;
mod receiving;

pub use articles::*;
pub use auth::*;
pub use draft_groups::*;
pub use drafts::*;
pub use inventory::*;
pub use receiving::*;
