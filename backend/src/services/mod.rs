//! Business logic services
//!
//! Each service owns one slice of the domain. Engine operations that must
//! compose with a larger transaction take a `&mut PgConnection` and never
//! commit; the public entry points begin and commit their own transaction.

pub mod adjustment;
pub mod approval;
pub mod article;
pub mod auth;
pub mod batch;
pub mod draft_group;
pub mod inventory;
pub mod inventory_count;
pub mod ledger;
pub mod receiving;
