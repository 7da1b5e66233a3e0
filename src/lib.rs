//! Order-sheet search for dealership staff.
//!
//! The service half ([`server`], [`fetch`]) reads the order sheet and serves
//! it as a JSON record array. The portal half ([`search`], [`pager`],
//! [`export`], [`portal`]) filters, pages and exports those records.

pub mod config;
pub mod export;
pub mod fetch;
pub mod pager;
pub mod portal;
pub mod records;
pub mod search;
pub mod server;
