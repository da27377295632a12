//! eCourts portal automation.
//!
//! Case-status lookups and cause-list acquisition against the eCourts
//! services portal, driven through a headless browser session. The library
//! backs both the `ecourts` command-line tool and its REST server.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod models;
pub mod portal;
pub mod server;
pub mod services;
pub mod session;
pub mod storage;

pub use error::{PortalError, Result};
pub use portal::Portal;
