//! Core services for the errorly issue tracker.
//!
//! - [`util::id`]: time-ordered 64-bit identifiers
//! - [`query`]: the `key:value` issue query language
//! - [`search`]: paged issue search
//! - [`service`]: issue reports and actions
//! - [`webhook`]: signed webhook delivery with failure tracking
//! - [`storage`]: `SQLite` persistence behind store traits

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod query;
pub mod search;
pub mod service;
pub mod storage;
pub mod util;
pub mod webhook;

pub use error::{ErrorlyError, Result};
