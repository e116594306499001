//! `recipebox` - A small recipe catalog served over HTTP
//!
//! This library provides the recipe model, the JSON-file catalog, and the
//! web server that exposes the catalog next to a static site.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod recipe;
pub mod server;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use recipe::Recipe;
pub use store::{RecipeStore, RemovalSummary};
