//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde_json::{json, Map, Value};

use crate::config::Config;

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Port to try first (overrides config and PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Interface to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Directory to serve static files from
    #[arg(long, value_name = "DIR")]
    pub public_dir: Option<PathBuf>,
}

impl ServeCommand {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(public_dir) = &self.public_dir {
            config.paths.public_dir.clone_from(public_dir);
        }
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Recipe name
    #[arg(long)]
    pub name: String,

    /// An ingredient (repeat for more, in order)
    #[arg(short, long = "ingredient", value_name = "TEXT")]
    pub ingredients: Vec<String>,

    /// A step (repeat for more, in order)
    #[arg(short = 's', long = "instruction", value_name = "TEXT")]
    pub instructions: Vec<String>,

    /// A note (repeat for more)
    #[arg(short, long = "note", value_name = "TEXT")]
    pub notes: Vec<String>,

    /// Creation date as YYYY-MM-DD (defaults to today, UTC)
    #[arg(short, long)]
    pub date: Option<String>,
}

impl AddCommand {
    /// Build the same payload the API accepts.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("name".to_string(), json!(self.name));
        payload.insert("ingredients".to_string(), json!(self.ingredients));
        payload.insert("instructions".to_string(), json!(self.instructions));
        payload.insert("notes".to_string(), json!(self.notes));
        if let Some(date) = &self.date {
            payload.insert("creation-date".to_string(), json!(date));
        }
        Value::Object(payload)
    }
}

/// Remove command arguments.
#[derive(Debug, Args)]
pub struct RemoveCommand {
    /// Zero-based positions to remove, as shown by `list`
    #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
    pub indices: Vec<i64>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
