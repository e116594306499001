//! `recipebox` - CLI for the recipe catalog
//!
//! This binary runs the web server and manages the catalog file directly.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::collections::BTreeSet;

use anyhow::Context;
use clap::Parser;

use recipebox::cli::{AddCommand, Cli, Command, ConfigCommand, ListCommand, RemoveCommand};
use recipebox::{init_logging, server, Config, Recipe, RecipeStore};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let mut config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Serve(serve_cmd) => {
            serve_cmd.apply(&mut config);
            config.validate()?;
            handle_serve(&config)
        }
        Command::List(list_cmd) => handle_list(&config, &list_cmd),
        Command::Add(add_cmd) => handle_add(&config, &add_cmd),
        Command::Remove(remove_cmd) => handle_remove(&config, &remove_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn handle_serve(config: &Config) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(server::run(config))?;
    Ok(())
}

fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let store = RecipeStore::new(config.catalog_path());
    let recipes = store.load();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
        return Ok(());
    }

    if recipes.is_empty() {
        println!("No recipes in {}", store.path().display());
        return Ok(());
    }

    for (index, recipe) in recipes.iter().enumerate() {
        println!(
            "{index:>3}  {}  ({}; {} ingredients, {} steps)",
            recipe.name,
            recipe.creation_date,
            recipe.ingredients.len(),
            recipe.instructions.len()
        );
    }
    Ok(())
}

fn handle_add(config: &Config, cmd: &AddCommand) -> anyhow::Result<()> {
    let recipe = Recipe::from_payload(&cmd.to_payload())?;
    let store = RecipeStore::new(config.catalog_path());
    let stored = store
        .append(recipe)
        .with_context(|| format!("failed to save recipe to {}", store.path().display()))?;

    println!("Added \"{}\" ({})", stored.name, stored.creation_date);
    Ok(())
}

fn handle_remove(config: &Config, cmd: &RemoveCommand) -> anyhow::Result<()> {
    let indices: BTreeSet<i64> = cmd.indices.iter().copied().collect();
    let store = RecipeStore::new(config.catalog_path());
    let summary = store
        .remove_by_indices(&indices)
        .with_context(|| format!("failed to update {}", store.path().display()))?;

    println!(
        "Removed {} recipe(s), {} remaining",
        summary.removed, summary.remaining
    );
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Host:               {}", config.server.host);
                println!("  Port:               {}", config.server.port);
                println!("  Max port retries:   {}", config.server.max_port_retries);
                println!("  Retry delay (ms):   {}", config.server.retry_delay_ms);
                println!();
                println!("[Paths]");
                println!("  Public directory:   {}", config.paths.public_dir.display());
                println!("  Data directory:     {}", config.data_dir().display());
                println!("  Catalog file:       {}", config.catalog_path().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
