//! # recipe-tool
//!
//! Inspect and edit stored recipe files outside the game:
//! - `dump`: print the selection and every stored recipe in a file
//! - `path`: print which file a world or server uses
//! - `clear`: clear one or all recipes for a world or server

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use scroller_common::nbt;
use scroller_recipes::storage::MAX_PERSISTED_INDEX;
use scroller_recipes::{CraftingRecipe, RecipeStore, StorageContext, StoreConfig};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Recipe file tool
#[derive(Parser, Debug)]
#[command(name = "recipe-tool", version, about)]
struct Cli {
    /// Store configuration file
    #[arg(short, long, env = "SCROLLER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the contents of a recipe file
    Dump {
        /// Recipe file
        file: PathBuf,
    },
    /// Print the recipe file used for a context
    Path(Target),
    /// Clear stored recipes
    Clear {
        #[command(flatten)]
        target: Target,

        /// Slot to clear
        #[arg(short, long, conflicts_with = "all", required_unless_present = "all")]
        index: Option<usize>,

        /// Clear every slot
        #[arg(long)]
        all: bool,
    },
}

/// Which recipe file to act on.
#[derive(Args, Debug)]
struct Target {
    /// Host data directory (the storage subdirectory is appended)
    #[arg(short, long)]
    data_dir: PathBuf,

    /// Single-player world folder
    #[arg(long, conflicts_with = "server")]
    world: Option<String>,

    /// Server address
    #[arg(long)]
    server: Option<String>,

    /// Use the shared global file
    #[arg(long)]
    global: bool,
}

impl Target {
    fn context(&self) -> StorageContext {
        match (&self.world, &self.server) {
            (Some(world), _) => StorageContext::local_world(world),
            (None, Some(server)) => StorageContext::remote(server),
            (None, None) => StorageContext::None,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose {
        "recipe_tool=debug,scroller_recipes=debug"
    } else {
        "recipe_tool=info"
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    let config = match &cli.config {
        Some(path) => StoreConfig::load_from(path),
        None => StoreConfig::default(),
    };
    debug!("Using config: {:?}", config);

    match cli.command {
        Command::Dump { file } => dump(&file),
        Command::Path(target) => {
            let global = config.global || target.global;
            let dir = config.storage_dir(&target.data_dir);
            println!("{}", target.context().file_path(&dir, global).display());
            Ok(())
        }
        Command::Clear { target, index, all } => clear(&config, &target, index, all),
    }
}

fn dump(file: &Path) -> Result<()> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?,
    );
    let root = nbt::read_compressed(reader)
        .with_context(|| format!("Failed to decode {}", file.display()))?;

    let mut store = RecipeStore::new(MAX_PERSISTED_INDEX + 1, true);
    store
        .load_nbt(&root)
        .with_context(|| format!("{} is not a recipe file", file.display()))?;

    println!("Selected: {}", store.selection());
    for (index, recipe) in store.recipes().enumerate().filter(|(_, r)| r.is_valid()) {
        print_recipe(index, recipe);
    }
    Ok(())
}

fn print_recipe(index: usize, recipe: &CraftingRecipe) {
    let output = recipe
        .result()
        .map_or_else(|| "(no output)".to_string(), |s| format!("{} x{}", s.id, s.count));
    println!("[{index}] {output} ({}-slot grid)", recipe.grid_size());

    for (slot, stack) in recipe.ingredients().iter().enumerate() {
        if let Some(stack) = stack {
            let extra = if stack.tag.is_some() { " +data" } else { "" };
            println!("    {slot}: {} x{}{extra}", stack.id, stack.count);
        }
    }
}

fn clear(config: &StoreConfig, target: &Target, index: Option<usize>, all: bool) -> Result<()> {
    let dir = config.storage_dir(&target.data_dir);
    let context = target.context();

    // Cover every slot a file can hold, so rewriting it keeps slots beyond
    // the configured count.
    let mut store = RecipeStore::with_grid_slots(
        MAX_PERSISTED_INDEX + 1,
        config.grid_slots,
        config.global || target.global,
    );

    let path = context.file_path(&dir, store.is_global());
    if !store.read_from_disk(&dir, &context) {
        bail!("No readable recipe file at {}", path.display());
    }

    if all {
        for i in 0..store.recipe_count() {
            store.clear_recipe(i);
        }
    } else if let Some(index) = index {
        if index >= store.recipe_count() {
            bail!(
                "Slot {index} does not exist, the store has {} slots",
                store.recipe_count()
            );
        }
        store.clear_recipe(index);
    }

    if !store.write_to_disk(&dir, &context) {
        bail!("Failed to write {}", path.display());
    }
    info!("Updated {}", path.display());
    Ok(())
}
