//! Management CLI for the earbuds companion settings.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ config::loader ──▶ StoreConfig
//!                                          │
//!                                          ▼
//!   settings.json ◀──▶ persistence ◀── SettingsStore ──▶ hooks (logged here)
//!                                          │
//!                                          ▼
//!                                  export (redacted view)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use earbuds_settings::config::load_or_default;
use earbuds_settings::lifecycle::startup::{open, startup};
use earbuds_settings::observability::init_logging;
use earbuds_settings::settings::{export, set_by_name, LoggingHooks, FIELDS};

#[derive(Parser)]
#[command(name = "earbuds-settings")]
#[command(about = "Inspect and edit the earbuds companion settings", long_about = None)]
struct Cli {
    /// Engine configuration (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the settings file location.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current settings (sensitive values redacted)
    Show,
    /// Report whether the stored settings can be loaded
    Check,
    /// List the schema
    Fields,
    /// Change one setting
    Set { field: String, value: String },
    /// Restore every setting to its default
    Reset,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(path) = cli.settings {
        config.storage.path = path;
    }
    init_logging(&config.logging);

    match cli.command {
        Commands::Show => {
            let (store, _) = startup(&config, Arc::new(LoggingHooks))?;
            println!("{}", serde_json::to_string_pretty(&export(&store.get_current()))?);
        }
        Commands::Check => {
            let store = open(&config, Arc::new(LoggingHooks));
            let result = store.load()?;
            println!("{}: {}", config.storage.path.display(), result);
        }
        Commands::Fields => {
            for desc in FIELDS.iter().filter(|d| !d.deprecated) {
                let mut flags = Vec::new();
                if desc.hook.is_some() {
                    flags.push("applied");
                }
                if desc.sensitive {
                    flags.push("sensitive");
                }
                println!(
                    "{:<26} {:<28} default={:<10} {}",
                    desc.name,
                    desc.kind.as_str(),
                    desc.display(&desc.default_value()),
                    flags.join(",")
                );
            }
        }
        Commands::Set { field, value } => {
            let (store, _) = startup(&config, Arc::new(LoggingHooks))?;
            let mut access = store.modifiable_access();
            if let Err(e) = set_by_name(&mut access, &field, &value) {
                // Dropping commits the unchanged copy.
                drop(access);
                return Err(e.into());
            }
            let changes = access.commit()?;
            if changes.is_empty() {
                println!("{} unchanged", field);
            } else {
                println!("{} updated", field);
            }
        }
        Commands::Reset => {
            let (store, _) = startup(&config, Arc::new(LoggingHooks))?;
            let changes = store.reset()?;
            println!("{} setting(s) reset", changes.len());
        }
    }

    Ok(())
}
