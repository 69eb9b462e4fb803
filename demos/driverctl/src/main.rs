//! driverctl
//!
//! Resolves and starts driver plugins from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Where would the on-premise metadata driver be loaded from?
//! cargo run --package driverctl -- resolve metadata --family onprem
//!
//! # Start the metadata-db driver with a config file
//! cargo run --package driverctl -- --preset metadata-db start metadatadb --config db.ini
//!
//! # List plugins linked into this binary
//! cargo run --package driverctl -- plugins
//! ```
//!
//! Host settings are read from `driverkit.toml` and `DRIVERKIT_*` variables;
//! command-line flags override them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use driverkit::prelude::*;
use driverkit::runtime::config::{LogLevel, Preset, SettingsLoader};
use tracing::debug;

// Links the example plugins so their registrations are collected.
use onprem_driver as _;

#[derive(Parser, Debug)]
#[command(name = "driverctl", version, about = "Resolve and start driverkit plugins")]
struct Cli {
    /// Host settings file (TOML).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Naming policy preset.
    #[arg(long, value_enum, global = true)]
    preset: Option<PresetArg>,

    /// Config section to read instead of the preset's.
    #[arg(long, global = true)]
    section: Option<String>,

    /// Extra plugin search directory (repeatable).
    #[arg(long = "search-path", global = true)]
    search_paths: Vec<PathBuf>,

    /// Log debug output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the plugin file a start would load.
    Resolve {
        driver_type: String,
        #[arg(long)]
        family: Option<String>,
        /// INI config file (`CONFIG_PATH` wins if set).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Start a plugin and describe it.
    Start {
        driver_type: String,
        #[arg(long)]
        family: Option<String>,
        /// INI config file (`CONFIG_PATH` wins if set).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List plugins registered in this binary.
    Plugins,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PresetArg {
    DriverInterface,
    MetadataDb,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::DriverInterface => Preset::DriverInterface,
            PresetArg::MetadataDb => Preset::MetadataDb,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = SettingsLoader::new();
    if let Some(path) = &cli.settings {
        loader = loader.file(path);
    }
    let mut settings = loader.load().context("failed to load driverkit settings")?;

    if cli.verbose {
        settings.logging.level = LogLevel::Debug;
    }
    if let Some(preset) = cli.preset {
        settings.host.preset = preset.into();
    }
    if let Some(section) = cli.section {
        settings.host.section = Some(section);
    }
    settings.host.search_paths.extend(cli.search_paths);
    logging::init_from_config(&settings.logging);
    debug!(?settings, "Effective settings");

    if let Command::Plugins = cli.command {
        for (driver_type, family) in PluginRegistry::global().keys() {
            println!("{driver_type}\t{family}");
        }
        return Ok(());
    }

    let host = PluginHost::from_settings(&settings.host)
        .build()
        .context("failed to set up plugin host")?;

    match cli.command {
        Command::Resolve {
            driver_type,
            family,
            config,
        } => {
            let mapping = host
                .config_source(config.as_deref())
                .map(|path| host.load_config(&path))
                .transpose()?;
            let path = host.resolve_path(&driver_type, family.as_deref(), mapping.as_ref())?;
            println!("{}", path.display());
        }
        Command::Start {
            driver_type,
            family,
            config,
        } => {
            let plugin = host.start_plugin(&driver_type, family.as_deref(), config.as_deref())?;
            println!("plugin:  {}", plugin.name());
            println!("driver:  {}", plugin.driver_type());
            println!("family:  {}", plugin.family());
            println!("unit:    {}", plugin.unit_name());
            println!("path:    {}", plugin.path().display());
        }
        Command::Plugins => {}
    }
    Ok(())
}
