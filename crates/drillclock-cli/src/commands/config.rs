use std::path::PathBuf;

use clap::Subcommand;
use drillclock_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a starter config
    Init {
        /// Where to write it (defaults to the standard location)
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the default config location
    Path,
    /// Print the effective config after defaults are applied
    Show {
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Init { path, force } => {
            let path = match path {
                Some(p) => p,
                None => Config::path()?,
            };
            let config = Config::init(&path, force)?;
            println!(
                "wrote {} with {} programs",
                path.display(),
                config.plans.len()
            );
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
        ConfigAction::Show { config, json } => {
            let config = Config::load(config.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }
    Ok(())
}
