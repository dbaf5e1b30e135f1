use clap::Subcommand;
use pomotick_core::{Config, Database};

use super::with_engine;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "timer.focus_duration")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

/// Hand a saved configuration to the persisted engine.
///
/// A stopped timer picks up the new durations now. A timer counting down
/// under `timer run` keeps its countdown and uses them from its next
/// transition.
fn apply_to_engine(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    with_engine(&db, &config.timer, |engine| {
        engine.apply_config(&config.timer);
        Ok(())
    })
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            apply_to_engine(&config)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            apply_to_engine(&config)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
