pub mod config;
pub mod stats;
pub mod timer;

use pomotick_core::{Config, Database, TimerConfig, TimerEngine};

/// Open the persisted engine against the current configuration.
pub fn open_engine(config: &Config) -> Result<TimerEngine<Database>, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(TimerEngine::restore(db, &config.timer))
}

/// Load the engine from `db`, run `f` on it and save the result, all under
/// the database write lock.
///
/// Every command that changes timer state goes through here, so a running
/// `timer run` and a `timer pause` from another shell never overwrite each
/// other. Nothing is saved if `f` fails.
pub fn with_engine<T>(
    db: &Database,
    config: &TimerConfig,
    f: impl FnOnce(&mut TimerEngine<&Database>) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    db.exclusive(|| {
        let mut engine = TimerEngine::restore(db, config);
        let value = f(&mut engine)?;
        engine.save()?;
        Ok(value)
    })
}
