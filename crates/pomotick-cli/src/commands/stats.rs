use pomotick_core::Config;

use super::open_engine;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let engine = open_engine(&config)?;
    println!("{}", serde_json::to_string_pretty(&engine.stats())?);
    Ok(())
}

pub fn run_log(limit: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let engine = open_engine(&config)?;
    let records = engine.session_log().records();
    let shown = &records[..limit.unwrap_or(records.len()).min(records.len())];
    println!("{}", serde_json::to_string_pretty(shown)?);
    Ok(())
}
