use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use pomotick_core::{Config, Database, Event, Phase, TaskContext, TimerEngine};

use super::with_engine;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Mark the timer as running
    Start,
    /// Stop the countdown, keeping the remaining time
    Pause,
    /// Back to a stopped focus phase
    Reset,
    /// Abandon the current phase
    Skip,
    /// Start the timer and tick it once per second until Ctrl-C
    Run {
        /// Task being worked on; completed focus sessions are logged under it
        #[arg(long)]
        task: Option<String>,
        /// Category for the task
        #[arg(long, requires = "task")]
        category: Option<String>,
    },
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

fn print_countdown(phase: Phase, remaining: u64) {
    eprint!(
        "\r{:<12} {:02}:{:02}",
        phase.label(),
        remaining / 60,
        remaining % 60
    );
    let _ = std::io::stderr().flush();
}

/// Reread the config file, keeping `current` if it cannot be loaded.
fn reload_config(current: Config) -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "could not reload config, keeping the previous one");
            current
        }
    }
}

/// Drive the persisted engine at 1 Hz on the current thread.
///
/// Each tick reloads the config and runs against the state in the
/// database, so `config set`, `timer pause`, `timer skip` and `timer reset`
/// from other shells take effect on the next tick. Returns once a phase
/// completes without auto-starting the next one, when another command
/// stops the timer, or on Ctrl-C (which pauses).
async fn run_foreground(
    db: &Database,
    task: Option<&TaskContext>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    let (started, mut phase, mut remaining) = with_engine(db, &config.timer, |engine| {
        Ok((engine.start(), engine.phase(), engine.remaining_secs()))
    })?;
    if let Some(event) = started {
        print_event(&event)?;
    }

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // The first tick completes immediately.
    interval.tick().await;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        print_countdown(phase, remaining);
        tokio::select! {
            _ = interval.tick() => {
                config = reload_config(config);
                let ticked = with_engine(db, &config.timer, |engine| {
                    let event = engine.tick(&config.timer, task)?;
                    Ok((event, engine.is_running(), engine.phase(), engine.remaining_secs()))
                });
                match ticked {
                    Ok((Some(event), running, now_phase, now_remaining)) => {
                        eprintln!();
                        print_event(&event)?;
                        if !running {
                            return Ok(());
                        }
                        phase = now_phase;
                        remaining = now_remaining;
                    }
                    Ok((None, false, _, _)) => {
                        eprintln!();
                        tracing::info!("timer stopped by another command");
                        return Ok(());
                    }
                    Ok((None, true, now_phase, now_remaining)) => {
                        phase = now_phase;
                        remaining = now_remaining;
                    }
                    // The tick is retried on the next interval.
                    Err(e) => tracing::warn!(error = %e, "could not advance timer"),
                }
            }
            _ = &mut ctrl_c => {
                eprintln!();
                let paused = with_engine(db, &config.timer, |engine| Ok(engine.pause()))?;
                if let Some(event) = paused {
                    print_event(&event)?;
                }
                return Ok(());
            }
        }
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let timer = &config.timer;
    let db = Database::open()?;

    let event = match action {
        TimerAction::Status => TimerEngine::restore(&db, timer).snapshot(timer),
        TimerAction::Run { task, category } => {
            let task = task.map(|name| TaskContext::new(name, category));
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            return runtime.block_on(run_foreground(&db, task.as_ref()));
        }
        action => with_engine(&db, timer, |engine| {
            let event = match action {
                TimerAction::Start => engine.start(),
                TimerAction::Pause => engine.pause(),
                TimerAction::Reset => engine.reset(timer),
                TimerAction::Skip => engine.skip(timer),
                TimerAction::Status | TimerAction::Run { .. } => None,
            };
            // No-op commands print the unchanged state.
            Ok(event.unwrap_or_else(|| engine.snapshot(timer)))
        })?,
    };

    print_event(&event)?;
    Ok(())
}
