//! # Pomotick Core Library
//!
//! This library provides the core business logic for the Pomotick focus timer.
//! The CLI binary is a thin layer over it; any other front end drives the same
//! engine the same way.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A tick-driven state machine cycling focus, short break
//!   and long break. The caller owns the one-second trigger.
//! - **Accounting**: Completed-interval count, current/best streak and an
//!   append-only session log with aggregates.
//! - **Storage**: A key-value seam backed by SQLite, and TOML-based
//!   configuration.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`SessionLog`]: Completed focus sessions and their aggregates
//! - [`StreakTracker`]: Current and best streaks
//! - [`Database`]: Durable key-value persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use storage::{
    Config, Database, KvStore, MemoryStore, SessionLog, SessionRecord, TaskContext, TimerConfig,
};
pub use timer::{Phase, Stats, StreakTracker, TimerEngine, TimerState};
