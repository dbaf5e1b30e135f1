//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It does not use
//! internal threads - the caller owns the one-second trigger and calls
//! `tick()` while the timer is running.
//!
//! ## Phase Transitions
//!
//! ```text
//! Focus -(tick to zero)-> ShortBreak | LongBreak -(tick to zero)-> Focus
//! Focus -(skip)-> ShortBreak        ShortBreak | LongBreak -(skip)-> Focus
//! any   -(reset)-> Focus
//! ```
//!
//! Configuration is never cached: every call that needs durations takes
//! the current [`TimerConfig`] by reference.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::restore(Database::open()?, &config.timer);
//! engine.start();
//! // Once per second:
//! engine.tick(&config.timer, task.as_ref())?; // Some(Event) when a phase completes
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::phase::Phase;
use super::streak::StreakTracker;
use crate::error::Result;
use crate::events::Event;
use crate::storage::{KvStore, SessionLog, TaskContext, TimerConfig};

/// Persisted part of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: Phase,
    pub remaining_secs: u64,
    pub running: bool,
    /// Incremented only when a focus phase runs down; never reset.
    pub completed_focus_count: u64,
    #[serde(default)]
    pub streak: StreakTracker,
}

impl TimerState {
    /// Stopped at the start of a focus phase.
    pub fn initial(config: &TimerConfig) -> Self {
        Self {
            phase: Phase::Focus,
            remaining_secs: config.duration_secs(Phase::Focus),
            running: false,
            completed_focus_count: 0,
            streak: StreakTracker::default(),
        }
    }
}

/// Counters and log aggregates for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub completed_focus_count: u64,
    pub current_streak: u32,
    pub best_streak: u32,
    pub sessions: usize,
    pub total_focus_minutes: u64,
    pub average_session_length: f64,
}

/// Core timer engine.
///
/// Owns the countdown, the completion accounting and the session log,
/// plus the store they are persisted to. All mutation goes through
/// `&mut self`, so commands and ticks are serialized by construction.
pub struct TimerEngine<S: KvStore> {
    state: TimerState,
    log: SessionLog,
    store: S,
}

impl<S: KvStore> TimerEngine<S> {
    /// Store key holding the serialized [`TimerState`].
    pub const STATE_KEY: &'static str = "timer_state";

    /// Create an engine in its initial state, with the session log
    /// rehydrated from `store`.
    pub fn new(store: S, config: &TimerConfig) -> Self {
        let log = SessionLog::load_all(&store);
        Self {
            state: TimerState::initial(config),
            log,
            store,
        }
    }

    /// Rebuild the engine from `store`, including count and streak.
    ///
    /// Missing or unparseable timer state falls back to the initial state.
    pub fn restore(store: S, config: &TimerConfig) -> Self {
        let log = SessionLog::load_all(&store);
        let state = match store.get(Self::STATE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<TimerState>(&raw) {
                Ok(mut state) => {
                    state.streak = state.streak.normalized();
                    state
                }
                Err(e) => {
                    tracing::warn!(error = %e, "timer state is corrupt, starting fresh");
                    TimerState::initial(config)
                }
            },
            Ok(None) => TimerState::initial(config),
            Err(e) => {
                tracing::warn!(error = %e, "could not read timer state, starting fresh");
                TimerState::initial(config)
            }
        };
        Self { state, log, store }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn completed_focus_count(&self) -> u64 {
        self.state.completed_focus_count
    }

    pub fn streak(&self) -> &StreakTracker {
        &self.state.streak
    }

    pub fn current_streak(&self) -> u32 {
        self.state.streak.current_streak()
    }

    pub fn best_streak(&self) -> u32 {
        self.state.streak.best_streak()
    }

    pub fn session_log(&self) -> &SessionLog {
        &self.log
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stats(&self) -> Stats {
        Stats {
            completed_focus_count: self.state.completed_focus_count,
            current_streak: self.current_streak(),
            best_streak: self.best_streak(),
            sessions: self.log.len(),
            total_focus_minutes: self.log.total_focus_minutes(),
            average_session_length: self.log.average_session_length(),
        }
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self, config: &TimerConfig) -> f64 {
        let total = config.duration_secs(self.state.phase);
        if total == 0 {
            return 0.0;
        }
        (1.0 - (self.state.remaining_secs as f64 / total as f64)).clamp(0.0, 1.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, config: &TimerConfig) -> Event {
        Event::StateSnapshot {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            total_secs: config.duration_secs(self.state.phase),
            running: self.state.running,
            completed_focus_count: self.state.completed_focus_count,
            current_streak: self.current_streak(),
            best_streak: self.best_streak(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state.running {
            return None;
        }
        self.state.running = true;
        tracing::debug!(phase = %self.state.phase, remaining = self.state.remaining_secs, "timer started");
        Some(Event::TimerStarted {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        self.state.running = false;
        tracing::debug!(phase = %self.state.phase, remaining = self.state.remaining_secs, "timer paused");
        Some(Event::TimerPaused {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Back to a stopped focus phase. Count, streak and log are kept.
    pub fn reset(&mut self, config: &TimerConfig) -> Option<Event> {
        self.state.running = false;
        self.state.phase = Phase::Focus;
        self.state.remaining_secs = config.duration_secs(Phase::Focus);
        tracing::debug!("timer reset");
        Some(Event::TimerReset {
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Abandon the current phase.
    ///
    /// Skipping focus goes to a short break without counting the interval.
    pub fn skip(&mut self, config: &TimerConfig) -> Option<Event> {
        let from = self.state.phase;
        let to = if from == Phase::Focus {
            Phase::ShortBreak
        } else {
            Phase::Focus
        };
        self.state.phase = to;
        self.state.remaining_secs = config.duration_secs(to);
        self.state.running = false;
        tracing::debug!(%from, %to, "phase skipped");
        Some(Event::TimerSkipped {
            from,
            to,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Apply a freshly saved configuration.
    ///
    /// A stopped timer restarts its countdown from the new duration of the
    /// current phase. A running timer is left alone; the new durations
    /// apply from its next transition.
    pub fn apply_config(&mut self, config: &TimerConfig) -> Option<Event> {
        if self.state.running {
            return None;
        }
        self.state.remaining_secs = config.duration_secs(self.state.phase);
        Some(Event::DurationsApplied {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Advance one second. Does nothing unless running.
    ///
    /// Returns `Some(Event::PhaseCompleted)` when the phase ran down.
    ///
    /// # Errors
    /// A completion is persisted before it is applied. If the store write
    /// fails the engine is left exactly as it was and the error returned;
    /// the next tick retries the completion.
    pub fn tick(
        &mut self,
        config: &TimerConfig,
        task: Option<&TaskContext>,
    ) -> Result<Option<Event>> {
        if !self.state.running {
            return Ok(None);
        }
        if self.state.remaining_secs > 1 {
            self.state.remaining_secs -= 1;
            return Ok(None);
        }
        self.complete_phase(config, task).map(Some)
    }

    /// Persist the timer state on its own.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.state)?;
        self.store.set(Self::STATE_KEY, &json)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_phase(
        &mut self,
        config: &TimerConfig,
        task: Option<&TaskContext>,
    ) -> Result<Event> {
        let completed = self.state.phase;
        let mut next = self.state.clone();
        let mut staged_log = None;
        let mut session_id = None;

        if completed == Phase::Focus {
            next.completed_focus_count += 1;
            next.streak.record_completion();
            if let Some(context) = task {
                let record = self
                    .log
                    .next_record(Utc::now(), config.focus_duration, context);
                session_id = Some(record.id);
                staged_log = Some(self.log.staged(record)?);
            }
            next.phase = Phase::break_after(next.completed_focus_count, config.long_break_interval);
            next.running = config.auto_start_breaks;
        } else {
            next.phase = Phase::Focus;
            next.running = config.auto_start_pomodoros;
        }
        next.remaining_secs = config.duration_secs(next.phase);

        let state_json = serde_json::to_string(&next)?;
        match &staged_log {
            Some((_, log_json)) => self.store.set_many(&[
                (SessionLog::KEY, log_json.as_str()),
                (Self::STATE_KEY, state_json.as_str()),
            ])?,
            None => self.store.set(Self::STATE_KEY, &state_json)?,
        }

        if let Some((log, _)) = staged_log {
            self.log = log;
        }
        self.state = next;

        if let Some(id) = session_id {
            tracing::info!(
                id,
                minutes = config.focus_duration,
                count = self.state.completed_focus_count,
                "focus session recorded"
            );
        }
        tracing::debug!(%completed, next = %self.state.phase, running = self.state.running, "phase completed");

        Ok(Event::PhaseCompleted {
            completed,
            next: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            running: self.state.running,
            completed_focus_count: self.state.completed_focus_count,
            session_id,
            at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn engine() -> (TimerEngine<MemoryStore>, TimerConfig) {
        let config = TimerConfig::default();
        (TimerEngine::new(MemoryStore::new(), &config), config)
    }

    #[test]
    fn starts_stopped_in_focus() {
        let (engine, config) = engine();
        assert_eq!(engine.phase(), Phase::Focus);
        assert_eq!(engine.remaining_secs(), config.duration_secs(Phase::Focus));
        assert!(!engine.is_running());
        assert_eq!(engine.completed_focus_count(), 0);
    }

    #[test]
    fn start_pause_are_idempotent() {
        let (mut engine, _) = engine();
        assert!(engine.start().is_some());
        assert!(engine.start().is_none());
        assert!(engine.is_running());

        assert!(engine.pause().is_some());
        assert!(engine.pause().is_none());
        assert!(!engine.is_running());
    }

    #[test]
    fn tick_decrements_only_while_running() {
        let (mut engine, config) = engine();
        let before = engine.remaining_secs();
        assert!(engine.tick(&config, None).unwrap().is_none());
        assert_eq!(engine.remaining_secs(), before);

        engine.start();
        engine.tick(&config, None).unwrap();
        assert_eq!(engine.remaining_secs(), before - 1);
    }

    #[test]
    fn skip_focus_goes_to_short_break_without_accounting() {
        let (mut engine, config) = engine();
        engine.start();
        engine.skip(&config);
        assert_eq!(engine.phase(), Phase::ShortBreak);
        assert_eq!(engine.remaining_secs(), 5 * 60);
        assert!(!engine.is_running());
        assert_eq!(engine.completed_focus_count(), 0);
        assert_eq!(engine.current_streak(), 0);

        engine.skip(&config);
        assert_eq!(engine.phase(), Phase::Focus);
    }

    #[test]
    fn break_completion_returns_to_focus() {
        let config = TimerConfig {
            short_break: 1,
            auto_start_pomodoros: true,
            ..TimerConfig::default()
        };
        let mut engine = TimerEngine::new(MemoryStore::new(), &config);
        engine.skip(&config);
        engine.start();
        for _ in 0..59 {
            assert!(engine.tick(&config, None).unwrap().is_none());
        }
        let event = engine.tick(&config, None).unwrap();
        assert!(matches!(
            event,
            Some(Event::PhaseCompleted {
                completed: Phase::ShortBreak,
                next: Phase::Focus,
                running: true,
                ..
            })
        ));
        assert_eq!(engine.remaining_secs(), 25 * 60);
        assert_eq!(engine.completed_focus_count(), 0);
    }

    #[test]
    fn apply_config_only_touches_stopped_timer() {
        let (mut engine, _) = engine();
        let longer = TimerConfig {
            focus_duration: 50,
            ..TimerConfig::default()
        };

        engine.start();
        assert!(engine.apply_config(&longer).is_none());
        assert_eq!(engine.remaining_secs(), 25 * 60);

        engine.pause();
        assert!(engine.apply_config(&longer).is_some());
        assert_eq!(engine.remaining_secs(), 50 * 60);
    }

    #[test]
    fn snapshot_reports_state() {
        let (engine, config) = engine();
        match engine.snapshot(&config) {
            Event::StateSnapshot {
                phase,
                remaining_secs,
                total_secs,
                running,
                ..
            } => {
                assert_eq!(phase, Phase::Focus);
                assert_eq!(remaining_secs, 25 * 60);
                assert_eq!(total_secs, 25 * 60);
                assert!(!running);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
        assert_eq!(engine.phase_progress(&config), 0.0);
    }

    #[test]
    fn save_and_restore_round_trip() {
        let (mut engine, config) = engine();
        engine.skip(&config);
        engine.save().unwrap();

        let restored = TimerEngine::restore(engine.store, &config);
        assert_eq!(restored.phase(), Phase::ShortBreak);
    }

    #[test]
    fn restore_from_corrupt_state_is_fresh() {
        let config = TimerConfig::default();
        let store = MemoryStore::new();
        store
            .set(TimerEngine::<MemoryStore>::STATE_KEY, "garbage")
            .unwrap();
        let engine = TimerEngine::restore(store, &config);
        assert_eq!(engine.state(), &TimerState::initial(&config));
    }
}
