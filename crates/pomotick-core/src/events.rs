use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change of the timer produces an Event.
/// Display layers print or render them; nothing in the core consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: Phase,
        to: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A phase ran down to zero on a tick.
    PhaseCompleted {
        completed: Phase,
        next: Phase,
        remaining_secs: u64,
        /// Whether the next phase was auto-started.
        running: bool,
        completed_focus_count: u64,
        /// Id of the session record appended for this completion, if any.
        session_id: Option<i64>,
        at: DateTime<Utc>,
    },
    /// A configuration save recomputed the countdown of a stopped timer.
    DurationsApplied {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        remaining_secs: u64,
        total_secs: u64,
        running: bool,
        completed_focus_count: u64,
        current_streak: u32,
        best_streak: u32,
        at: DateTime<Utc>,
    },
}
