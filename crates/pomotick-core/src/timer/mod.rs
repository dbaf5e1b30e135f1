mod engine;
mod phase;
mod streak;

pub use engine::{Stats, TimerEngine, TimerState};
pub use phase::Phase;
pub use streak::StreakTracker;
