//! Consecutive-completion streak.
//!
//! The streak advances once per completed focus interval. It has no
//! calendar component and never decays.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakTracker {
    current_streak: u32,
    best_streak: u32,
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    /// Advance after a completed focus interval. Keeps `best >= current`.
    pub fn record_completion(&mut self) {
        self.current_streak = self.current_streak.saturating_add(1);
        self.best_streak = self.best_streak.max(self.current_streak);
    }

    /// Repair a deserialized tracker whose best fell behind current.
    pub(crate) fn normalized(mut self) -> Self {
        self.best_streak = self.best_streak.max(self.current_streak);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_advances_both() {
        let mut streak = StreakTracker::new();
        streak.record_completion();
        streak.record_completion();
        assert_eq!(streak.current_streak(), 2);
        assert_eq!(streak.best_streak(), 2);
    }

    #[test]
    fn normalized_restores_invariant() {
        let streak: StreakTracker =
            serde_json::from_str(r#"{"current_streak":5,"best_streak":3}"#).unwrap();
        let streak = streak.normalized();
        assert_eq!(streak.best_streak(), 5);
        assert!(streak.best_streak() >= streak.current_streak());
    }
}
