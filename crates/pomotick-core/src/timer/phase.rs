use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_break(self) -> bool {
        matches!(self, Phase::ShortBreak | Phase::LongBreak)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Focus => "Focus",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }

    /// Break taken after the `completed_focus_count`-th focus interval.
    ///
    /// An interval of zero is treated as one.
    pub fn break_after(completed_focus_count: u64, long_break_interval: u32) -> Self {
        let interval = u64::from(long_break_interval.max(1));
        if completed_focus_count % interval == 0 {
            Phase::LongBreak
        } else {
            Phase::ShortBreak
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_of_four() {
        let breaks: Vec<Phase> = (1..=8).map(|n| Phase::break_after(n, 4)).collect();
        use Phase::{LongBreak as L, ShortBreak as S};
        assert_eq!(breaks, vec![S, S, S, L, S, S, S, L]);
    }

    #[test]
    fn interval_of_one_is_always_long() {
        assert!((1..=5).all(|n| Phase::break_after(n, 1) == Phase::LongBreak));
        assert_eq!(Phase::break_after(3, 0), Phase::LongBreak);
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Phase::ShortBreak).unwrap(),
            "\"short_break\""
        );
        assert!(Phase::LongBreak.is_break());
        assert!(!Phase::Focus.is_break());
    }
}
