//! Property tests: arbitrary command sequences keep the engine's invariants.

use pomotick_core::{MemoryStore, Phase, TaskContext, TimerConfig, TimerEngine};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Command {
    Start,
    Pause,
    Reset,
    Skip,
    Tick(u16),
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Start),
        Just(Command::Pause),
        Just(Command::Reset),
        Just(Command::Skip),
        (1u16..200).prop_map(Command::Tick),
    ]
}

fn config() -> impl Strategy<Value = TimerConfig> {
    (1u32..4, 1u32..3, 1u32..5, 1u32..6, any::<bool>(), any::<bool>()).prop_map(
        |(focus, short, long, interval, breaks, pomodoros)| TimerConfig {
            focus_duration: focus,
            short_break: short,
            long_break: long,
            long_break_interval: interval,
            auto_start_breaks: breaks,
            auto_start_pomodoros: pomodoros,
        },
    )
}

proptest! {
    #[test]
    fn invariants_hold_for_any_command_sequence(
        config in config(),
        commands in prop::collection::vec(command(), 0..60),
        with_task in any::<bool>(),
    ) {
        let task = TaskContext::new("Prop", None);
        let task = with_task.then_some(&task);
        let mut engine = TimerEngine::new(MemoryStore::new(), &config);
        let mut last_count = 0;

        for command in commands {
            match command {
                Command::Start => { engine.start(); }
                Command::Pause => { engine.pause(); }
                Command::Reset => { engine.reset(&config); }
                Command::Skip => { engine.skip(&config); }
                Command::Tick(n) => {
                    for _ in 0..n {
                        engine.tick(&config, task).unwrap();
                    }
                }
            }

            prop_assert!(engine.remaining_secs() <= config.duration_secs(engine.phase()));
            prop_assert!(engine.best_streak() >= engine.current_streak());
            prop_assert!(engine.completed_focus_count() >= last_count);
            prop_assert_eq!(u64::from(engine.current_streak()), engine.completed_focus_count());
            if with_task {
                prop_assert_eq!(engine.session_log().len() as u64, engine.completed_focus_count());
            } else {
                prop_assert!(engine.session_log().is_empty());
            }
            last_count = engine.completed_focus_count();
        }
    }

    #[test]
    fn skip_never_counts(config in config(), ticks in 0u64..120) {
        let mut engine = TimerEngine::new(MemoryStore::new(), &config);
        engine.start();
        for _ in 0..ticks.min(config.duration_secs(Phase::Focus) - 1) {
            engine.tick(&config, None).unwrap();
        }
        prop_assert_eq!(engine.phase(), Phase::Focus);
        engine.skip(&config);
        prop_assert_eq!(engine.completed_focus_count(), 0);
        prop_assert_eq!(engine.current_streak(), 0);
        prop_assert_eq!(engine.phase(), Phase::ShortBreak);
    }
}
