//! Behavior shared by every registry-built strategy

use std::sync::Arc;
use std::thread;

use banditry::prelude::*;
use banditry::{StrategyKind, snapshot};

const ALL: [(&str, &[f64]); 5] = [
    ("epsilon-greedy", &[0.1]),
    ("softmax", &[0.1]),
    ("ucb1", &[]),
    ("thompson", &[1.0]),
    ("uniform", &[]),
];

fn build(name: &str, params: &[f64], arms: usize, seed: u64) -> AnyStrategy {
    StrategyBuilder::new(name)
        .arms(arms)
        .params(params)
        .seed(seed)
        .build()
        .unwrap()
}

#[test]
fn test_counts_sum_to_pulls() {
    for (name, params) in ALL {
        let strategy = build(name, params, 4, 42);
        for pull in 1..=250u64 {
            let arm = strategy.select_arm().unwrap();
            assert!((1..=4).contains(&arm), "{name} selected {arm}");
            strategy.update(arm, (arm % 2) as f64).unwrap();
            assert_eq!(strategy.counters().total_pulls(), pull);
        }
    }
}

#[test]
fn test_reset_returns_to_zero_state() {
    for (name, params) in ALL {
        let strategy = build(name, params, 3, 7);
        let descriptor = strategy.to_string();
        for _ in 0..20 {
            let arm = strategy.select_arm().unwrap();
            strategy.update(arm, 1.0).unwrap();
        }
        strategy.reset();
        assert_eq!(strategy.counters().counts(), vec![0, 0, 0], "{name}");
        assert_eq!(strategy.counters().values(), vec![0.0, 0.0, 0.0], "{name}");
        assert_eq!(strategy.arms(), 3);
        assert_eq!(strategy.to_string(), descriptor);
    }
}

#[test]
fn test_same_seed_same_choices() {
    for (name, params) in ALL {
        let a = build(name, params, 5, 99);
        let b = build(name, params, 5, 99);
        for _ in 0..100 {
            let arm = a.select_arm().unwrap();
            assert_eq!(arm, b.select_arm().unwrap(), "{name}");
            a.update(arm, 0.5).unwrap();
            b.update(arm, 0.5).unwrap();
        }
    }
}

#[test]
fn test_greedy_without_exploration_picks_argmax() {
    let strategy = new_strategy("epsilon-greedy", 4, &[0.0]).unwrap();
    strategy
        .init(&Snapshot::new(vec![0.2, 0.7, 0.1, 0.4]))
        .unwrap();
    for _ in 0..100 {
        assert_eq!(strategy.select_arm().unwrap(), 2);
    }
}

#[test]
fn test_init_with_wrong_arity_keeps_state() {
    for (name, params) in ALL {
        let strategy = build(name, params, 2, 1);
        strategy.update(1, 1.0).unwrap();
        let result = strategy.init(&Snapshot::new(vec![0.1, 0.2, 0.3]));
        assert!(matches!(
            result,
            Err(BanditError::ArmCountMismatch { expected: 2, got: 3 })
        ));
        assert_eq!(strategy.counters().counts(), vec![1, 0]);
    }
}

#[test]
fn test_snapshot_line_round_trip_through_strategy() {
    let strategy = new_strategy("ucb1", 2, &[]).unwrap();
    let observed = Snapshot::from_observations(2, [(2, 1.0), (2, 0.0)]).unwrap();
    assert_eq!(snapshot::encode_line(&observed), "2 0.000000 0.500000 0 2");
    assert_eq!(snapshot::encode_means_line(&observed), "2 0.000000 0.500000");

    let line = snapshot::parse_line("2 0.120000 0.300000").unwrap();
    strategy.init(&line).unwrap();
    assert_eq!(strategy.counters().values(), vec![0.12, 0.3]);
    // counts absent from the line mean zero pulls
    assert_eq!(strategy.counters().counts(), vec![0, 0]);
}

#[test]
fn test_shared_strategy_across_threads() {
    let strategy = Arc::new(build("thompson", &[1.0], 3, 5));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let strategy = Arc::clone(&strategy);
            thread::spawn(move || {
                for _ in 0..500 {
                    let arm = strategy.select_arm().unwrap();
                    strategy.update(arm, if arm == 3 { 1.0 } else { 0.0 }).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(strategy.counters().total_pulls(), 2000);
    let counts = strategy.counters().counts();
    assert!(counts[2] > counts[0] && counts[2] > counts[1], "{counts:?}");
}

#[test]
fn test_simulated_delay_of_one_matches_plain() {
    for (name, params) in ALL {
        let plain = build(name, params, 3, 11);
        let delayed = SimulatedDelayedStrategy::new(build(name, params, 3, 11), 1).unwrap();
        for t in 0..200 {
            let arm = plain.select_arm().unwrap();
            assert_eq!(arm, delayed.select_arm().unwrap(), "{name} at {t}");
            let reward = if arm == 2 { 1.0 } else { 0.25 };
            plain.update(arm, reward).unwrap();
            delayed.update(arm, reward).unwrap();
        }
        assert_eq!(plain.counters().snapshot(), delayed.counters().snapshot());
    }
}

#[test]
fn test_boxed_strategies_from_kinds() {
    let strategies: Vec<Box<dyn Strategy>> = ALL
        .iter()
        .map(|(name, params)| Box::new(new_strategy(name, 2, params).unwrap()) as Box<dyn Strategy>)
        .collect();
    let descriptors: Vec<String> = strategies.iter().map(|s| s.to_string()).collect();
    assert_eq!(
        descriptors,
        vec![
            "EpsilonGreedy(epsilon=0.10)",
            "Softmax(tau=0.10)",
            "UCB1",
            "Thompson(alpha=1.00)",
            "Uniform",
        ]
    );
    assert_eq!("random".parse::<StrategyKind>().unwrap(), StrategyKind::Uniform);
}
