use serde::Deserialize;
use slidematch::{PlanConfig, SlideError, TrajectoryPlanner};

#[derive(Deserialize)]
struct Golden {
    cases: Vec<GoldenCase>,
}

#[derive(Deserialize)]
struct GoldenCase {
    distance: i32,
    time_quantum: f64,
    overflow: i32,
    steps: Vec<i32>,
}

const QUANTA: [f64; 4] = [0.05, 0.1, 0.2, 0.3];

#[test]
fn matches_golden_sequences() {
    let raw = include_str!("data/trajectory_golden.json");
    let golden: Golden = serde_json::from_str(raw).unwrap();
    let planner = TrajectoryPlanner::default();
    for case in golden.cases {
        let seq = planner
            .plan(case.distance, case.time_quantum, case.overflow)
            .unwrap();
        assert_eq!(
            seq.steps(),
            case.steps.as_slice(),
            "distance={} quantum={} overflow={}",
            case.distance,
            case.time_quantum,
            case.overflow
        );
    }
}

#[test]
fn sum_equals_distance_across_grid() {
    let planner = TrajectoryPlanner::default();
    for distance in 1..=300 {
        for quantum in QUANTA {
            for overflow in [0, 5, 20] {
                let seq = planner.plan(distance, quantum, overflow).unwrap();
                assert_eq!(
                    seq.total(),
                    i64::from(distance),
                    "distance={distance} quantum={quantum} overflow={overflow}"
                );
            }
        }
    }
}

#[test]
fn forward_phase_without_overflow_rises_then_falls() {
    let planner = TrajectoryPlanner::default();
    for distance in 1..=300 {
        for quantum in QUANTA {
            let seq = planner.plan(distance, quantum, 0).unwrap();
            let forward = &seq.steps()[..seq.len() - 1];
            assert!(forward.iter().all(|&s| s >= 0), "distance={distance}");

            let peak = forward
                .iter()
                .enumerate()
                .max_by_key(|&(i, &s)| (s, std::cmp::Reverse(i)))
                .map(|(i, _)| i)
                .unwrap();
            assert!(forward[..=peak].windows(2).all(|w| w[0] <= w[1]));
            assert!(forward[peak..].windows(2).all(|w| w[0] >= w[1]));
        }
    }
}

#[test]
fn overflow_adds_a_correction_phase() {
    let planner = TrajectoryPlanner::default();
    let seq = planner.plan(100, 0.2, 20).unwrap();
    let negatives = seq.steps().iter().filter(|&&s| s < 0).count();
    assert!(negatives >= 4);
    let plain = planner.plan(100, 0.2, 0).unwrap();
    assert!(plain.len() < seq.len());
}

#[test]
fn invalid_arguments_are_rejected() {
    let planner = TrajectoryPlanner::default();
    assert_eq!(
        planner.plan(0, 0.2, 0).unwrap_err(),
        SlideError::InvalidInput("distance must be positive")
    );
    assert_eq!(
        planner.plan(10, 0.0, 0).unwrap_err(),
        SlideError::InvalidInput("time quantum must be positive")
    );
    assert_eq!(
        planner.plan(10, f64::NAN, 0).unwrap_err(),
        SlideError::InvalidInput("time quantum must be positive")
    );
    assert_eq!(
        planner.plan(10, 0.2, -1).unwrap_err(),
        SlideError::InvalidInput("overflow must be non-negative")
    );
}

#[test]
fn step_cap_bounds_tiny_quanta() {
    let planner = TrajectoryPlanner::new(PlanConfig {
        max_steps: 50,
        ..PlanConfig::default()
    });
    assert_eq!(
        planner.plan(1000, 0.01, 0).unwrap_err(),
        SlideError::TrajectoryTooLong { max_steps: 50 }
    );
}
