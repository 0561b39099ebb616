use pc_core::ProbeId;
use pc_history::{GRAPH_HISTORY_SIZE, GraphHistory};
use proptest::prelude::*;

/// Count after `n` inserts, following the halving rule step by step.
fn expected_len(n: usize) -> usize {
    let mut count = 0;
    for _ in 0..n {
        if count >= GRAPH_HISTORY_SIZE {
            count = count.div_ceil(2);
        }
        count += 1;
    }
    count
}

#[test]
fn two_hundred_forty_one_inserts_leave_one_hundred_twenty_one() {
    let mut h = GraphHistory::new();
    for i in 0..241 {
        h.add_point(i as f64, 0.0, 0.0, 225.0, false, true, true);
    }
    assert_eq!(h.len(), 121);
}

#[test]
fn condensation_merges_validity_per_channel() {
    let mut h = GraphHistory::new();
    // slot pairs exercising every merge combination on each channel
    for pair in 0..GRAPH_HISTORY_SIZE / 2 {
        match pair % 3 {
            0 => {
                h.add_point(100.0, 100.0, 100.0, 225.0, false, false, true);
                h.add_point(200.0, 55.0, 77.0, 225.0, false, true, true);
            }
            1 => {
                h.add_point(0.0, 0.0, 0.0, 200.0, true, true, true);
                h.add_point(120.0, 0.0, 0.0, 250.0, false, true, true);
            }
            _ => {
                h.add_point(0.0, 0.0, 0.0, 225.0, true, true, true);
                h.add_point(0.0, 0.0, 0.0, 225.0, true, true, true);
            }
        }
    }
    assert!(h.is_full());
    h.add_point(225.0, 150.0, 140.0, 225.0, false, false, false);
    assert_eq!(h.len(), 121);

    // valid 100 + valid 200 => 150; valid 100 + invalid => 100; invalid + invalid => invalid
    let s = h.slot(0);
    assert_eq!(s.value(ProbeId::Pit), Some(150.0));
    assert_eq!(s.value(ProbeId::Meat1), Some(100.0));
    assert_eq!(s.value(ProbeId::Meat2), None);
    assert_eq!(s.setpoint, 225.0);

    // invalid + valid 120 => 120, setpoint averaged
    let s = h.slot(1);
    assert_eq!(s.value(ProbeId::Pit), Some(120.0));
    assert_eq!(s.setpoint, 225.0);

    let s = h.slot(2);
    assert_eq!(s.values(), [None, None, None]);

    assert_eq!(h.slot(120).values(), [Some(225.0), Some(150.0), Some(140.0)]);
}

#[test]
fn repeated_condensation_keeps_newest_point_last() {
    let mut h = GraphHistory::new();
    for i in 0..2000 {
        h.add_point(i as f64, 0.0, 0.0, 225.0, false, true, true);
        assert_eq!(h.latest().map(|s| s.pit), Some(i as f64));
    }
    assert_eq!(h.len(), expected_len(2000));
}

proptest! {
    #[test]
    fn count_never_exceeds_capacity(n in 0usize..3000) {
        let mut h = GraphHistory::new();
        for i in 0..n {
            h.add_point(i as f64, 0.0, 0.0, 225.0, i % 2 == 0, i % 3 == 0, true);
            prop_assert!(h.len() <= GRAPH_HISTORY_SIZE);
        }
        prop_assert_eq!(h.len(), expected_len(n));
    }

    #[test]
    fn chronology_is_preserved(n in 1usize..1500) {
        let mut h = GraphHistory::new();
        for i in 0..n {
            h.add_point(i as f64, 0.0, 0.0, 225.0, false, true, true);
        }
        let pits: Vec<f64> = h.iter().map(|s| s.pit).collect();
        prop_assert!(pits.windows(2).all(|w| w[0] < w[1]));
    }
}
