//! Observer sequence and arc-created accounting.
//!
//! Observers see exactly what happened, in order: every stored node, one
//! ranges refresh per guess, one event per newly-created arc (refreshes are
//! silent), and the final prediction. Failures are emitted and returned.

use parking_lot::Mutex;

use knearest_rs::{
    features, FeatureMap, Machine, MachineConfig, MachineEvent, MemoryArcCache, MemoryNodeStore,
    PropertyDef,
};

const HOUSING: [(f64, f64, f64); 23] = [
    (1.0, 350.0, 1.0),
    (2.0, 300.0, 1.0),
    (3.0, 300.0, 1.0),
    (4.0, 250.0, 1.0),
    (4.0, 500.0, 1.0),
    (4.0, 400.0, 1.0),
    (5.0, 450.0, 1.0),
    (7.0, 850.0, 2.0),
    (7.0, 900.0, 2.0),
    (7.0, 1200.0, 2.0),
    (8.0, 1500.0, 2.0),
    (9.0, 1300.0, 2.0),
    (8.0, 1240.0, 2.0),
    (10.0, 1700.0, 2.0),
    (9.0, 1000.0, 2.0),
    (1.0, 800.0, 3.0),
    (3.0, 900.0, 3.0),
    (2.0, 700.0, 3.0),
    (1.0, 900.0, 3.0),
    (2.0, 1150.0, 3.0),
    (1.0, 1000.0, 3.0),
    (2.0, 1200.0, 3.0),
    (1.0, 1300.0, 3.0),
];

fn housing_nodes() -> Vec<FeatureMap> {
    HOUSING
        .iter()
        .map(|&(rooms, area, kind)| features([("rooms", rooms), ("area", area), ("type", kind)]))
        .collect()
}

fn housing_machine() -> Machine<MemoryNodeStore, MemoryArcCache> {
    let config = MachineConfig::new(vec![
        PropertyDef::number("rooms"),
        PropertyDef::number("area"),
        PropertyDef::number("type"),
    ])
    .with_k(3);
    Machine::open_memory(config).unwrap()
}

fn record(machine: &mut Machine<MemoryNodeStore, MemoryArcCache>) -> std::sync::Arc<Mutex<Vec<MachineEvent>>> {
    let log = std::sync::Arc::new(Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&log);
    machine.subscribe(Box::new(move |event: &MachineEvent| sink.lock().push(event.clone())));
    log
}

// ============================================================================
// 1. Loading emits one NodeAdded per seed
// ============================================================================

#[tokio::test]
async fn test_load_emits_node_added_per_seed() {
    let mut machine = housing_machine();
    let log = record(&mut machine);

    machine.load_nodes(housing_nodes()).await.unwrap();

    let events = log.lock();
    assert_eq!(events.len(), 23);
    assert!(events.iter().all(|e| matches!(e, MachineEvent::NodeAdded { .. })));
}

// ============================================================================
// 2. First guess: node, ranges, 276 created arcs, prediction, in that order
// ============================================================================

#[tokio::test]
async fn test_first_guess_event_accounting() {
    let mut machine = housing_machine();
    machine.load_nodes(housing_nodes()).await.unwrap();

    let log = record(&mut machine);
    machine.guess("type", features([("rooms", 12.0), ("area", 1375.0)])).await.unwrap();

    let events = log.lock();
    // 1 NodeAdded + 1 RangesUpdated + C(24, 2) ArcComputed + 1 PredictionReady.
    assert_eq!(events.len(), 279);
    assert!(matches!(events[0], MachineEvent::NodeAdded { .. }));
    assert!(matches!(events[1], MachineEvent::RangesUpdated { .. }));
    assert!(events[2..278].iter().all(|e| matches!(e, MachineEvent::ArcComputed { .. })));
    assert!(matches!(events[278], MachineEvent::PredictionReady(_)));

    let MachineEvent::RangesUpdated { stats } = &events[1] else {
        panic!("expected a ranges event");
    };
    let (_, rooms) = stats.iter().find(|(name, _)| name == "rooms").unwrap();
    assert_eq!((rooms.min, rooms.max, rooms.range), (1.0, 12.0, 11.0));
}

// ============================================================================
// 3. Second guess only announces the new pairs
// ============================================================================

#[tokio::test]
async fn test_second_guess_announces_only_new_pairs() {
    let mut machine = housing_machine();
    machine.load_nodes(housing_nodes()).await.unwrap();
    machine.guess("type", features([("rooms", 12.0), ("area", 1375.0)])).await.unwrap();

    let log = record(&mut machine);
    machine.guess("type", features([("rooms", 12.0), ("area", 1375.0)])).await.unwrap();

    let created = log
        .lock()
        .iter()
        .filter(|e| matches!(e, MachineEvent::ArcComputed { .. }))
        .count();
    assert_eq!(created, 24);
}

// ============================================================================
// 4. Failures are emitted and returned
// ============================================================================

#[tokio::test]
async fn test_failures_emit_error_event() {
    let mut machine = housing_machine();
    machine.load_nodes(housing_nodes()).await.unwrap();

    let log = record(&mut machine);
    machine.guess("floors", features([("rooms", 5.0)])).await.unwrap_err();

    let events = log.lock();
    assert_eq!(events.len(), 1);
    let MachineEvent::Error { message } = &events[0] else {
        panic!("expected an error event");
    };
    assert!(message.contains("floors"));
}
