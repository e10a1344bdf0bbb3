use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use whiteboard_core::*;

fn counter(store: &WhiteboardStore) -> (Arc<AtomicUsize>, Subscription) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    let sub = store.subscribe(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    (count, sub)
}

// ------------------------------------------------------------------
// Scenarios
// ------------------------------------------------------------------

#[test]
fn test_create_sticky_on_default_document() {
    let mut store = WhiteboardStore::new();
    assert!(store.get_element(WELCOME_NOTE_ID).is_some());

    let note = store.create_sticky_note(100.0, 100.0, "Hello", StickyColor::Yellow);
    assert_eq!(note.kind(), Some(ElementKind::Sticky));
    assert_ne!(note.id(), WELCOME_NOTE_ID);
    assert!(!note.id().is_empty());
    assert_eq!(store.get_stats().sticky_notes, 2);
}

#[test]
fn test_removed_target_stays_in_connections() {
    let mut store = WhiteboardStore::new();
    let a1 = store.create_flow_node(0.0, 0.0, "A1", FlowShape::Rectangle);
    let b1 = store.create_flow_node(300.0, 0.0, "B1", FlowShape::Rectangle);

    assert!(store.connect(a1.id(), b1.id()));
    assert_eq!(store.get_stats().connections, 1);

    assert!(store.remove_element(b1.id()));
    let a1_now = store.get_element(a1.id()).unwrap();
    assert!(a1_now.as_flow_node().unwrap().is_connected_to(b1.id()));
    assert_eq!(store.get_stats().connections, 1);
    assert_eq!(store.get_data().dangling_edges().len(), 1);
}

#[test]
fn test_search_finds_case_insensitive_match() {
    let mut store = WhiteboardStore::new();
    store.create_sticky_note(0.0, 0.0, "Hello world", StickyColor::Blue);
    let hits = store.search_elements("hello");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].searchable_text(), Some("Hello world"));
}

// ------------------------------------------------------------------
// Properties
// ------------------------------------------------------------------

#[test]
fn test_ids_unique_across_mixed_inserts() {
    let mut store = WhiteboardStore::new();
    for i in 0..50 {
        let x = i as f64;
        store.create_sticky_note(x, 0.0, "s", StickyColor::Pink);
        store.create_flow_node(x, 0.0, "f", FlowShape::Ellipse);
        store.create_mermaid_diagram(x, 0.0, "graph TD");
        store.create_embedded_link(x, 0.0, "https://example.com", EmbedType::Video);
    }
    let data = store.get_data();
    let ids: HashSet<&str> = data.elements.iter().map(Element::id).collect();
    assert_eq!(ids.len(), 201);
}

#[test]
fn test_update_cannot_change_id() {
    let mut store = WhiteboardStore::new();
    let patch = json!({ "id": "other", "text": "still me" });
    let updated = store
        .update_element(WELCOME_NOTE_ID, patch.as_object().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(updated.id(), WELCOME_NOTE_ID);
    assert!(store.get_element("other").is_none());
}

#[test]
fn test_snapshots_are_isolated() {
    let mut store = WhiteboardStore::new();
    let mut snapshot = store.get_data();
    if let Element::Sticky(note) = &mut snapshot.elements[0] {
        note.text = "mutated outside".into();
    }
    store.create_flow_node(0.0, 0.0, "after", FlowShape::Circle);

    let fresh = store.get_element(WELCOME_NOTE_ID).unwrap();
    assert_eq!(fresh.searchable_text(), Some(WELCOME_NOTE_TEXT));
    assert_eq!(snapshot.len(), 1);
}

#[test]
fn test_notification_count_matches_successful_mutations() {
    let mut store = WhiteboardStore::new();
    let (count, _sub) = counter(&store);

    let a = store.create_flow_node(0.0, 0.0, "a", FlowShape::Rectangle);
    let b = store.create_flow_node(0.0, 0.0, "b", FlowShape::Rectangle);
    store.connect(a.id(), b.id());
    store.move_element(a.id(), 5.0, 5.0);
    store.disconnect(a.id(), b.id());
    store.remove_element(b.id());
    assert_eq!(count.load(Ordering::SeqCst), 6);

    // No-ops and failures.
    store.connect(a.id(), "ghost");
    store.connect(WELCOME_NOTE_ID, a.id());
    store.disconnect(a.id(), b.id());
    store.remove_element("ghost");
    store.move_element("ghost", 0.0, 0.0);
    let _ = store.update_element("ghost", json!({}).as_object().unwrap());
    let _ = store.set_data_json(json!({ "elements": 3 }));
    assert_eq!(count.load(Ordering::SeqCst), 6);
}

#[test]
fn test_every_subscriber_sees_same_snapshot() {
    let mut store = WhiteboardStore::new();
    let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let mut subs = Vec::new();
    for _ in 0..3 {
        let seen = Arc::clone(&seen);
        subs.push(store.subscribe(move |data| {
            seen.lock().unwrap().push(data.len());
            Ok(())
        }));
    }
    store.create_sticky_note(0.0, 0.0, "x", StickyColor::Green);
    assert_eq!(*seen.lock().unwrap(), vec![2, 2, 2]);
}

// ------------------------------------------------------------------
// Observer isolation
// ------------------------------------------------------------------

#[test]
fn test_failing_observers_do_not_block_others() {
    let mut store = WhiteboardStore::new();
    let _bad = store.subscribe(|_| anyhow::bail!("viewer went away"));
    let _panics = store.subscribe(|_| panic!("observer bug"));
    let (count, _sub) = counter(&store);

    let note = store.create_sticky_note(0.0, 0.0, "ok", StickyColor::Yellow);
    assert!(store.get_element(note.id()).is_some());
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unsubscribe_during_broadcast() {
    let mut store = WhiteboardStore::new();
    let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
    let (first, _first_sub) = counter(&store);

    let s = Arc::clone(&slot);
    let _remover = store.subscribe(move |_| {
        if let Some(sub) = s.lock().unwrap().as_ref() {
            sub.unsubscribe();
        }
        Ok(())
    });
    let (victim, victim_sub) = counter(&store);
    *slot.lock().unwrap() = Some(victim_sub);
    let (last, _last_sub) = counter(&store);

    store.clear_all();
    store.clear_all();

    assert_eq!(first.load(Ordering::SeqCst), 2);
    assert_eq!(victim.load(Ordering::SeqCst), 0);
    assert_eq!(last.load(Ordering::SeqCst), 2);
}

// ------------------------------------------------------------------
// Document shape
// ------------------------------------------------------------------

#[test]
fn test_unknown_fields_round_trip_through_store() {
    let mut store = WhiteboardStore::new();
    store
        .set_data_json(json!({
            "elements": [{
                "id": "n1", "type": "sticky", "x": 0, "y": 0,
                "text": "hi", "color": "blue", "zIndex": 7
            }]
        }))
        .unwrap();
    let out = serde_json::to_value(store.get_data()).unwrap();
    assert_eq!(out["elements"][0]["zIndex"], json!(7));
}

#[test]
fn test_non_array_elements_is_structural_error() {
    let mut store = WhiteboardStore::new();
    let err = store
        .set_data_json(json!({ "elements": { "a": 1 } }))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidInput);
    assert!(matches!(err, WhiteboardError::Structural(_)));
    assert!(store.get_element(WELCOME_NOTE_ID).is_some());
}

#[test]
fn test_cascade_from_config() {
    let config = WhiteboardConfig {
        cascade_edges_on_remove: true,
        ..Default::default()
    };
    let mut store = WhiteboardStore::with_config(&config);
    let (count, _sub) = counter(&store);
    let a = store.create_flow_node(0.0, 0.0, "a", FlowShape::Rectangle);
    let b = store.create_flow_node(0.0, 0.0, "b", FlowShape::Rectangle);
    store.connect(a.id(), b.id());
    store.remove_element(b.id());

    assert_eq!(store.get_stats().connections, 0);
    assert_eq!(count.load(Ordering::SeqCst), 4);
}
