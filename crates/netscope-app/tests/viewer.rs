use netscope_app::{ViewerController, ViewerSettings};
use netscope_core::{EmptyGraphWarning, LayoutDirection, NodeId, WeightInfo};
use netscope_events::Event;
use netscope_graph::ViewportSpec;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const LENET: &str = r#"{
    "nodes": [
        {"id": "conv1", "label": "conv1", "type": "Conv",
         "data": {"input": ["input", "conv1.weight"], "output": ["c1"], "attributes": {"kernel_shape": [5, 5]}}},
        {"id": "relu1", "type": "Relu", "data": {"input": ["c1"], "output": ["r1"]}},
        {"id": "pool1", "type": "MaxPool", "data": {"input": ["r1"], "output": ["p1"]}},
        {"id": "flatten", "type": "Flatten", "data": {"input": ["p1"], "output": ["f"]}},
        {"id": "fc", "type": "Gemm", "data": {"input": ["f", "fc.weight"], "output": ["out"]}}
    ],
    "edges": [
        {"source": "conv1", "target": "relu1", "data": {"tensor_name": "c1"}},
        {"source": "relu1", "target": "pool1", "data": {"tensor_name": "r1"}},
        {"source": "pool1", "target": "flatten", "data": {"tensor_name": "p1"}},
        {"source": "flatten", "target": "fc", "data": {"tensor_name": "f"}}
    ]
}"#;

fn drain(controller: &ViewerController) -> Vec<Event> {
    controller.event_bus().drain()
}

#[test]
fn test_failed_load_keeps_previous_snapshot() {
    let controller = ViewerController::default();
    let good = controller.load_json(LENET).unwrap();
    drain(&controller);

    let err = controller
        .load_json(r#"{"nodes": [{"id": "a", "type": "Add"}], "edges": [{"source": "a", "target": "ghost"}]}"#)
        .unwrap_err();
    assert!(err.to_string().starts_with("failed to load graph"));
    assert!(Arc::ptr_eq(&good, &controller.snapshot()));

    let events = drain(&controller);
    assert!(matches!(events.as_slice(), [Event::LoadFailed { .. }]));
}

#[test]
fn test_duplicate_ids_fail_the_load() {
    let controller = ViewerController::default();
    let err = controller
        .load_json(r#"{"nodes": [{"id": "a", "type": "Add"}, {"id": "a", "type": "Mul"}]}"#)
        .unwrap_err();
    assert!(err.to_string().contains("duplicate node id 'a'"));
    assert!(controller.snapshot().is_empty());
}

#[test]
fn test_empty_graph_is_a_warning() {
    let controller = ViewerController::default();
    let snapshot = controller.load_json(r#"{"nodes": [], "edges": []}"#).unwrap();

    assert_eq!(snapshot.warning, Some(EmptyGraphWarning));
    assert!(snapshot.legend.is_empty());
    assert_eq!(snapshot.viewport, ViewportSpec::IDENTITY);
    assert!(drain(&controller).contains(&Event::GraphEmpty));
}

#[test]
fn test_direction_round_trip_restores_layout() {
    let controller = ViewerController::default();
    let tb = controller.load_json(LENET).unwrap();
    assert_eq!(tb.direction, LayoutDirection::TopToBottom);

    let lr = controller.toggle_direction();
    assert_eq!(lr.direction, LayoutDirection::LeftToRight);
    let back = controller.toggle_direction();

    for ((a, b), c) in tb.nodes.iter().zip(&lr.nodes).zip(&back.nodes) {
        assert_eq!(
            (a.layout.rank, a.layout.order_in_rank),
            (b.layout.rank, b.layout.order_in_rank)
        );
        assert_eq!(a.layout, c.layout);
    }
    assert_ne!(tb.nodes[1].layout.y, lr.nodes[1].layout.y);
    assert_eq!(
        controller.settings().layout_direction,
        LayoutDirection::TopToBottom
    );

    let events = drain(&controller);
    let changes = events
        .iter()
        .filter(|e| matches!(e, Event::LayoutChanged { .. }))
        .count();
    assert_eq!(changes, 2);
}

#[test]
fn test_edge_labels_toggle_keeps_positions() {
    let controller = ViewerController::default();
    let before = controller.load_json(LENET).unwrap();
    assert_eq!(before.edges[0].label.as_deref(), Some("c1"));

    let after = controller.toggle_edge_labels();
    assert!(!after.show_edge_labels);
    assert!(after.edges.iter().all(|e| e.label.is_none()));
    assert_eq!(before.nodes, after.nodes);
}

#[test]
fn test_fit_view_animates_to_target() {
    let controller = ViewerController::default();
    let loaded = controller.load_json(LENET).unwrap();

    let animation = controller.fit_view();
    assert_eq!(animation.from, loaded.viewport);
    assert_eq!(animation.duration, Duration::from_millis(800));
    assert_eq!(animation.sample(animation.duration), controller.snapshot().viewport);
    assert!(animation.to.zoom >= 0.1 && animation.to.zoom <= 2.0);
}

#[test]
fn test_select_node_returns_details_with_weights() {
    let controller = ViewerController::default();
    controller.load_json(LENET).unwrap();

    let mut weights = BTreeMap::new();
    weights.insert(
        "conv1.weight".to_string(),
        WeightInfo {
            dims: vec![6, 1, 5, 5],
            data_type: 1,
            size: 150,
        },
    );
    controller.attach_weights(weights).unwrap();
    drain(&controller);

    let details = controller.select_node(&NodeId::from("conv1")).unwrap();
    assert_eq!(details.op_type, "Conv");
    assert_eq!(details.inputs, vec!["input", "conv1.weight"]);
    assert_eq!(details.weights["conv1.weight"].size, 150);
    assert_eq!(details.attributes["kernel_shape"], serde_json::json!([5, 5]));

    assert_eq!(controller.snapshot().selected, Some(NodeId::from("conv1")));
    assert_eq!(
        drain(&controller),
        vec![Event::NodeSelected {
            id: NodeId::from("conv1")
        }]
    );

    controller.clear_selection();
    assert!(controller.snapshot().selected.is_none());
}

#[test]
fn test_load_file_and_settings_direction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lenet.json");
    std::fs::write(&path, LENET).unwrap();

    let settings = ViewerSettings {
        layout_direction: LayoutDirection::LeftToRight,
        show_edge_labels: false,
        ..ViewerSettings::default()
    };
    let controller = ViewerController::new(settings);
    let snapshot = controller.load_file(&path).unwrap();

    assert_eq!(snapshot.direction, LayoutDirection::LeftToRight);
    assert!(snapshot.edges.iter().all(|e| e.label.is_none()));

    let missing = controller.load_file(&dir.path().join("missing.json"));
    assert!(missing.is_err());
    assert_eq!(controller.snapshot().nodes.len(), 5);
}

#[test]
fn test_readers_only_see_whole_snapshots() {
    let controller = ViewerController::default();
    controller.load_json(LENET).unwrap();

    let reader = {
        let controller = controller.clone();
        std::thread::spawn(move || {
            for _ in 0..200 {
                let snapshot = controller.snapshot();
                let horizontal = snapshot.direction.is_horizontal();
                // In a single chain every node shares the secondary coordinate.
                let first = &snapshot.nodes[0].layout;
                for node in &snapshot.nodes {
                    if horizontal {
                        assert_eq!(node.layout.y, first.y);
                    } else {
                        assert_eq!(node.layout.x, first.x);
                    }
                }
            }
        })
    };

    for _ in 0..20 {
        controller.toggle_direction();
    }
    reader.join().unwrap();
}

#[test]
fn test_inverted_fit_limits_do_not_abort_load() {
    let mut settings = ViewerSettings::default();
    settings.initial_fit.min_zoom = 2.0;
    settings.initial_fit.max_zoom = 1.0;
    let controller = ViewerController::new(settings);

    let snapshot = controller
        .load_json(
            r#"{"nodes": [{"id": "a", "type": "Conv"}, {"id": "b", "type": "Relu"}],
                "edges": [{"source": "a", "target": "b"}]}"#,
        )
        .unwrap();
    assert!((1.0..=2.0).contains(&snapshot.viewport.zoom));

    let mut inverted = controller.settings().toolbar_fit;
    inverted.min_zoom = 3.0;
    inverted.max_zoom = 0.5;
    let animation = controller.fit_with(&inverted);
    assert!((0.5..=3.0).contains(&animation.to.zoom));
}

#[test]
fn test_concurrent_toggles_all_apply() {
    let controller = ViewerController::default();
    controller.load_json(LENET).unwrap();
    drain(&controller);

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let controller = controller.clone();
            std::thread::spawn(move || {
                for _ in 0..5 {
                    controller.toggle_direction();
                    controller.toggle_edge_labels();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    // Twenty toggles of each setting land back where they started.
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.direction, LayoutDirection::TopToBottom);
    assert!(snapshot.show_edge_labels);
    assert_eq!(
        controller.settings().layout_direction,
        LayoutDirection::TopToBottom
    );

    let events = drain(&controller);
    let changes = events
        .iter()
        .filter(|e| matches!(e, Event::LayoutChanged { .. }))
        .count();
    assert_eq!(changes, 20);
}
