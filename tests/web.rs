//! Browser tests for the JavaScript facade. Run with `wasm-pack test --headless --firefox`.

#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Reflect};
use lodestar_graph_wasm::LodestarGraphWasm;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const TRIANGLE: &str = r#"{
    "nodes": {
        "a": {"location": [0, 0, 0]},
        "b": {"location": [10, 0, 0]},
        "c": {"location": [0, 10, 0], "size": 2}
    },
    "edges": [
        {"source": "a", "target": "b"},
        {"source": "b", "target": "c"},
        {"source": "c", "target": "a"}
    ]
}"#;

fn options(pairs: &[(&str, JsValue)]) -> JsValue {
    let object = js_sys::Object::new();
    for (key, value) in pairs {
        Reflect::set(&object, &JsValue::from_str(key), value).unwrap();
    }
    object.into()
}

fn get(value: &JsValue, key: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

#[wasm_bindgen_test]
fn load_json_and_read_views() {
    let mut graph = LodestarGraphWasm::new();
    graph.load_json(TRIANGLE).unwrap();
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 3);
    assert_eq!(graph.node_ids(), vec!["a", "b", "c"]);

    assert_eq!(graph.get_positions_x_view().to_vec(), vec![0.0, 10.0, 0.0]);
    assert_eq!(graph.get_positions_y_view().to_vec(), vec![0.0, 0.0, 10.0]);
    assert_eq!(graph.get_positions_z_view().length(), 3);
    assert_eq!(graph.positions().len(), 9);
    assert_eq!(graph.get_bounds(), Some(vec![0.0, 0.0, 0.0, 10.0, 10.0, 0.0]));
}

#[wasm_bindgen_test]
fn load_edge_pairs_from_js_array() {
    let pairs = Array::new();
    pairs.push(&Array::of2(&JsValue::from(1), &JsValue::from(2)));
    pairs.push(&Array::of2(&JsValue::from(2), &JsValue::from_str("three")));

    let mut graph = LodestarGraphWasm::new();
    graph.load_edge_pairs(pairs.into()).unwrap();
    assert_eq!(graph.node_ids(), vec!["1", "2", "three"]);

    assert!(graph.load_edge_pairs(JsValue::from_str("nope")).is_err());
    assert_eq!(graph.node_count(), 3);
}

#[wasm_bindgen_test]
fn cooperative_run_through_ticks() {
    let mut graph = LodestarGraphWasm::new();
    graph.load_json(TRIANGLE).unwrap();
    graph
        .start_layout(options(&[("iterations", JsValue::from(50)), ("seed", JsValue::from(1))]))
        .unwrap();
    assert!(graph.is_running());
    assert_eq!(graph.progress(), Some(vec![0, 50]));

    // Second start is rejected, as is a reload
    assert!(graph.start_layout(JsValue::UNDEFINED).is_err());
    assert!(graph.load_json(TRIANGLE).is_err());

    let report = graph.tick(20).unwrap();
    assert_eq!(get(&report, "executed").as_f64(), Some(20.0));
    assert_eq!(get(&report, "finished").as_bool(), Some(false));

    let report = graph.tick(100).unwrap();
    assert_eq!(get(&report, "remaining").as_f64(), Some(0.0));
    assert_eq!(get(&report, "finished").as_bool(), Some(true));
    assert!(!graph.is_running());
    assert!(graph.positions().iter().all(|v| v.is_finite()));
}

#[wasm_bindgen_test]
fn invalid_options_are_reported() {
    let mut graph = LodestarGraphWasm::new();
    graph.load_json(TRIANGLE).unwrap();
    assert!(graph.start_layout(options(&[("iterations", JsValue::from(0))])).is_err());
    assert!(graph
        .start_layout(options(&[("forceStrength", JsValue::from(-1.0))]))
        .is_err());
    assert!(!graph.is_running());
}

#[wasm_bindgen_test]
fn cancel_then_random_layout() {
    let mut graph = LodestarGraphWasm::new();
    graph.load_json(TRIANGLE).unwrap();
    graph.start_layout(JsValue::UNDEFINED).unwrap();
    graph.tick(5).unwrap();
    assert_eq!(graph.cancel_layout(), 9_995);

    graph
        .random_layout(options(&[("separation", JsValue::from(4.0))]))
        .unwrap();
    let snapshot = graph.snapshot_json(false).unwrap();
    assert!(snapshot.contains("\"location\""));
}

#[wasm_bindgen_test]
fn picking_and_hover() {
    let mut graph = LodestarGraphWasm::new();
    graph.load_json(TRIANGLE).unwrap();

    assert_eq!(graph.nearest_node(9.0, 1.0, 0.0), Some("b".to_string()));
    assert_eq!(graph.nearest_node_within(50.0, 50.0, 50.0, 1.0), None);
    assert_eq!(
        graph.pick_ray(0.0, 10.0, 100.0, 0.0, 0.0, -1.0, None),
        Some("c".to_string())
    );

    let events = Array::from(&graph.hover(10.0, 0.0, 100.0, 0.0, 0.0, -1.0, None).unwrap());
    assert_eq!(events.length(), 1);
    assert_eq!(get(&events.get(0), "kind").as_string().as_deref(), Some("enter"));
    assert_eq!(get(&events.get(0), "node").as_string().as_deref(), Some("b"));

    let events = Array::from(&graph.hover(50.0, 50.0, 100.0, 0.0, 0.0, -1.0, None).unwrap());
    assert_eq!(events.length(), 1);
    assert_eq!(get(&events.get(0), "kind").as_string().as_deref(), Some("exit"));
}

#[wasm_bindgen_test]
fn edge_geometry_has_arrows_for_directed_graphs() {
    let mut graph = LodestarGraphWasm::new();
    graph.load_json(TRIANGLE).unwrap();
    let geometry = Array::from(&graph.edge_geometry().unwrap());
    assert_eq!(geometry.length(), 3);

    let first = geometry.get(0);
    assert_eq!(get(&first, "length").as_f64(), Some(10.0));
    assert!(get(&first, "arrow").is_object());
}
