//! Graph input schema and layout snapshot output.
//!
//! The input schema is the one the viewer has always accepted:
//!
//! ```json
//! {
//!   "directed": true,
//!   "nodes": { "a": { "location": [0, 0, 0], "size": 2, "color": "0xff0000" }, "b": {} },
//!   "edges": [ { "source": "a", "target": "b", "size": 0.5 } ]
//! }
//! ```
//!
//! A bare adjacency list (`[["a", "b"], ["b", "c"]]`) is accepted as well, in
//! which case the node set is every id mentioned by an edge. Ids may be
//! strings or integers; integers are converted to their decimal form.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::vec3::Vec3;
use crate::error::Result;

fn default_directed() -> bool {
    true
}

/// Full graph description: nodes keyed by id, ordered edges, direction flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    #[serde(default)]
    pub nodes: IndexMap<String, NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    #[serde(default = "default_directed")]
    pub directed: bool,
}

impl Default for GraphDescription {
    fn default() -> Self {
        Self {
            nodes: IndexMap::new(),
            edges: Vec::new(),
            directed: true,
        }
    }
}

/// Per-node input attributes. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Per-edge input attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    #[serde(deserialize_with = "deserialize_node_key")]
    pub source: String,
    #[serde(deserialize_with = "deserialize_node_key")]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl EdgeSpec {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            size: None,
            color: None,
            attributes: Map::new(),
        }
    }
}

/// A node id as it may appear in JSON or a JS object.
#[derive(Deserialize)]
#[serde(untagged)]
enum NodeKey {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl NodeKey {
    fn into_string(self) -> String {
        match self {
            NodeKey::Text(s) => s,
            NodeKey::Integer(i) => i.to_string(),
            // JS hands every number over as f64
            NodeKey::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => (f as i64).to_string(),
            NodeKey::Float(f) => f.to_string(),
        }
    }
}

fn deserialize_node_key<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    NodeKey::deserialize(deserializer).map(NodeKey::into_string)
}

#[derive(Deserialize)]
struct EdgePair(
    #[serde(deserialize_with = "deserialize_node_key")] String,
    #[serde(deserialize_with = "deserialize_node_key")] String,
);

impl GraphDescription {
    /// Parse either the full schema or a bare `[[source, target], ...]` list.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Same as [`GraphDescription::from_json`] for an already parsed value.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.is_array() {
            let pairs: Vec<EdgePair> = serde_json::from_value(value)?;
            Ok(Self::from_edge_pairs(
                pairs.into_iter().map(|EdgePair(s, t)| (s, t)),
            ))
        } else {
            Ok(serde_json::from_value(value)?)
        }
    }

    /// Build a directed graph from an adjacency list. Nodes are implied by the
    /// edge endpoints, in order of first appearance.
    pub fn from_edge_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut description = Self::default();
        for (source, target) in pairs {
            let (source, target) = (source.into(), target.into());
            description.nodes.entry(source.clone()).or_default();
            description.nodes.entry(target.clone()).or_default();
            description.edges.push(EdgeSpec::new(source, target));
        }
        description
    }
}

/// Node entry in a [`LayoutSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Coordinates rounded to three decimals.
    pub location: [f64; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Laid-out graph in the same shape as the input schema, with every node's
/// `location` filled in. Feeding a snapshot back to `load` reproduces the
/// layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSnapshot {
    pub directed: bool,
    pub edges: Vec<EdgeSpec>,
    pub nodes: BTreeMap<String, NodeSnapshot>,
}

/// Round a coordinate to three decimals for output.
pub fn round_coordinate(value: f32) -> f64 {
    (f64::from(value) * 1000.0).round() / 1000.0
}

impl LayoutSnapshot {
    /// Indented JSON with sorted keys.
    pub fn to_json_pretty(&self) -> Result<String> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Whitespace-free JSON with sorted keys.
    pub fn to_json_compact(&self) -> Result<String> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string(&value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_schema() {
        let text = r#"{
            "nodes": {
                "a": { "location": [1, 2, 3], "size": 2.0, "color": "0xFF0000", "label": "A" },
                "b": {}
            },
            "edges": [ { "source": "a", "target": "b", "size": 0.5, "arrowSize": 3 } ]
        }"#;
        let graph = GraphDescription::from_json(text).unwrap();

        assert!(graph.directed);
        assert_eq!(graph.nodes.len(), 2);
        let a = &graph.nodes["a"];
        assert_eq!(a.location, Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(a.size, Some(2.0));
        assert_eq!(a.color.as_deref(), Some("0xFF0000"));
        assert_eq!(a.attributes["label"], Value::from("A"));

        let edge = &graph.edges[0];
        assert_eq!(edge.size, Some(0.5));
        assert_eq!(edge.attributes["arrowSize"], Value::from(3));
    }

    #[test]
    fn test_numeric_ids_are_stringified() {
        let text = r#"{ "nodes": { "1": {}, "2": {} }, "edges": [ { "source": 1, "target": 2 } ] }"#;
        let graph = GraphDescription::from_json(text).unwrap();
        assert_eq!(graph.edges[0].source, "1");
        assert_eq!(graph.edges[0].target, "2");
    }

    #[test]
    fn test_parse_edge_pairs() {
        let graph = GraphDescription::from_json(r#"[[1, 2], [2, "c"], [1, "c"]]"#).unwrap();
        let keys: Vec<_> = graph.nodes.keys().cloned().collect();
        assert_eq!(keys, vec!["1", "2", "c"]);
        assert_eq!(graph.edges.len(), 3);
        assert!(graph.directed);
    }

    #[test]
    fn test_undirected_flag() {
        let graph = GraphDescription::from_json(r#"{ "directed": false }"#).unwrap();
        assert!(!graph.directed);
        assert!(graph.nodes.is_empty());
    }

    #[test]
    fn test_malformed_json() {
        assert!(GraphDescription::from_json("{ nodes").is_err());
        assert!(GraphDescription::from_json(r#"{ "edges": [ { "source": "a" } ] }"#).is_err());
    }

    #[test]
    fn test_round_coordinate() {
        assert_eq!(round_coordinate(1.23456), 1.235);
        assert_eq!(round_coordinate(-0.0004), -0.0);
        assert_eq!(round_coordinate(10.0), 10.0);
    }

    #[test]
    fn test_snapshot_json_sorted_and_rounded() {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "b".to_string(),
            NodeSnapshot {
                color: Some("0x00ff00".to_string()),
                location: [round_coordinate(1.23456), 0.0, 0.0],
                size: None,
                attributes: Map::new(),
            },
        );
        let snapshot = LayoutSnapshot {
            directed: true,
            edges: vec![EdgeSpec::new("b", "b")],
            nodes,
        };

        let json = snapshot.to_json_compact().unwrap();
        assert_eq!(
            json,
            r#"{"directed":true,"edges":[{"source":"b","target":"b"}],"nodes":{"b":{"color":"0x00ff00","location":[1.235,0.0,0.0]}}}"#
        );
    }
}
