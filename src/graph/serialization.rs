use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::error::{GraphError, Result};
use crate::graph::model::{InternalGraph, RawEdge, RawGraph, RawVertex};

/// Exports graphs back to the reference JSON format accepted by the loader.
pub struct GraphWriter;

impl GraphWriter {
    /// Build the interchange form. Vertex ids are internal indexes; when
    /// coordinates are supplied they are embedded as `x`/`y` attributes.
    pub fn to_raw_graph(graph: &InternalGraph, coords: Option<&[(f64, f64)]>) -> RawGraph {
        let mut vertices = Vec::with_capacity(graph.vertex_count());
        for index in 0..graph.vertex_count() {
            let mut attributes = IndexMap::new();
            if let Some(points) = coords {
                if let Some((x, y)) = points.get(index) {
                    insert_float(&mut attributes, "x", *x);
                    insert_float(&mut attributes, "y", *y);
                }
            }
            vertices.push(RawVertex {
                id: index as i64,
                label: graph.vertex_label(index).unwrap_or_default().to_string(),
                attributes,
            });
        }

        let edges = graph
            .edge_triples()
            .map(|(source, target, label)| RawEdge {
                source: source as i64,
                target: target as i64,
                label: label.to_string(),
            })
            .collect();

        RawGraph {
            vertices,
            edges,
            attributes: IndexMap::new(),
        }
    }

    pub fn to_json_string(graph: &InternalGraph, coords: Option<&[(f64, f64)]>) -> Result<String> {
        let raw = Self::to_raw_graph(graph, coords);
        serde_json::to_string_pretty(&raw)
            .map_err(|err| GraphError::logic(format!("serialize graph: {err}")))
    }
}

fn insert_float(attributes: &mut IndexMap<String, Value>, key: &str, value: f64) {
    if let Some(number) = Number::from_f64(value) {
        attributes.insert(key.to_string(), Value::Number(number));
    }
}
