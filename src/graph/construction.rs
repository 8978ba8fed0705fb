use indexmap::IndexMap;
use log::debug;

use crate::backend::{ParsedGraph, TextFormatParser};
use crate::error::{GraphError, Result};
use crate::graph::model::{InternalGraph, RawGraph};

/// Loader for the reference JSON interchange format. This is the in-tree
/// implementor of the text-parser boundary; GML, DFS, and SMILES grammars
/// live in external collaborators behind the same trait.
#[derive(Debug, Default)]
pub struct GraphLoader;

impl GraphLoader {
    pub fn from_json_str(json: &str) -> Result<ParsedGraph> {
        let raw: RawGraph = serde_json::from_str(json)
            .map_err(|err| GraphError::input(format!("invalid graph JSON: {err}")))?;
        Self::from_raw_graph(raw)
    }

    pub fn from_raw_graph(raw: RawGraph) -> Result<ParsedGraph> {
        let mut builder = InternalGraph::builder();
        let mut external_ids = Vec::with_capacity(raw.vertices.len());
        // None marks an id the source used more than once.
        let mut lookup: IndexMap<i64, Option<usize>> = IndexMap::new();

        for vertex in &raw.vertices {
            let index = builder.add_vertex(vertex.label.clone());
            external_ids.push((vertex.id, index));
            match lookup.entry(vertex.id) {
                indexmap::map::Entry::Occupied(mut slot) => {
                    debug!("duplicate external id {} in source", vertex.id);
                    slot.insert(None);
                }
                indexmap::map::Entry::Vacant(slot) => {
                    slot.insert(Some(index));
                }
            }
        }

        for edge in &raw.edges {
            let source = resolve_endpoint(&lookup, edge.source)?;
            let target = resolve_endpoint(&lookup, edge.target)?;
            builder.add_edge(source, target, edge.label.clone())?;
        }

        let graph = builder.build();
        debug!(
            "loaded graph with {} vertices, {} edges",
            graph.vertex_count(),
            graph.edge_count()
        );
        Ok(ParsedGraph {
            graph,
            external_ids,
        })
    }
}

impl TextFormatParser for GraphLoader {
    fn parse(&self, text: &str) -> Result<ParsedGraph> {
        Self::from_json_str(text)
    }
}

fn resolve_endpoint(lookup: &IndexMap<i64, Option<usize>>, id: i64) -> Result<usize> {
    match lookup.get(&id) {
        Some(Some(index)) => Ok(*index),
        Some(None) => Err(GraphError::input(format!(
            "edge endpoint id {id} is ambiguous (declared more than once)"
        ))),
        None => Err(GraphError::input(format!("unknown edge endpoint id {id}"))),
    }
}
