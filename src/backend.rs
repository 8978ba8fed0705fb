use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

use crate::error::{GraphError, Result};
use crate::graph::model::InternalGraph;

/// Output of a text-format parser: the structural store plus the external-id
/// pairs the source assigned, in source order (duplicates included).
#[derive(Debug)]
pub struct ParsedGraph {
    pub graph: InternalGraph,
    pub external_ids: Vec<(i64, usize)>,
}

/// Boundary to an external text grammar. Implementations turn source text
/// into an internal representation or fail with `GraphError::Input` carrying
/// the parser diagnostic and position.
pub trait TextFormatParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<ParsedGraph>;
}

/// Boundary to the canonical-encoding algorithms.
pub trait Encoder: Send + Sync {
    /// Canonical linear encoding of a molecule graph.
    fn molecule_encoding(&self, graph: &InternalGraph) -> Result<String>;
    /// Canonical linear encoding of an arbitrary labeled graph.
    fn graph_encoding(&self, graph: &InternalGraph) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoleculeProperties {
    pub energy: f64,
    pub molar_mass: f64,
}

/// Boundary to the chemistry-property computation. May fail when the graph is
/// unprocessable for the backend.
pub trait ChemistryBackend: Send + Sync {
    fn properties(&self, graph: &InternalGraph) -> Result<MoleculeProperties>;
}

/// Boundary to coordinate generation for depictions and coordinate-bearing
/// serialization. `None` means no strategy produced a layout.
pub trait LayoutProvider: Send + Sync {
    fn layout(&self, graph: &InternalGraph) -> Option<Vec<(f64, f64)>>;
}

/// Collaborator set consulted by the derived-property cells of an instance.
#[derive(Clone)]
pub struct Backends {
    pub encoder: Arc<dyn Encoder>,
    pub chemistry: Arc<dyn ChemistryBackend>,
    pub layout: Arc<dyn LayoutProvider>,
}

impl Backends {
    pub fn baseline() -> Self {
        Self {
            encoder: Arc::new(MultisetEncoder),
            chemistry: Arc::new(BondTableChemistry),
            layout: Arc::new(CircularLayout),
        }
    }
}

impl Default for Backends {
    fn default() -> Self {
        Self::baseline()
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}

/// Baseline encoder producing a deterministic, relabeling-invariant string
/// from the vertex-label and edge-label multisets. A stand-in at the encoding
/// seam; real canonical SMILES/DFS generators plug in through [`Encoder`].
pub struct MultisetEncoder;

impl MultisetEncoder {
    fn encode(&self, graph: &InternalGraph) -> String {
        let mut vertex_parts: Vec<String> = graph
            .vertex_label_histogram()
            .into_iter()
            .map(|(label, count)| format!("{label}{count}"))
            .collect();
        vertex_parts.sort_unstable();

        let mut edge_parts: Vec<String> = graph
            .edge_triples()
            .map(|(a, b, label)| {
                let left = graph.vertex_label(a).unwrap_or_default();
                let right = graph.vertex_label(b).unwrap_or_default();
                let (left, right) = if left <= right {
                    (left, right)
                } else {
                    (right, left)
                };
                format!("{left}{label}{right}")
            })
            .collect();
        edge_parts.sort_unstable();

        format!("{}|{}", vertex_parts.join("."), edge_parts.join("."))
    }
}

impl Encoder for MultisetEncoder {
    fn molecule_encoding(&self, graph: &InternalGraph) -> Result<String> {
        Ok(self.encode(graph))
    }

    fn graph_encoding(&self, graph: &InternalGraph) -> Result<String> {
        Ok(self.encode(graph))
    }
}

/// Baseline chemistry backend: molar mass from a small element table, energy
/// from a per-bond contribution. Fails on labels outside the table.
pub struct BondTableChemistry;

const ATOMIC_MASSES: &[(&str, f64)] = &[
    ("H", 1.008),
    ("B", 10.81),
    ("C", 12.011),
    ("N", 14.007),
    ("O", 15.999),
    ("F", 18.998),
    ("Na", 22.990),
    ("Mg", 24.305),
    ("Si", 28.085),
    ("P", 30.974),
    ("S", 32.06),
    ("Cl", 35.45),
    ("K", 39.098),
    ("Ca", 40.078),
    ("Fe", 55.845),
    ("Br", 79.904),
    ("I", 126.904),
];

fn atomic_mass(label: &str) -> Option<f64> {
    ATOMIC_MASSES
        .iter()
        .find(|(symbol, _)| *symbol == label)
        .map(|(_, mass)| *mass)
}

fn bond_energy(label: &str) -> Option<f64> {
    match label {
        "-" | "1" => Some(350.0),
        "=" | "2" => Some(620.0),
        "#" | "3" => Some(840.0),
        ":" => Some(500.0),
        _ => None,
    }
}

impl ChemistryBackend for BondTableChemistry {
    fn properties(&self, graph: &InternalGraph) -> Result<MoleculeProperties> {
        let mut molar_mass = 0.0;
        for index in 0..graph.vertex_count() {
            let label = graph.vertex_label(index).unwrap_or_default();
            molar_mass += atomic_mass(label).ok_or_else(|| {
                GraphError::logic(format!("unprocessable vertex label '{label}'"))
            })?;
        }

        let mut energy = 0.0;
        for (_, _, label) in graph.edge_triples() {
            energy -= bond_energy(label).ok_or_else(|| {
                GraphError::logic(format!("unprocessable edge label '{label}'"))
            })?;
        }

        Ok(MoleculeProperties { energy, molar_mass })
    }
}

/// Baseline layout: vertices on a unit circle in internal-index order. Always
/// succeeds for non-empty graphs.
pub struct CircularLayout;

impl LayoutProvider for CircularLayout {
    fn layout(&self, graph: &InternalGraph) -> Option<Vec<(f64, f64)>> {
        let count = graph.vertex_count();
        if count == 0 {
            return None;
        }
        let points = (0..count)
            .map(|index| {
                let angle = TAU * index as f64 / count as f64;
                (angle.cos(), angle.sin())
            })
            .collect();
        Some(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::InternalGraph;

    fn ethanol_fragment() -> InternalGraph {
        let mut builder = InternalGraph::builder();
        let c1 = builder.add_vertex("C");
        let c2 = builder.add_vertex("C");
        let o = builder.add_vertex("O");
        builder.add_edge(c1, c2, "-").unwrap();
        builder.add_edge(c2, o, "-").unwrap();
        builder.build()
    }

    #[test]
    fn encoder_is_relabeling_invariant() {
        let forward = ethanol_fragment();

        let mut builder = InternalGraph::builder();
        let o = builder.add_vertex("O");
        let c2 = builder.add_vertex("C");
        let c1 = builder.add_vertex("C");
        builder.add_edge(o, c2, "-").unwrap();
        builder.add_edge(c2, c1, "-").unwrap();
        let reversed = builder.build();

        let encoder = MultisetEncoder;
        assert_eq!(
            encoder.graph_encoding(&forward).unwrap(),
            encoder.graph_encoding(&reversed).unwrap()
        );
    }

    #[test]
    fn chemistry_sums_masses_and_bonds() {
        let graph = ethanol_fragment();
        let props = BondTableChemistry.properties(&graph).unwrap();
        assert!((props.molar_mass - (12.011 * 2.0 + 15.999)).abs() < 1e-9);
        assert!((props.energy - (-700.0)).abs() < 1e-9);
    }

    #[test]
    fn chemistry_rejects_unknown_labels() {
        let mut builder = InternalGraph::builder();
        builder.add_vertex("Xx");
        let err = BondTableChemistry.properties(&builder.build());
        assert!(err.is_err());
    }

    #[test]
    fn circular_layout_covers_all_vertices() {
        let graph = ethanol_fragment();
        let points = CircularLayout.layout(&graph).unwrap();
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn circular_layout_fails_on_empty_graph() {
        let graph = InternalGraph::builder().build();
        assert!(CircularLayout.layout(&graph).is_none());
    }
}
