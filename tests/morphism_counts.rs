use anyhow::Result;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use molgraph::graph::model::InternalGraph;
use molgraph::graph::{GraphHandle, GraphInstance, GraphLoader};
use molgraph::{count_isomorphisms, count_monomorphisms};

fn cycle_json(labels: &[&str], bond: &str) -> String {
    let vertices: Vec<String> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| format!(r#"{{"id": {i}, "label": "{label}"}}"#))
        .collect();
    let edges: Vec<String> = (0..labels.len())
        .map(|i| {
            format!(
                r#"{{"source": {i}, "target": {}, "label": "{bond}"}}"#,
                (i + 1) % labels.len()
            )
        })
        .collect();
    format!(
        r#"{{"vertices": [{}], "edges": [{}]}}"#,
        vertices.join(", "),
        edges.join(", ")
    )
}

fn carbon_cycle(n: usize) -> Result<GraphHandle> {
    let labels = vec!["C"; n];
    Ok(GraphInstance::from_text(
        &GraphLoader,
        &cycle_json(&labels, "1"),
    )?)
}

#[test]
fn labeled_square_has_eight_self_isomorphisms() -> Result<()> {
    let a = carbon_cycle(4)?;
    let b = carbon_cycle(4)?;
    assert!(a.is_molecule());
    assert_eq!(count_isomorphisms(&a, &b, 10), 8);
    Ok(())
}

#[test]
fn counts_never_exceed_the_cap() -> Result<()> {
    let a = carbon_cycle(6)?;
    let b = carbon_cycle(6)?;
    for cap in [1, 2, 5, 11, 12, 50] {
        assert_eq!(count_isomorphisms(&a, &b, cap), cap.min(12));
        assert!(count_monomorphisms(&a, &b, cap) <= cap);
    }
    Ok(())
}

#[test]
fn isomorphism_positivity_is_symmetric() -> Result<()> {
    let pairs = [
        (carbon_cycle(4)?, carbon_cycle(4)?),
        (carbon_cycle(4)?, carbon_cycle(5)?),
        (carbon_cycle(3)?, carbon_cycle(3)?),
    ];
    for (a, b) in &pairs {
        let forward = count_isomorphisms(a, b, 1);
        let backward = count_isomorphisms(b, a, 1);
        assert_eq!(forward > 0, backward > 0);
    }
    Ok(())
}

#[test]
fn permutations_are_isomorphic_to_their_source() -> Result<()> {
    let graph = carbon_cycle(8)?;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1234);
    for _ in 0..5 {
        let permuted = graph.make_permutation_with(&mut rng);
        assert_eq!(permuted.num_vertices(), graph.num_vertices());
        assert_eq!(permuted.num_edges(), graph.num_edges());
        assert_ne!(permuted.id(), graph.id());
        assert_eq!(count_isomorphisms(&graph, &permuted, 1), 1);
    }
    Ok(())
}

#[test]
fn permutation_of_irregular_graph_preserves_structure() -> Result<()> {
    // A labeled tree with distinct degrees so a wrong relabeling would show.
    let mut builder = InternalGraph::builder();
    let c0 = builder.add_vertex("C");
    let c1 = builder.add_vertex("C");
    let o = builder.add_vertex("O");
    let n = builder.add_vertex("N");
    let h = builder.add_vertex("H");
    builder.add_edge(c0, c1, "-")?;
    builder.add_edge(c1, o, "=")?;
    builder.add_edge(c1, n, "-")?;
    builder.add_edge(n, h, "-")?;
    let graph = GraphInstance::wrap(builder.build());

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(99);
    let permuted = graph.make_permutation_with(&mut rng);
    assert_eq!(count_isomorphisms(&graph, &permuted, 10), 1);
    Ok(())
}

#[test]
fn monomorphism_is_not_symmetric() -> Result<()> {
    let edge = GraphInstance::from_text(
        &GraphLoader,
        r#"{
            "vertices": [{"id": 0, "label": "C"}, {"id": 1, "label": "C"}],
            "edges": [{"source": 0, "target": 1, "label": "1"}]
        }"#,
    )?;
    let square = carbon_cycle(4)?;
    // Each of the four edges embeds in two directions.
    assert_eq!(count_monomorphisms(&edge, &square, 100), 8);
    assert_eq!(count_monomorphisms(&square, &edge, 100), 0);
    Ok(())
}

#[test]
fn label_prescreen_rejects_without_search() -> Result<()> {
    let carbon = carbon_cycle(4)?;
    let nitrogen = GraphInstance::from_text(&GraphLoader, &cycle_json(&["N"; 4], "1"))?;
    assert_eq!(count_isomorphisms(&carbon, &nitrogen, 10), 0);
    assert_eq!(count_monomorphisms(&carbon, &nitrogen, 10), 0);
    Ok(())
}
