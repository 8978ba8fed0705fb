use crate::error::Result;
use crate::graph::instance::GraphHandle;

/// Suffix the rendering pipeline appends to a depiction file prefix.
pub const DEPICTION_SUFFIX: &str = ".pdf";

/// Boundary to the rendering pipeline. `render` produces the filename pair
/// for a depiction, consuming the graph's depiction hook (at most once) and
/// its one-shot post-processing command when set. When a peer is given the
/// two depictions are laid out side by side.
pub trait DepictionRenderer: Send + Sync {
    fn render(&self, graph: &GraphHandle, peer: Option<&GraphHandle>) -> Result<(String, String)>;
}

/// Filename-only renderer: resolves depiction names without producing
/// graphics. The custom hook wins over the automatic name derived from the
/// instance id.
pub struct FileNameRenderer;

impl FileNameRenderer {
    fn depiction_name(graph: &GraphHandle) -> String {
        let prefix = graph
            .consume_image()
            .unwrap_or_else(|| format!("g{}", graph.id()));
        format!("{prefix}{DEPICTION_SUFFIX}")
    }
}

impl DepictionRenderer for FileNameRenderer {
    fn render(&self, graph: &GraphHandle, peer: Option<&GraphHandle>) -> Result<(String, String)> {
        let first = Self::depiction_name(graph);
        let second = match peer {
            Some(peer) => Self::depiction_name(peer),
            None => first.clone(),
        };
        // This renderer never runs post-processing, so the one-shot command
        // stays armed for a pipeline that does.
        Ok((first, second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::instance::GraphInstance;
    use crate::graph::model::InternalGraph;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn single_vertex() -> GraphHandle {
        let mut builder = InternalGraph::builder();
        builder.add_vertex("C");
        GraphInstance::wrap(builder.build())
    }

    #[test]
    fn automatic_name_uses_instance_id() {
        let graph = single_vertex();
        let (first, second) = FileNameRenderer.render(&graph, None).unwrap();
        assert_eq!(first, format!("g{}{}", graph.id(), DEPICTION_SUFFIX));
        assert_eq!(first, second);
    }

    #[test]
    fn custom_hook_runs_exactly_once() {
        let graph = single_vertex();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        graph.set_image(Some(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            "custom".to_string()
        })));

        let (first, _) = FileNameRenderer.render(&graph, None).unwrap();
        assert_eq!(first, format!("custom{DEPICTION_SUFFIX}"));

        // A second depiction falls back to the automatic name.
        let (again, _) = FileNameRenderer.render(&graph, None).unwrap();
        assert_eq!(again, format!("g{}{}", graph.id(), DEPICTION_SUFFIX));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn command_stays_armed_for_a_post_processing_pipeline() {
        let graph = single_vertex();
        graph.set_image_command("montage out.pdf");
        FileNameRenderer.render(&graph, None).unwrap();
        assert_eq!(graph.take_image_command(), Some("montage out.pdf".to_string()));
    }

    #[test]
    fn side_by_side_names_both_graphs() {
        let left = single_vertex();
        let right = single_vertex();
        let (first, second) = FileNameRenderer.render(&left, Some(&right)).unwrap();
        assert_ne!(first, second);
    }
}
