pub mod backend;
pub mod cache;
pub mod error;
pub mod external_id;
pub mod graph;
pub mod matching;
pub mod render;

pub use backend::{
    Backends, ChemistryBackend, Encoder, LayoutProvider, MoleculeProperties, ParsedGraph,
    TextFormatParser,
};
pub use error::{GraphError, Result};
pub use external_id::ExternalIdIndex;
pub use graph::instance::Edge;
pub use graph::{
    DepictionState, GraphHandle, GraphInstance, GraphLoader, GraphWriter, ImageHook, InstanceId,
    InternalGraph, Vertex,
};
pub use matching::{
    count_batch, count_isomorphisms, count_monomorphisms, count_morphisms, MorphismKind,
};
pub use render::{DepictionRenderer, FileNameRenderer, DEPICTION_SUFFIX};
