pub mod construction;
pub mod instance;
pub mod model;
pub mod serialization;

pub use construction::GraphLoader;
pub use instance::{DepictionState, GraphHandle, GraphInstance, ImageHook, InstanceId, Vertex};
pub use model::{InternalGraph, InternalGraphBuilder, LabeledGraph};
pub use serialization::GraphWriter;
