use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::backend::{Backends, TextFormatParser};
use crate::cache::DerivedCells;
use crate::error::{GraphError, Result};
use crate::external_id::ExternalIdIndex;
use crate::graph::model::InternalGraph;
use crate::graph::serialization::GraphWriter;

pub type InstanceId = u64;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_instance_id() -> InstanceId {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Opaque vertex descriptor: owning-instance id plus internal index.
/// Descriptors from different instances never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vertex {
    owner: InstanceId,
    index: usize,
}

impl Vertex {
    pub fn owner(&self) -> InstanceId {
        self.owner
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Opaque edge descriptor, same ownership discipline as [`Vertex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    owner: InstanceId,
    index: usize,
}

impl Edge {
    pub fn owner(&self) -> InstanceId {
        self.owner
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Deferred depiction unit of work: returns a file prefix for the renderer.
pub type ImageHook = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DepictionState {
    #[default]
    NotSet,
    Set,
    Invoked,
}

#[derive(Default)]
struct DepictionSlot {
    hook: Option<ImageHook>,
    state: DepictionState,
    command: Option<String>,
}

/// Graph identity wrapper: the immutable structural store plus a unique id,
/// a mutable display name, the external-id index, the derived-property cells,
/// and the depiction slot. Shared by reference through [`GraphHandle`].
pub struct GraphInstance {
    id: InstanceId,
    graph: InternalGraph,
    external_ids: ExternalIdIndex,
    molecule: bool,
    name: RwLock<String>,
    cells: DerivedCells,
    depiction: Mutex<DepictionSlot>,
    backends: Backends,
}

pub type GraphHandle = Arc<GraphInstance>;

impl GraphInstance {
    fn assemble(
        graph: InternalGraph,
        external_ids: ExternalIdIndex,
        backends: Backends,
        molecule: bool,
    ) -> GraphHandle {
        let id = next_instance_id();
        Arc::new(Self {
            id,
            graph,
            external_ids,
            molecule,
            name: RwLock::new(format!("g{id}")),
            cells: DerivedCells::default(),
            depiction: Mutex::new(DepictionSlot::default()),
            backends,
        })
    }

    /// Wrap a pre-built internal representation with an empty external-id map.
    pub fn wrap(graph: InternalGraph) -> GraphHandle {
        let molecule = graph.is_chemical();
        Self::assemble(graph, ExternalIdIndex::empty(), Backends::baseline(), molecule)
    }

    /// Wrap a pre-built internal representation together with the external-id
    /// pairs its source assigned.
    pub fn wrap_with_external_ids(
        graph: InternalGraph,
        pairs: impl IntoIterator<Item = (i64, usize)>,
    ) -> GraphHandle {
        let molecule = graph.is_chemical();
        Self::assemble(
            graph,
            ExternalIdIndex::from_pairs(pairs),
            Backends::baseline(),
            molecule,
        )
    }

    /// Wrap with an explicit collaborator set, for callers supplying their
    /// own encoder, chemistry, or layout backends.
    pub fn wrap_with_backends(graph: InternalGraph, backends: Backends) -> GraphHandle {
        let molecule = graph.is_chemical();
        Self::assemble(graph, ExternalIdIndex::empty(), backends, molecule)
    }

    /// Build from external-format text through the given parser. Parser
    /// diagnostics propagate unchanged as `GraphError::Input`.
    pub fn from_text(parser: &dyn TextFormatParser, text: &str) -> Result<GraphHandle> {
        let parsed = parser.parse(text)?;
        let molecule = parsed.graph.is_chemical();
        Ok(Self::assemble(
            parsed.graph,
            ExternalIdIndex::from_pairs(parsed.external_ids),
            Backends::baseline(),
            molecule,
        ))
    }

    /// Build from a molecule-bearing text format. The instance is flagged as
    /// a molecule regardless of label classification.
    pub fn from_molecule_text(parser: &dyn TextFormatParser, text: &str) -> Result<GraphHandle> {
        let parsed = parser.parse(text)?;
        Ok(Self::assemble(
            parsed.graph,
            ExternalIdIndex::from_pairs(parsed.external_ids),
            Backends::baseline(),
            true,
        ))
    }

    /// Unique instance id, strictly increasing with construction order.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn num_vertices(&self) -> usize {
        self.graph.vertex_count()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_molecule(&self) -> bool {
        self.molecule
    }

    /// Read-only access to the structural store for collaborators.
    pub fn graph(&self) -> &InternalGraph {
        &self.graph
    }

    pub fn name(&self) -> String {
        self.name.read().expect("name lock poisoned").clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write().expect("name lock poisoned") = name.into();
    }

    /// Lazy, restartable range over vertex descriptors in internal-index order.
    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        let owner = self.id;
        (0..self.graph.vertex_count()).map(move |index| Vertex { owner, index })
    }

    /// Lazy, restartable range over edge descriptors in internal-index order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        let owner = self.id;
        (0..self.graph.edge_count()).map(move |index| Edge { owner, index })
    }

    pub fn vertex_label(&self, vertex: Vertex) -> Option<&str> {
        if vertex.owner != self.id {
            return None;
        }
        self.graph.vertex_label(vertex.index)
    }

    pub fn vertex_degree(&self, vertex: Vertex) -> Option<usize> {
        if vertex.owner != self.id {
            return None;
        }
        (vertex.index < self.graph.vertex_count()).then(|| self.graph.degree(vertex.index))
    }

    pub fn edge_label(&self, edge: Edge) -> Option<&str> {
        if edge.owner != self.id {
            return None;
        }
        self.graph.edge_label(edge.index)
    }

    pub fn edge_endpoints(&self, edge: Edge) -> Option<(Vertex, Vertex)> {
        if edge.owner != self.id {
            return None;
        }
        self.graph.edge_endpoints(edge.index).map(|(a, b)| {
            (
                Vertex {
                    owner: self.id,
                    index: a,
                },
                Vertex {
                    owner: self.id,
                    index: b,
                },
            )
        })
    }

    /// Resolve an external id to a vertex descriptor. `None` when the id was
    /// unused by the source, or used more than once.
    pub fn get_vertex_from_external_id(&self, external: i64) -> Option<Vertex> {
        self.external_ids.resolve(external).map(|index| Vertex {
            owner: self.id,
            index,
        })
    }

    /// A new instance whose store is isomorphic to this one under a uniformly
    /// random relabeling of vertex indices. Fresh id, fresh caches, empty
    /// external-id map.
    pub fn make_permutation(&self) -> GraphHandle {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(random_seed());
        self.make_permutation_with(&mut rng)
    }

    /// Deterministic variant of [`make_permutation`](Self::make_permutation)
    /// for callers supplying their own randomness.
    pub fn make_permutation_with(&self, rng: &mut impl Rng) -> GraphHandle {
        let count = self.graph.vertex_count();
        let mut perm: Vec<usize> = (0..count).collect();
        for i in (1..count).rev() {
            let j = rng.gen_range(0..=i);
            perm.swap(i, j);
        }
        Self::assemble(
            self.graph.permuted(&perm),
            ExternalIdIndex::empty(),
            self.backends.clone(),
            self.molecule,
        )
    }

    /// Canonical encoding of the molecule. Computed on first access, stored
    /// for the lifetime of the instance.
    pub fn molecule_encoding(&self) -> Result<&str> {
        self.require_molecule("molecule encoding")?;
        self.cells
            .molecule_encoding_with(|| self.backends.encoder.molecule_encoding(&self.graph))
    }

    /// Canonical encoding of the graph as a general labeled graph.
    pub fn graph_encoding(&self) -> Result<&str> {
        self.cells
            .graph_encoding_with(|| self.backends.encoder.graph_encoding(&self.graph))
    }

    /// The molecule encoding when the instance is a molecule, otherwise the
    /// general encoding. A derived choice; not separately cached.
    pub fn linear_encoding(&self) -> Result<&str> {
        if self.molecule {
            self.molecule_encoding()
        } else {
            self.graph_encoding()
        }
    }

    /// Serialized interchange form, optionally with generated coordinates.
    /// Fails with `GraphError::Logic` when coordinates are requested but no
    /// layout strategy succeeds.
    pub fn serialized(&self, with_coords: bool) -> Result<&str> {
        self.cells.serialized_with(with_coords, || {
            let coords = if with_coords {
                Some(self.backends.layout.layout(&self.graph).ok_or_else(|| {
                    GraphError::logic("no layout strategy produced coordinates")
                })?)
            } else {
                None
            };
            GraphWriter::to_json_string(&self.graph, coords.as_deref())
        })
    }

    pub fn energy(&self) -> Result<f64> {
        self.require_molecule("energy")?;
        self.cells
            .energy_with(|| Ok(self.backends.chemistry.properties(&self.graph)?.energy))
    }

    /// Pre-seed the energy cell, skipping the chemistry backend. When racing
    /// writers collide, exactly one value wins and is retained in full.
    pub fn cache_energy(&self, value: f64) -> Result<()> {
        self.require_molecule("energy caching")?;
        self.cells.seed_energy(value);
        Ok(())
    }

    pub fn molar_mass(&self) -> Result<f64> {
        self.require_molecule("molar mass")?;
        self.cells
            .molar_mass_with(|| Ok(self.backends.chemistry.properties(&self.graph)?.molar_mass))
    }

    fn require_molecule(&self, what: &str) -> Result<()> {
        if self.molecule {
            Ok(())
        } else {
            Err(GraphError::logic(format!(
                "{what} requested for non-molecule graph {}",
                self.id
            )))
        }
    }

    /// Set a custom depiction hook, replacing any previous one and re-arming
    /// the invoked flag. `None` selects automatic depiction.
    pub fn set_image(&self, hook: Option<ImageHook>) {
        let mut slot = self.depiction.lock().expect("depiction lock poisoned");
        slot.state = if hook.is_some() {
            DepictionState::Set
        } else {
            DepictionState::NotSet
        };
        slot.hook = hook;
    }

    pub fn image(&self) -> Option<ImageHook> {
        self.depiction
            .lock()
            .expect("depiction lock poisoned")
            .hook
            .clone()
    }

    pub fn image_state(&self) -> DepictionState {
        self.depiction
            .lock()
            .expect("depiction lock poisoned")
            .state
    }

    /// Invoke the depiction hook at most once; called by the rendering
    /// collaborator. Returns `None` when no hook is set or it already ran.
    /// The hook itself runs outside the depiction lock.
    pub fn consume_image(&self) -> Option<String> {
        let hook = {
            let mut slot = self.depiction.lock().expect("depiction lock poisoned");
            if slot.state != DepictionState::Set {
                return None;
            }
            slot.state = DepictionState::Invoked;
            slot.hook.clone()
        };
        hook.map(|hook| hook())
    }

    /// Arm the one-shot post-processing command.
    pub fn set_image_command(&self, command: impl Into<String>) {
        self.depiction
            .lock()
            .expect("depiction lock poisoned")
            .command = Some(command.into());
    }

    pub fn image_command(&self) -> Option<String> {
        self.depiction
            .lock()
            .expect("depiction lock poisoned")
            .command
            .clone()
    }

    /// Take the post-processing command; later calls return `None` until a
    /// new command is armed.
    pub fn take_image_command(&self) -> Option<String> {
        self.depiction
            .lock()
            .expect("depiction lock poisoned")
            .command
            .take()
    }
}

impl std::fmt::Debug for GraphInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphInstance")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("vertices", &self.num_vertices())
            .field("edges", &self.num_edges())
            .field("molecule", &self.molecule)
            .field("cells", &self.cells)
            .finish()
    }
}

impl PartialEq for GraphInstance {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GraphInstance {}

impl PartialOrd for GraphInstance {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GraphInstance {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for GraphInstance {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn random_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
