use std::fmt;

use once_cell::sync::OnceCell;

use crate::error::Result;

/// Compute-once cells for the derived representations of a graph instance.
///
/// Each cell is filled at most once for the lifetime of the instance and
/// never invalidated. Racing first accesses are serialized per cell by
/// `OnceCell`, so the delegated computation runs exactly once and a reader
/// never observes a partially written value.
#[derive(Default)]
pub struct DerivedCells {
    molecule_encoding: OnceCell<String>,
    graph_encoding: OnceCell<String>,
    serialized: OnceCell<String>,
    serialized_with_coords: OnceCell<String>,
    energy: OnceCell<f64>,
    molar_mass: OnceCell<f64>,
}

impl DerivedCells {
    pub fn molecule_encoding_with(
        &self,
        compute: impl FnOnce() -> Result<String>,
    ) -> Result<&str> {
        self.molecule_encoding
            .get_or_try_init(compute)
            .map(String::as_str)
    }

    pub fn graph_encoding_with(&self, compute: impl FnOnce() -> Result<String>) -> Result<&str> {
        self.graph_encoding
            .get_or_try_init(compute)
            .map(String::as_str)
    }

    pub fn serialized_with(
        &self,
        with_coords: bool,
        compute: impl FnOnce() -> Result<String>,
    ) -> Result<&str> {
        let cell = if with_coords {
            &self.serialized_with_coords
        } else {
            &self.serialized
        };
        cell.get_or_try_init(compute).map(String::as_str)
    }

    pub fn energy_with(&self, compute: impl FnOnce() -> Result<f64>) -> Result<f64> {
        self.energy.get_or_try_init(compute).copied()
    }

    /// Pre-seed the energy cell, skipping the delegated computation. When the
    /// cell is already filled the existing value is retained (first write
    /// wins).
    pub fn seed_energy(&self, value: f64) {
        let _ = self.energy.set(value);
    }

    pub fn molar_mass_with(&self, compute: impl FnOnce() -> Result<f64>) -> Result<f64> {
        self.molar_mass.get_or_try_init(compute).copied()
    }
}

impl fmt::Debug for DerivedCells {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedCells")
            .field("molecule_encoding", &self.molecule_encoding.get().is_some())
            .field("graph_encoding", &self.graph_encoding.get().is_some())
            .field("serialized", &self.serialized.get().is_some())
            .field(
                "serialized_with_coords",
                &self.serialized_with_coords.get().is_some(),
            )
            .field("energy", &self.energy.get().is_some())
            .field("molar_mass", &self.molar_mass.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn computes_once_and_returns_stored_value() {
        let cells = DerivedCells::default();
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("encoded".to_string())
        };
        assert_eq!(cells.graph_encoding_with(compute).unwrap(), "encoded");
        assert_eq!(
            cells
                .graph_encoding_with(|| Ok("other".to_string()))
                .unwrap(),
            "encoded"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_computation_leaves_cell_empty() {
        let cells = DerivedCells::default();
        let err = cells.energy_with(|| Err(GraphError::logic("backend down")));
        assert!(err.is_err());
        // A later successful computation still fills the cell.
        assert_eq!(cells.energy_with(|| Ok(-1.5)).unwrap(), -1.5);
    }

    #[test]
    fn seeded_energy_wins_over_computation() {
        let cells = DerivedCells::default();
        cells.seed_energy(42.0);
        assert_eq!(cells.energy_with(|| Ok(0.0)).unwrap(), 42.0);
        // A second seed loses to the first.
        cells.seed_energy(7.0);
        assert_eq!(cells.energy_with(|| Ok(0.0)).unwrap(), 42.0);
    }

    #[test]
    fn plain_and_coordinate_serializations_are_independent() {
        let cells = DerivedCells::default();
        assert_eq!(
            cells.serialized_with(false, || Ok("plain".into())).unwrap(),
            "plain"
        );
        assert_eq!(
            cells.serialized_with(true, || Ok("coords".into())).unwrap(),
            "coords"
        );
        assert_eq!(
            cells.serialized_with(false, || Ok("other".into())).unwrap(),
            "plain"
        );
    }
}
