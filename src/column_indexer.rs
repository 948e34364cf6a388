//! Bijection between a linear cell index and an ordered pair of path
//! slots within one column (spec §3, §4.1). Grounded on
//! `original_source/tests/ColumnIndexerTest.cpp`'s `get_paths`/`get_alleles`
//! contract: `cell -> (cell / P, cell % P)`.

use crate::errors::{Error, Result};
use crate::variant::{AlleleId, PathId, UniqueKmers};

/// Maps a column's cell index to path and allele pairs without ever
/// materialising the `P^2` pairs explicitly.
#[derive(Debug, Clone)]
pub struct ColumnIndexer {
    paths: Vec<PathId>,
    alleles: Vec<AlleleId>,
}

impl ColumnIndexer {
    /// Builds an indexer from a site's covering-paths list, preserving
    /// slot order (spec §3: "the mapping slot→path_id is fixed for that
    /// site").
    pub fn build(site: &UniqueKmers) -> Self {
        let paths = site.covering_paths.iter().map(|(p, _)| *p).collect();
        let alleles = site.covering_paths.iter().map(|(_, a)| *a).collect();
        ColumnIndexer { paths, alleles }
    }

    /// Number of paths covering the site (`P`).
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// `P^2`, the number of ordered cells in the column.
    pub fn size(&self) -> usize {
        self.paths.len() * self.paths.len()
    }

    fn slots(&self, cell: usize) -> Result<(usize, usize)> {
        let p = self.path_count();
        if p == 0 || cell >= p * p {
            return Err(Error::CellIndexOutOfRange {
                cell,
                size: self.size(),
            });
        }
        Ok((cell / p, cell % p))
    }

    /// `(path_id_i, path_id_j)` for the ordered pair at `cell`.
    pub fn get_paths(&self, cell: usize) -> Result<(PathId, PathId)> {
        let (i, j) = self.slots(cell)?;
        Ok((self.paths[i], self.paths[j]))
    }

    /// `(allele_i, allele_j)` for the ordered pair at `cell`.
    pub fn get_alleles(&self, cell: usize) -> Result<(AlleleId, AlleleId)> {
        let (i, j) = self.slots(cell)?;
        Ok((self.alleles[i], self.alleles[j]))
    }

    /// Path id at a bare slot, used when composing cells from two slot
    /// indices directly (e.g. during backtracking).
    pub fn path_at_slot(&self, slot: usize) -> PathId {
        self.paths[slot]
    }

    pub fn allele_at_slot(&self, slot: usize) -> AlleleId {
        self.alleles[slot]
    }

    /// Linear cell index for a `(slot_i, slot_j)` pair.
    pub fn cell_of(&self, slot_i: usize, slot_j: usize) -> usize {
        slot_i * self.path_count() + slot_j
    }
}
