//! Ordered label schemas for the axes of input-output tables
//!
//! Every matrix in an EEIO calculation is indexed by the same ordered list of
//! (region, sector) pairs. Reordering one table without the others silently
//! corrupts all downstream results, so the ordering is carried alongside the
//! numbers as a [`MultiIndex`] and compared at every operation boundary.
//!
//! # Examples
//!
//! ```rust
//! use rseeio_core::index::MultiIndex;
//!
//! let index = MultiIndex::from_pairs(
//!     "region",
//!     "sector",
//!     &[("AT", "Wheat"), ("AT", "Steel"), ("BE", "Wheat"), ("BE", "Steel")],
//! )
//! .unwrap();
//!
//! assert_eq!(index.regions(), vec!["AT", "BE"]);
//! assert_eq!(index.position(&["BE", "Wheat"]), Some(2));
//! ```

use crate::errors::{EEIOError, EEIOResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;

/// A contiguous run of rows/columns belonging to one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionBlock {
    pub region: String,
    pub range: Range<usize>,
}

/// Ordered list of label tuples describing one axis of a table
///
/// The first level is always interpreted as the region when aggregating.
/// Deserialisation goes through [`MultiIndex::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMultiIndex")]
pub struct MultiIndex {
    level_names: Vec<String>,
    keys: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct RawMultiIndex {
    level_names: Vec<String>,
    keys: Vec<Vec<String>>,
}

impl TryFrom<RawMultiIndex> for MultiIndex {
    type Error = EEIOError;

    fn try_from(raw: RawMultiIndex) -> EEIOResult<Self> {
        MultiIndex::new(raw.level_names, raw.keys)
    }
}

impl MultiIndex {
    /// Create a new index
    ///
    /// Every key must have one label per level and keys must be unique.
    pub fn new(level_names: Vec<String>, keys: Vec<Vec<String>>) -> EEIOResult<Self> {
        if level_names.is_empty() {
            return Err(EEIOError::InvalidIndex(
                "an index needs at least one level".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            if key.len() != level_names.len() {
                return Err(EEIOError::InvalidIndex(format!(
                    "key {} at position {} has {} labels but the index has {} levels",
                    key.join("/"),
                    i,
                    key.len(),
                    level_names.len()
                )));
            }
            if !seen.insert(key) {
                return Err(EEIOError::InvalidIndex(format!(
                    "duplicate key {} at position {}",
                    key.join("/"),
                    i
                )));
            }
        }

        Ok(Self { level_names, keys })
    }

    /// Create an index with a single level (e.g. stressor or impact names)
    pub fn single_level<S: Into<String>>(
        name: &str,
        labels: impl IntoIterator<Item = S>,
    ) -> EEIOResult<Self> {
        Self::new(
            vec![name.to_string()],
            labels.into_iter().map(|l| vec![l.into()]).collect(),
        )
    }

    /// Create a two-level index from (outer, inner) pairs
    pub fn from_pairs(outer: &str, inner: &str, pairs: &[(&str, &str)]) -> EEIOResult<Self> {
        Self::new(
            vec![outer.to_string(), inner.to_string()],
            pairs
                .iter()
                .map(|(a, b)| vec![a.to_string(), b.to_string()])
                .collect(),
        )
    }

    /// Cartesian product of regions and sectors, region-major
    pub fn region_sector(regions: &[&str], sectors: &[&str]) -> EEIOResult<Self> {
        let pairs: Vec<(&str, &str)> = regions
            .iter()
            .flat_map(|r| sectors.iter().map(move |s| (*r, *s)))
            .collect();
        Self::from_pairs("region", "sector", &pairs)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of label levels
    pub fn depth(&self) -> usize {
        self.level_names.len()
    }

    pub fn level_names(&self) -> &[String] {
        &self.level_names
    }

    pub fn keys(&self) -> &[Vec<String>] {
        &self.keys
    }

    pub fn key(&self, i: usize) -> Option<&[String]> {
        self.keys.get(i).map(|k| k.as_slice())
    }

    /// Label of the first level at position `i`
    pub fn region_of(&self, i: usize) -> Option<&str> {
        self.keys.get(i).map(|k| k[0].as_str())
    }

    /// Label of the last level at position `i`
    pub fn leaf_of(&self, i: usize) -> Option<&str> {
        self.keys
            .get(i)
            .and_then(|k| k.last())
            .map(|s| s.as_str())
    }

    /// Position of an exact key
    pub fn position(&self, key: &[&str]) -> Option<usize> {
        self.keys.iter().position(|k| {
            k.len() == key.len() && k.iter().zip(key.iter()).all(|(a, b)| a == b)
        })
    }

    /// Distinct first-level labels in order of first appearance
    pub fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = Vec::new();
        for key in &self.keys {
            if !regions.contains(&key[0]) {
                regions.push(key[0].clone());
            }
        }
        regions
    }

    /// Contiguous blocks of positions sharing the same first-level label
    ///
    /// Fails if a region appears in more than one block, since summing such
    /// an axis by block would split one region in two.
    pub fn region_blocks(&self) -> EEIOResult<Vec<RegionBlock>> {
        let mut blocks: Vec<RegionBlock> = Vec::new();
        for (i, key) in self.keys.iter().enumerate() {
            if let Some(block) = blocks.last_mut() {
                if block.region == key[0] {
                    block.range.end = i + 1;
                    continue;
                }
            }
            if blocks.iter().any(|b| b.region == key[0]) {
                return Err(EEIOError::InvalidIndex(format!(
                    "region {} is not contiguous (reappears at position {})",
                    key[0], i
                )));
            }
            blocks.push(RegionBlock {
                region: key[0].clone(),
                range: i..i + 1,
            });
        }
        Ok(blocks)
    }

    /// Single-level index of the regions of this index
    pub fn aggregated_by_region(&self) -> EEIOResult<Self> {
        let name = self.level_names[0].clone();
        Self::single_level(&name, self.region_blocks()?.into_iter().map(|b| b.region))
    }

    /// Check that two indexes carry identical keys in identical order
    pub fn ensure_matches(&self, other: &MultiIndex, context: &str) -> EEIOResult<()> {
        if self.keys == other.keys {
            return Ok(());
        }
        let position = self
            .keys
            .iter()
            .zip(other.keys.iter())
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| self.len().min(other.len()));

        Err(EEIOError::IndexMismatch {
            context: context.to_string(),
            position,
            left: self.keys.get(position).cloned(),
            right: other.keys.get(position).cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> MultiIndex {
        MultiIndex::region_sector(&["AT", "BE"], &["Wheat", "Steel"]).unwrap()
    }

    #[test]
    fn region_sector_is_region_major() {
        let index = two_by_two();
        assert_eq!(index.len(), 4);
        assert_eq!(index.key(1).unwrap(), ["AT", "Steel"]);
        assert_eq!(index.key(2).unwrap(), ["BE", "Wheat"]);
        assert_eq!(index.depth(), 2);
    }

    #[test]
    fn regions_keep_first_appearance_order() {
        let index = MultiIndex::region_sector(&["ZA", "AT", "MX"], &["Steel"]).unwrap();
        assert_eq!(index.regions(), vec!["ZA", "AT", "MX"]);
    }

    #[test]
    fn region_blocks() {
        let blocks = two_by_two().region_blocks().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].range, 0..2);
        assert_eq!(blocks[1].region, "BE");
        assert_eq!(blocks[1].range, 2..4);
    }

    #[test]
    fn non_contiguous_region_is_rejected() {
        let index = MultiIndex::from_pairs(
            "region",
            "sector",
            &[("AT", "Wheat"), ("BE", "Wheat"), ("AT", "Steel")],
        )
        .unwrap();
        assert!(matches!(
            index.region_blocks(),
            Err(EEIOError::InvalidIndex(_))
        ));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let result =
            MultiIndex::from_pairs("region", "sector", &[("AT", "Wheat"), ("AT", "Wheat")]);
        assert!(matches!(result, Err(EEIOError::InvalidIndex(_))));
    }

    #[test]
    fn ragged_keys_are_rejected() {
        let result = MultiIndex::new(
            vec!["region".to_string(), "sector".to_string()],
            vec![vec!["AT".to_string()]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn aggregation_is_idempotent() {
        let once = two_by_two().aggregated_by_region().unwrap();
        let twice = once.aggregated_by_region().unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.keys(), [vec!["AT".to_string()], vec!["BE".to_string()]]);
    }

    #[test]
    fn mismatch_reports_first_difference() {
        let a = two_by_two();
        let b = MultiIndex::region_sector(&["AT", "BE"], &["Steel", "Wheat"]).unwrap();

        match a.ensure_matches(&b, "test").unwrap_err() {
            EEIOError::IndexMismatch {
                position,
                left,
                right,
                ..
            } => {
                assert_eq!(position, 0);
                assert_eq!(left.unwrap(), ["AT", "Wheat"]);
                assert_eq!(right.unwrap(), ["AT", "Steel"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn deserialisation_validates() {
        let index = two_by_two();
        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(serde_json::from_str::<MultiIndex>(&json).unwrap(), index);

        let no_levels = r#"{"level_names": [], "keys": []}"#;
        assert!(serde_json::from_str::<MultiIndex>(no_levels).is_err());
        let duplicate = r#"{"level_names": ["region"], "keys": [["AT"], ["AT"]]}"#;
        assert!(serde_json::from_str::<MultiIndex>(duplicate).is_err());
        let ragged = r#"{"level_names": ["region", "sector"], "keys": [["AT"]]}"#;
        assert!(serde_json::from_str::<MultiIndex>(ragged).is_err());
    }

    #[test]
    fn mismatch_on_length() {
        let a = two_by_two();
        let b = MultiIndex::region_sector(&["AT"], &["Wheat", "Steel"]).unwrap();
        let err = a.ensure_matches(&b, "test").unwrap_err();
        assert!(matches!(err, EEIOError::IndexMismatch { position: 2, .. }));
    }
}
