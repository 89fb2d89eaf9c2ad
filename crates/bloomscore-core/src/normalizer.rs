//! Bloom's level normalization.
//!
//! Courses rarely target all six levels. The level map compresses the
//! levels a course actually targets onto the lowest ordinals, keeping
//! canonical order, and fills the remaining ordinals with the unused levels
//! in canonical order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{BloomLevel, CourseDesign};

/// A bijection from the six canonical levels onto ordinals 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, u8>", try_from = "BTreeMap<String, u8>")]
pub struct BloomLevelMap {
    /// Ordinal per level, indexed by canonical position.
    ordinals: [u8; 6],
}

impl BloomLevelMap {
    /// Build the map from the primary target names of each CO. Names are
    /// matched case-insensitively; non-canonical names are ignored.
    pub fn from_targets<'a, I>(targets: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut used = [false; 6];
        for name in targets {
            if let Ok(level) = name.parse::<BloomLevel>() {
                used[level.canonical_index()] = true;
            }
        }

        let mut ordinals = [0u8; 6];
        let mut next = 1u8;
        for (idx, _) in used.iter().enumerate().filter(|(_, u)| **u) {
            ordinals[idx] = next;
            next += 1;
        }
        for slot in ordinals.iter_mut().filter(|o| **o == 0) {
            if next <= 6 {
                *slot = next;
                next += 1;
            }
        }
        for slot in ordinals.iter_mut().filter(|o| **o == 0) {
            *slot = 6;
        }

        Self { ordinals }
    }

    /// The map for a course design's declared CO targets.
    pub fn for_design(design: &CourseDesign) -> Self {
        let map = Self::from_targets(design.primary_targets());
        tracing::debug!(?map, "computed Bloom's level map");
        map
    }

    /// Ordinal assigned to `level`.
    pub fn ordinal(&self, level: BloomLevel) -> u8 {
        self.ordinals[level.canonical_index()]
    }

    /// The level holding `ordinal`, if any.
    pub fn level_at(&self, ordinal: u8) -> Option<BloomLevel> {
        BloomLevel::CANONICAL
            .into_iter()
            .find(|level| self.ordinal(*level) == ordinal)
    }

    /// `(level, ordinal)` pairs in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = (BloomLevel, u8)> + '_ {
        (1..=6u8).filter_map(move |o| self.level_at(o).map(|l| (l, o)))
    }
}

impl Default for BloomLevelMap {
    /// Canonical order: create = 1 … remember = 6.
    fn default() -> Self {
        Self::from_targets(std::iter::empty())
    }
}

impl From<BloomLevelMap> for BTreeMap<String, u8> {
    fn from(map: BloomLevelMap) -> Self {
        BloomLevel::CANONICAL
            .into_iter()
            .map(|level| (level.name().to_string(), map.ordinal(level)))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, u8>> for BloomLevelMap {
    type Error = String;

    fn try_from(raw: BTreeMap<String, u8>) -> Result<Self, Self::Error> {
        let mut ordinals = [0u8; 6];
        for (name, ordinal) in raw {
            let level: BloomLevel = name.parse()?;
            if !(1..=6).contains(&ordinal) {
                return Err(format!("ordinal {ordinal} for '{name}' is outside 1..=6"));
            }
            ordinals[level.canonical_index()] = ordinal;
        }
        let mut sorted = ordinals;
        sorted.sort_unstable();
        if sorted != [1, 2, 3, 4, 5, 6] {
            return Err(format!("level map is not a bijection onto 1..=6: {ordinals:?}"));
        }
        Ok(Self { ordinals })
    }
}
