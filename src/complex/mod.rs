//! # Simplicial Complexes
//!
//! Face collections produced by the coverage builder:
//!
//! - [`Complex`]: a deduplicated set of faces (proximity or coverage complex)
//! - [`FilteredComplex`]: faces tagged with a two-stage [`Filtration`] level
//!
//! Both are keyed by [`FaceKey`] and iterate in key order. `close` adds
//! every missing subface so the result is a well-formed simplicial complex.

pub mod builder;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::FaceKey;

pub use builder::{is_covered, ComplexBundle, CoverageBuilder};

/// Stage at which a face enters the proximity → coverage filtration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Filtration {
    /// Present in the coverage complex.
    Covered = 0,
    /// Present only in the proximity complex.
    ProximityOnly = 1,
}

impl Filtration {
    pub fn from_covered(covered: bool) -> Self {
        if covered { Self::Covered } else { Self::ProximityOnly }
    }

    pub fn level(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for Filtration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.level())
    }
}

// ============================================================================
// Complex
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complex {
    faces: BTreeSet<FaceKey>,
}

impl Complex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the face was already present.
    pub fn insert(&mut self, key: FaceKey) -> bool {
        self.faces.insert(key)
    }

    pub fn contains(&self, key: &FaceKey) -> bool {
        self.faces.contains(key)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FaceKey> {
        self.faces.iter()
    }

    /// Faces of simplicial dimension `k`.
    pub fn faces_of_dim(&self, k: usize) -> impl Iterator<Item = &FaceKey> {
        self.faces.iter().filter(move |f| f.dim() == Some(k))
    }

    /// Face counts indexed by dimension.
    pub fn dim_counts(&self) -> Vec<usize> {
        let mut counts = Vec::new();
        for f in &self.faces {
            let Some(k) = f.dim() else { continue };
            if counts.len() <= k {
                counts.resize(k + 1, 0);
            }
            counts[k] += 1;
        }
        counts
    }

    /// Add every subface of every face.
    pub fn close(&mut self) {
        let missing: Vec<FaceKey> = self
            .faces
            .iter()
            .flat_map(|f| f.subfaces())
            .filter(|s| !self.faces.contains(s))
            .collect();
        self.faces.extend(missing);
    }

    /// `true` when every subface of every face is present.
    pub fn is_closed(&self) -> bool {
        self.faces.iter().all(|f| f.subfaces().all(|s| self.faces.contains(&s)))
    }
}

impl FromIterator<FaceKey> for Complex {
    fn from_iter<I: IntoIterator<Item = FaceKey>>(iter: I) -> Self {
        Self { faces: iter.into_iter().collect() }
    }
}

// ============================================================================
// FilteredComplex
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredComplex {
    levels: BTreeMap<FaceKey, Filtration>,
}

impl FilteredComplex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key` at `level`; a face already present keeps the lower level.
    pub fn insert(&mut self, key: FaceKey, level: Filtration) {
        self.levels
            .entry(key)
            .and_modify(|l| *l = (*l).min(level))
            .or_insert(level);
    }

    pub fn level(&self, key: &FaceKey) -> Option<Filtration> {
        self.levels.get(key).copied()
    }

    pub fn contains(&self, key: &FaceKey) -> bool {
        self.levels.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FaceKey, Filtration)> {
        self.levels.iter().map(|(k, &l)| (k, l))
    }

    /// Add missing subfaces and lower every face to the minimum level of
    /// its cofaces.
    pub fn close(&mut self) {
        let mut lowered: BTreeMap<FaceKey, Filtration> = BTreeMap::new();
        for (face, &level) in &self.levels {
            for sub in face.subfaces() {
                lowered
                    .entry(sub)
                    .and_modify(|l| *l = (*l).min(level))
                    .or_insert(level);
            }
        }
        for (sub, level) in lowered {
            self.insert(sub, level);
        }
    }

    /// Faces present at `level` or earlier.
    pub fn stage(&self, level: Filtration) -> Complex {
        self.levels
            .iter()
            .filter(|&(_, &l)| l <= level)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Stream order: by level, then dimension, then vertex ids. Every face
    /// comes after all of its subfaces.
    pub fn stream(&self) -> Vec<(FaceKey, Filtration)> {
        let mut out: Vec<(FaceKey, Filtration)> = self.levels.iter().map(|(k, &l)| (k.clone(), l)).collect();
        out.sort_by(|(ka, la), (kb, lb)| la.cmp(lb).then(ka.len().cmp(&kb.len())).then(ka.cmp(kb)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn close_adds_all_subfaces() {
        let mut c: Complex = [FaceKey::from([0, 1, 2])].into_iter().collect();
        assert!(!c.is_closed());
        c.close();
        assert!(c.is_closed());
        assert_eq!(c.dim_counts(), vec![3, 3, 1]);
        assert!(c.contains(&FaceKey::from([0, 2])));
    }

    #[test]
    fn filtered_insert_keeps_lower_level() {
        let mut f = FilteredComplex::new();
        let key = FaceKey::from([4]);
        f.insert(key.clone(), Filtration::ProximityOnly);
        f.insert(key.clone(), Filtration::Covered);
        f.insert(key.clone(), Filtration::ProximityOnly);
        assert_eq!(f.level(&key), Some(Filtration::Covered));
    }

    #[test]
    fn filtered_close_takes_minimum_over_cofaces() {
        let mut f = FilteredComplex::new();
        f.insert(FaceKey::from([0, 1]), Filtration::ProximityOnly);
        f.insert(FaceKey::from([0, 1, 2]), Filtration::Covered);
        f.insert(FaceKey::from([3]), Filtration::ProximityOnly);
        f.close();
        assert_eq!(f.level(&FaceKey::from([0, 1])), Some(Filtration::Covered));
        assert_eq!(f.level(&FaceKey::from([2])), Some(Filtration::Covered));
        assert_eq!(f.level(&FaceKey::from([3])), Some(Filtration::ProximityOnly));
        assert_eq!(f.len(), 8);
    }

    #[test]
    fn stream_orders_faces_after_their_subfaces() {
        let mut f = FilteredComplex::new();
        f.insert(FaceKey::from([0, 1]), Filtration::Covered);
        f.insert(FaceKey::from([1, 2]), Filtration::ProximityOnly);
        f.close();
        let stream = f.stream();
        let pos = |k: &FaceKey| stream.iter().position(|(s, _)| s == k).unwrap();
        for (key, _) in &stream {
            for sub in key.subfaces() {
                assert!(pos(&sub) < pos(key), "{sub} after {key}");
            }
        }
        assert_eq!(f.stage(Filtration::Covered).len(), 3);
        assert_eq!(f.stage(Filtration::ProximityOnly).len(), 5);
    }

    #[test]
    fn filtration_levels() {
        assert_eq!(Filtration::Covered.level(), 0);
        assert_eq!(Filtration::ProximityOnly.level(), 1);
        assert_eq!(Filtration::from_covered(false), Filtration::ProximityOnly);
        assert!(Filtration::Covered < Filtration::ProximityOnly);
    }
}
