//! Maximal cover: the largest subspace contained in the neighborhood span
//! of every face of a collection.

use hashbrown::HashSet;
use tracing::debug;

use crate::gf2::{Dimension, Subspace};
use crate::model::{Face, FaceKey};
use crate::network::Network;
use crate::Result;

/// Intersect the inclusive spans of `faces`, starting from the full space.
///
/// Returns the zero subspace as soon as a face has rank 0 or the running
/// intersection collapses. Full-rank faces are skipped. An empty
/// collection yields the full space.
pub fn vs_cover<'a>(dimension: Dimension, faces: impl IntoIterator<Item = &'a Face>) -> Result<Subspace> {
    let d = dimension.get();
    let mut cover = Subspace::full(d);
    for (seen, face) in faces.into_iter().enumerate() {
        dimension.check(face.dimension().get(), format!("vs_cover face {}", face.key()))?;
        let span = face.span();
        if span.is_zero() {
            debug!(face = %face.key(), seen, "face with empty span; cover is zero");
            return Ok(Subspace::zero(d));
        }
        if span.is_full() {
            continue;
        }
        cover = cover.intersect(span)?;
        if cover.is_zero() {
            debug!(face = %face.key(), seen, "cover collapsed to zero");
            return Ok(cover);
        }
    }
    Ok(cover)
}

/// A deduplicated collection of faces handed to [`vs_cover`].
#[derive(Debug, Clone)]
pub struct CoverComplex {
    dimension: Dimension,
    keys: HashSet<FaceKey>,
    faces: Vec<Face>,
}

impl CoverComplex {
    pub fn new(dimension: Dimension) -> Self {
        Self { dimension, keys: HashSet::new(), faces: Vec::new() }
    }

    /// Add `face` unless a face over the same vertex set is present.
    pub fn insert(&mut self, face: Face) -> Result<bool> {
        self.dimension.check(face.dimension().get(), format!("cover complex face {}", face.key()))?;
        if !self.keys.insert(face.key().clone()) {
            return Ok(false);
        }
        self.faces.push(face);
        Ok(true)
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn vs_cover(&self) -> Result<Subspace> {
        vs_cover(self.dimension, &self.faces)
    }
}

impl Network {
    /// Maximal cover over the maximal faces recorded by the last proximity build.
    pub fn maximal_cover(&self) -> Result<Subspace> {
        vs_cover(self.dimension(), self.maximal_faces()?)
    }
}
