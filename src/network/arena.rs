//! Index-addressed storage for vertices and registered faces.
//!
//! Vertices and faces are kept in two separate arenas so a face can be
//! recomputed (`&mut` into the face arena) while reading vertices
//! (`&` into the vertex arena).

use hashbrown::HashMap;

use crate::gf2::Dimension;
use crate::model::{Face, FaceId, FaceKey, Position, Vertex, VertexId, VertexSource};
use crate::{Error, Result};

// ============================================================================
// VertexArena
// ============================================================================

/// Vertices addressed by `VertexId`. Removed slots stay empty; ids are
/// never reused.
#[derive(Debug, Clone)]
pub struct VertexArena {
    dimension: Dimension,
    slots: Vec<Option<Vertex>>,
    live: usize,
}

impl VertexArena {
    pub fn new(dimension: Dimension) -> Self {
        Self { dimension, slots: Vec::new(), live: 0 }
    }

    pub fn insert(&mut self, position: Position) -> Result<VertexId> {
        let index = u32::try_from(self.slots.len())
            .map_err(|_| Error::ConfigError("vertex arena is full".into()))?;
        let id = VertexId(index);
        self.slots.push(Some(Vertex::new(id, position, self.dimension)));
        self.live += 1;
        Ok(id)
    }

    pub fn remove(&mut self, id: VertexId) -> Result<Vertex> {
        let vertex = self
            .slots
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .ok_or_else(|| not_found(id))?;
        self.live -= 1;
        Ok(vertex)
    }

    pub fn get_mut(&mut self, id: VertexId) -> Result<&mut Vertex> {
        self.slots
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| not_found(id))
    }

    pub fn contains(&self, id: VertexId) -> bool {
        matches!(self.slots.get(id.0 as usize), Some(Some(_)))
    }

    /// Live vertices in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Vertex> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Vertex> {
        self.slots.iter_mut().flatten()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

impl VertexSource for VertexArena {
    fn dimension(&self) -> Dimension {
        self.dimension
    }

    fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.slots
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: VertexId) -> Error {
    Error::NotFound(format!("vertex {id}"))
}

// ============================================================================
// FaceRegistry
// ============================================================================

/// Registered faces, deduplicated by vertex set.
#[derive(Debug, Clone, Default)]
pub struct FaceRegistry {
    slots: Vec<Option<Face>>,
    index: HashMap<FaceKey, FaceId>,
}

impl FaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `face` unless one with the same vertex set is already held.
    /// Returns the id of the stored face and whether it was newly added.
    pub fn insert(&mut self, face: Face) -> Result<(FaceId, bool)> {
        if let Some(&id) = self.index.get(face.key()) {
            return Ok((id, false));
        }
        let index = u32::try_from(self.slots.len())
            .map_err(|_| Error::ConfigError("face registry is full".into()))?;
        let id = FaceId(index);
        self.index.insert(face.key().clone(), id);
        self.slots.push(Some(face));
        Ok((id, true))
    }

    pub fn get(&self, id: FaceId) -> Result<&Face> {
        self.slots
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::NotFound(format!("face {id}")))
    }

    pub fn get_mut(&mut self, id: FaceId) -> Result<&mut Face> {
        self.slots
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::NotFound(format!("face {id}")))
    }

    pub fn lookup(&self, key: &FaceKey) -> Option<FaceId> {
        self.index.get(key).copied()
    }

    pub fn remove(&mut self, id: FaceId) -> Option<Face> {
        let face = self.slots.get_mut(id.0 as usize).and_then(Option::take)?;
        self.index.remove(face.key());
        Some(face)
    }

    /// Registered faces in id order.
    pub fn iter(&self) -> impl Iterator<Item = (FaceId, &Face)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.as_ref().map(|f| (FaceId(i as u32), f)))
    }

    /// Faces whose cached state reads vertex `v`: those with `v` among
    /// their inclusive neighbors, which covers every face containing `v`.
    pub fn dependents(&self, v: VertexId) -> Vec<FaceId> {
        self.iter()
            .filter(|(_, f)| f.neighbors().contains(&v) || f.contains(v))
            .map(|(id, _)| id)
            .collect()
    }

    /// Faces whose vertex set contains `v`.
    pub fn containing(&self, v: VertexId) -> Vec<FaceId> {
        self.iter().filter(|(_, f)| f.contains(v)).map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(n: usize) -> VertexArena {
        let mut a = VertexArena::new(Dimension::new(3).unwrap());
        for i in 0..n {
            a.insert(Position::new(i as f64, 0.0)).unwrap();
        }
        a
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut a = arena(3);
        a.remove(VertexId(1)).unwrap();
        assert_eq!(a.len(), 2);
        assert!(!a.contains(VertexId(1)));
        assert!(matches!(a.vertex(VertexId(1)), Err(Error::NotFound(_))));
        let id = a.insert(Position::default()).unwrap();
        assert_eq!(id, VertexId(3));
        let ids: Vec<VertexId> = a.iter().map(Vertex::id).collect();
        assert_eq!(ids, vec![VertexId(0), VertexId(2), VertexId(3)]);
    }

    #[test]
    fn double_remove_is_not_found() {
        let mut a = arena(1);
        a.remove(VertexId(0)).unwrap();
        assert!(a.remove(VertexId(0)).is_err());
        assert!(a.is_empty());
    }

    #[test]
    fn registry_deduplicates_by_key() {
        let a = arena(3);
        let mut faces = FaceRegistry::new();
        let (first, added) = faces.insert(Face::new(&a, [VertexId(0), VertexId(2)]).unwrap()).unwrap();
        assert!(added);
        let (again, added) = faces.insert(Face::new(&a, [VertexId(2), VertexId(0)]).unwrap()).unwrap();
        assert!(!added);
        assert_eq!(first, again);
        assert_eq!(faces.len(), 1);
        assert_eq!(faces.lookup(&FaceKey::from([0, 2])), Some(first));
        assert_eq!(faces.containing(VertexId(2)), vec![first]);
        assert!(faces.containing(VertexId(1)).is_empty());

        faces.remove(first).unwrap();
        assert!(faces.is_empty());
        assert!(faces.lookup(&FaceKey::from([0, 2])).is_none());
    }
}
