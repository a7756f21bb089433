//! # Vertex and Face Model
//!
//! The data a coverage network is made of: vertices carrying vector
//! inventories, and faces over vertex sets with cached common
//! neighborhoods and spans.
//!
//! Design rule: no arena or registry here. Faces read vertices through
//! [`VertexSource`], so they can be built against a network or any other
//! container of vertices.

pub mod face;
pub mod vertex;

pub use face::{Face, FaceId, FaceKey};
pub use vertex::{Position, Vertex, VertexId};

use crate::gf2::Dimension;
use crate::Result;

/// Read access to vertices by id.
pub trait VertexSource {
    /// Ambient dimension shared by every vertex.
    fn dimension(&self) -> Dimension;

    /// Look up a vertex. Unknown or removed ids give `Error::NotFound`.
    fn vertex(&self, id: VertexId) -> Result<&Vertex>;
}
