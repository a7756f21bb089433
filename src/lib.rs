//! # coverage-rs — GF(2) Coverage Complexes for Proximity Networks
//!
//! Vertices of a proximity graph carry inventories of vectors over
//! GF(2)^D. A face is *covered* by a target subspace U when the
//! inventories of its vertices and their common neighbors span U.
//!
//! ## Design Principles
//!
//! 1. **Explicit dimension**: `Dimension` is fixed per experiment and threaded
//!    through every constructor
//! 2. **Arena, not pointers**: vertices and faces are addressed by `VertexId`
//!    and `FaceId`; adjacency is stored as id sets
//! 3. **Recompute, never patch**: any neighbor or inventory change recomputes
//!    every registered face that reads the vertex
//! 4. **Injected randomness**: all random draws take the caller's RNG
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coverage_rs::{BitMatrix, Experiment, ExperimentConfig};
//!
//! # fn example() -> coverage_rs::Result<()> {
//! let mut exp = Experiment::new(ExperimentConfig::new(2, 1.0).with_seed(7))?;
//! for x in [-0.9, 0.0, 0.9] {
//!     exp.add_point(x, 0.0)?;
//! }
//! exp.compute_neighbors()?;
//! exp.network_mut().seed_standard_basis()?;
//!
//! let bundle = exp.build_all(&BitMatrix::identity(2))?;
//! println!("coverage complex has {} faces", bundle.coverage.len());
//!
//! let cover = exp.vs_cover()?;
//! println!("maximal cover has rank {}", cover.rank());
//!
//! exp.drain_until_stable(10)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | `gf2` | bit-vectors, bit-matrices, echelon form, subspace intersection |
//! | `model` | vertices, faces, `VertexSource` |
//! | `network` | vertex/face arena with symmetric adjacency |
//! | `complex` | proximity, coverage and filtered complexes |
//! | `cover` | maximal covering subspace |
//! | `drainage` | greedy inventory reduction |
//! | `export` | face-stream and inventory dumps |
//! | `config` | `ExperimentConfig` |

// ============================================================================
// Modules
// ============================================================================

pub mod complex;
pub mod config;
pub mod cover;
pub mod drainage;
pub mod export;
pub mod gf2;
pub mod model;
pub mod network;

// ============================================================================
// Re-exports: Linear algebra
// ============================================================================

pub use gf2::{BitMatrix, BitVector, Dimension, Subspace};

// ============================================================================
// Re-exports: Model and network
// ============================================================================

pub use model::{Face, FaceId, FaceKey, Position, Vertex, VertexId, VertexSource};
pub use network::Network;

// ============================================================================
// Re-exports: Algorithms
// ============================================================================

pub use complex::{is_covered, Complex, ComplexBundle, CoverageBuilder, FilteredComplex, Filtration};
pub use config::ExperimentConfig;
pub use cover::{vs_cover, CoverComplex};
pub use drainage::{DrainOutcome, DrainageOptions, PassReport, RowOutcome};

// ============================================================================
// Top-level Experiment handle
// ============================================================================

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// One coverage experiment: configuration, network, RNG and the most
/// recently built complexes.
pub struct Experiment {
    config: ExperimentConfig,
    network: Network,
    rng: StdRng,
    complexes: Option<ComplexBundle>,
}

impl Experiment {
    /// Validate `config` and create an empty network. The RNG is seeded
    /// from `config.seed`, or from the OS when unset.
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        let dimension = config.dimension()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        debug!(dimension = %dimension, radius = config.radius, seed = ?config.seed, "experiment created");
        Ok(Self {
            config,
            network: Network::new(dimension),
            rng,
            complexes: None,
        })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn dimension(&self) -> Dimension {
        self.network.dimension()
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn add_point(&mut self, x: f64, y: f64) -> Result<VertexId> {
        self.network.add_vertex(Position::new(x, y))
    }

    /// Rebuild adjacency with the configured radius.
    pub fn compute_neighbors(&mut self) -> Result<usize> {
        self.network.compute_neighbors(self.config.radius)
    }

    /// Add `count` random nonzero vectors to vertex `id`; returns the rank gained.
    pub fn add_random_vectors(&mut self, id: VertexId, count: usize) -> Result<usize> {
        let mut delta = 0;
        for _ in 0..count {
            delta += self.network.add_random_vector(id, &mut self.rng)?;
        }
        Ok(delta)
    }

    /// Build every complex for `target` and record the maximal faces.
    pub fn build_all(&mut self, target: &BitMatrix) -> Result<&ComplexBundle> {
        let bundle = self.config.builder().build_all(&mut self.network, target)?;
        let bundle: &ComplexBundle = self.complexes.insert(bundle);
        Ok(bundle)
    }

    /// Complexes from the last `build_all`.
    pub fn complexes(&self) -> Result<&ComplexBundle> {
        self.complexes
            .as_ref()
            .ok_or_else(|| Error::ComplexNotBuilt("no complexes built yet".into()))
    }

    /// Maximal cover over the recorded maximal faces.
    pub fn vs_cover(&self) -> Result<Subspace> {
        self.complexes()?;
        self.network.maximal_cover()
    }

    pub fn drain_vertex(&mut self, id: VertexId) -> Result<DrainOutcome> {
        drainage::drain_vertex(&mut self.network, id, &self.config.drainage)
    }

    pub fn drain_pass(&mut self) -> Result<PassReport> {
        drainage::drain_pass(&mut self.network, &self.config.drainage)
    }

    pub fn drain_until_stable(&mut self, max_passes: usize) -> Result<Vec<PassReport>> {
        drainage::drain_until_stable(&mut self.network, &self.config.drainage, max_passes)
    }

    /// Write the filtered stream of the last build as text.
    pub fn export_face_stream(&self, writer: &mut dyn std::io::Write) -> Result<()> {
        export::export_face_stream(&self.complexes()?.filtered, writer)
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Dimension mismatch in {context}: expected {expected}, got {got}")]
    DimensionMismatch { context: String, expected: usize, got: usize },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Complex not built: {0}")]
    ComplexNotBuilt(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
