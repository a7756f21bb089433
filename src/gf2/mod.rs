//! # GF(2) Linear Algebra
//!
//! Fixed-dimension bit-vectors and bit-matrices over the two-element
//! field, echelon reduction, span membership, and subspace intersection.
//!
//! Design rule: everything here is pure data plus deterministic
//! arithmetic. The only randomness is `BitVector::random*`, which takes
//! the caller's RNG.

pub mod matrix;
pub mod subspace;
pub mod vector;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub use matrix::BitMatrix;
pub use subspace::Subspace;
pub use vector::BitVector;

/// Dimension D of the ambient vector space GF(2)^D.
///
/// Fixed once per experiment and threaded through every vertex and face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Dimension(usize);

impl Dimension {
    pub fn new(d: usize) -> Result<Self> {
        if d == 0 {
            return Err(Error::ConfigError("vector space dimension must be at least 1".into()));
        }
        Ok(Self(d))
    }

    pub const fn get(self) -> usize {
        self.0
    }

    /// `e_0 .. e_{D-1}`.
    pub fn standard_basis(self) -> Vec<BitVector> {
        (0..self.0).map(|i| BitVector::unit(self.0, i)).collect()
    }

    /// Fail with `DimensionMismatch` unless `got == D`.
    pub fn check(self, got: usize, context: impl Into<String>) -> Result<()> {
        if got != self.0 {
            return Err(Error::DimensionMismatch {
                context: context.into(),
                expected: self.0,
                got,
            });
        }
        Ok(())
    }
}

impl TryFrom<usize> for Dimension {
    type Error = Error;

    fn try_from(d: usize) -> Result<Self> {
        Self::new(d)
    }
}

impl From<Dimension> for usize {
    fn from(d: Dimension) -> usize {
        d.0
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
