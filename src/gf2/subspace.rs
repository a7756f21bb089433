//! Subspaces of GF(2)^D held in reduced row-echelon form.
//!
//! A `Subspace` doubles as the incremental echelon accumulator used by
//! vertices and faces: `insert` reduces a vector against the current
//! basis and keeps the basis fully reduced, so two subspaces are equal
//! exactly when their bases are equal.

use serde::{Deserialize, Serialize};

use super::{BitMatrix, BitVector};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSubspace")]
pub struct Subspace {
    dim: usize,
    /// Basis rows sorted by pivot; every pivot column is zero in all other rows.
    rows: Vec<BitVector>,
    pivots: Vec<usize>,
}

#[derive(Deserialize)]
struct RawSubspace {
    dim: usize,
    rows: Vec<BitVector>,
    pivots: Vec<usize>,
}

impl TryFrom<RawSubspace> for Subspace {
    type Error = Error;

    /// Accepts only the canonical reduced basis, which is what `span`
    /// rebuilds from the same rows.
    fn try_from(raw: RawSubspace) -> Result<Self> {
        let s = Self::span(raw.dim, &raw.rows)?;
        if s.rows != raw.rows || s.pivots != raw.pivots {
            return Err(Error::InvariantViolation(
                "subspace basis is not in reduced row-echelon form".into(),
            ));
        }
        Ok(s)
    }
}

impl Subspace {
    /// `{0}` inside GF(2)^dim.
    pub fn zero(dim: usize) -> Self {
        Self { dim, rows: Vec::new(), pivots: Vec::new() }
    }

    /// All of GF(2)^dim.
    pub fn full(dim: usize) -> Self {
        Self {
            dim,
            rows: (0..dim).map(|i| BitVector::unit(dim, i)).collect(),
            pivots: (0..dim).collect(),
        }
    }

    /// Span of a set of generators.
    pub fn span<'a>(dim: usize, generators: impl IntoIterator<Item = &'a BitVector>) -> Result<Self> {
        let mut s = Self::zero(dim);
        for v in generators {
            s.insert(v)?;
        }
        Ok(s)
    }

    /// Row space of a matrix.
    pub fn from_matrix(m: &BitMatrix) -> Result<Self> {
        Self::span(m.ncols(), m.rows())
    }

    /// Ambient dimension D.
    pub fn ambient_dim(&self) -> usize {
        self.dim
    }

    pub fn rank(&self) -> usize {
        self.rows.len()
    }

    pub fn is_zero(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() == self.dim
    }

    /// Reduced basis rows, sorted by pivot column.
    pub fn basis(&self) -> &[BitVector] {
        &self.rows
    }

    /// Basis as a `rank x D` matrix; the zero subspace gives `0 x D`.
    pub fn to_matrix(&self) -> BitMatrix {
        BitMatrix::from_rows_unchecked(self.dim, self.rows.clone())
    }

    /// Residue of `v` after reduction against the basis; zero iff `v` is in the span.
    fn reduce(&self, v: &BitVector) -> BitVector {
        let mut r = v.clone();
        for (row, &p) in self.rows.iter().zip(&self.pivots) {
            if r.get(p) {
                r.xor_assign(row);
            }
        }
        r
    }

    fn check_len(&self, v: &BitVector, context: &str) -> Result<()> {
        if v.len() != self.dim {
            return Err(Error::DimensionMismatch {
                context: context.into(),
                expected: self.dim,
                got: v.len(),
            });
        }
        Ok(())
    }

    fn check_dim(&self, other: &Subspace, context: &str) -> Result<()> {
        if other.dim != self.dim {
            return Err(Error::DimensionMismatch {
                context: context.into(),
                expected: self.dim,
                got: other.dim,
            });
        }
        Ok(())
    }

    /// Add `v` to the spanning set. Returns `true` if the rank grew.
    pub fn insert(&mut self, v: &BitVector) -> Result<bool> {
        self.check_len(v, "Subspace::insert")?;
        if self.is_full() {
            return Ok(false);
        }
        let r = self.reduce(v);
        let Some(p) = r.pivot() else {
            return Ok(false);
        };
        for row in self.rows.iter_mut() {
            if row.get(p) {
                row.xor_assign(&r);
            }
        }
        let pos = self.pivots.partition_point(|&q| q < p);
        self.rows.insert(pos, r);
        self.pivots.insert(pos, p);
        Ok(true)
    }

    /// Span membership.
    pub fn contains(&self, v: &BitVector) -> Result<bool> {
        self.check_len(v, "Subspace::contains")?;
        Ok(self.reduce(v).is_zero())
    }

    /// `other ⊆ self`.
    pub fn contains_subspace(&self, other: &Subspace) -> Result<bool> {
        self.check_dim(other, "Subspace::contains_subspace")?;
        Ok(other.rows.iter().all(|v| self.reduce(v).is_zero()))
    }

    /// `self + other`.
    pub fn sum(&self, other: &Subspace) -> Result<Subspace> {
        self.check_dim(other, "Subspace::sum")?;
        let mut out = self.clone();
        for v in &other.rows {
            out.insert(v)?;
        }
        Ok(out)
    }

    /// `self ∩ other`.
    ///
    /// Zassenhaus: echelonize the rows `[a | a]` for a in A and `[b | 0]`
    /// for b in B over 2D columns. Rows whose left half vanishes carry a
    /// basis of A∩B in their right half; the remaining rows span A+B. The
    /// count is checked against `dim(A) + dim(B) - dim(A+B)`.
    pub fn intersect(&self, other: &Subspace) -> Result<Subspace> {
        self.check_dim(other, "Subspace::intersect")?;
        if self.is_zero() || other.is_zero() {
            return Ok(Subspace::zero(self.dim));
        }
        if self.is_full() {
            return Ok(other.clone());
        }
        if other.is_full() {
            return Ok(self.clone());
        }

        let d = self.dim;
        let zeros = BitVector::zeros(d);
        let mut m = BitMatrix::empty(2 * d);
        for a in &self.rows {
            m.push_row(a.concat(a))?;
        }
        for b in &other.rows {
            m.push_row(b.concat(&zeros))?;
        }
        let rank = m.echelonize();

        let mut meet = Subspace::zero(d);
        let mut sum_rank = 0;
        for row in &m.rows()[..rank] {
            if row.slice(0, d).is_zero() {
                meet.insert(&row.slice(d, 2 * d))?;
            } else {
                sum_rank += 1;
            }
        }

        let expected = (self.rank() + other.rank()).checked_sub(sum_rank).ok_or_else(|| {
            Error::InvariantViolation(format!(
                "dim(A+B)={sum_rank} exceeds dim(A)+dim(B)={}",
                self.rank() + other.rank()
            ))
        })?;
        if meet.rank() != expected {
            return Err(Error::InvariantViolation(format!(
                "intersection has rank {} but dim(A)={} + dim(B)={} - dim(A+B)={} = {expected}",
                meet.rank(),
                self.rank(),
                other.rank(),
                sum_rank,
            )));
        }
        Ok(meet)
    }
}
