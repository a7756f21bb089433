//! Row-major bit-matrix over GF(2).
//!
//! Rows are `BitVector`s of a common length `ncols`. A matrix is the
//! usual carrier for a spanning set: one generator per row.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::BitVector;
use crate::{Error, Result};

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBitMatrix")]
pub struct BitMatrix {
    rows: Vec<BitVector>,
    ncols: usize,
}

#[derive(Deserialize)]
struct RawBitMatrix {
    rows: Vec<BitVector>,
    ncols: usize,
}

impl TryFrom<RawBitMatrix> for BitMatrix {
    type Error = Error;

    fn try_from(raw: RawBitMatrix) -> Result<Self> {
        Self::from_rows(raw.ncols, raw.rows)
    }
}

impl BitMatrix {
    /// `nrows x ncols` zero matrix.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            rows: vec![BitVector::zeros(ncols); nrows],
            ncols,
        }
    }

    /// Matrix with no rows; spans the zero subspace of GF(2)^ncols.
    pub fn empty(ncols: usize) -> Self {
        Self { rows: Vec::new(), ncols }
    }

    /// `n x n` identity; its rows are the standard basis.
    pub fn identity(n: usize) -> Self {
        Self {
            rows: (0..n).map(|i| BitVector::unit(n, i)).collect(),
            ncols: n,
        }
    }

    /// Build from rows, checking every row has length `ncols`.
    pub fn from_rows(ncols: usize, rows: impl IntoIterator<Item = BitVector>) -> Result<Self> {
        let mut m = Self::empty(ncols);
        for row in rows {
            m.push_row(row)?;
        }
        Ok(m)
    }

    /// Caller guarantees every row has length `ncols`.
    pub(crate) fn from_rows_unchecked(ncols: usize, rows: Vec<BitVector>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == ncols));
        Self { rows, ncols }
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// # Panics
    /// Panics if `i >= self.nrows()`.
    pub fn row(&self, i: usize) -> &BitVector {
        &self.rows[i]
    }

    pub fn rows(&self) -> &[BitVector] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<BitVector> {
        self.rows
    }

    /// Append a row.
    pub fn push_row(&mut self, row: BitVector) -> Result<()> {
        if row.len() != self.ncols {
            return Err(Error::DimensionMismatch {
                context: "BitMatrix::push_row".into(),
                expected: self.ncols,
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Overwrite row `dst` with row `src_row` of `src`.
    ///
    /// # Panics
    /// Panics if either row index is out of range.
    pub fn copy_row(&mut self, dst: usize, src: &BitMatrix, src_row: usize) -> Result<()> {
        if src.ncols != self.ncols {
            return Err(Error::DimensionMismatch {
                context: "BitMatrix::copy_row".into(),
                expected: self.ncols,
                got: src.ncols,
            });
        }
        self.rows[dst] = src.rows[src_row].clone();
        Ok(())
    }

    /// Overwrite row `i` with `row`.
    ///
    /// # Panics
    /// Panics if `i >= self.nrows()`.
    pub fn set_row(&mut self, i: usize, row: BitVector) -> Result<()> {
        if row.len() != self.ncols {
            return Err(Error::DimensionMismatch {
                context: "BitMatrix::set_row".into(),
                expected: self.ncols,
                got: row.len(),
            });
        }
        self.rows[i] = row;
        Ok(())
    }

    /// `rows[dest] ^= rows[source]`. With `source == dest` the row becomes zero.
    ///
    /// # Panics
    /// Panics if either index is out of range.
    pub fn row_add(&mut self, source: usize, dest: usize) {
        if source == dest {
            self.rows[dest].clear();
            return;
        }
        let src = self.rows[source].clone();
        self.rows[dest].xor_assign(&src);
    }

    /// # Panics
    /// Panics if `i >= self.nrows()`.
    pub fn clear_row(&mut self, i: usize) {
        self.rows[i].clear();
    }

    /// Rows of `top` followed by rows of `bottom`.
    pub fn stack(top: &BitMatrix, bottom: &BitMatrix) -> Result<BitMatrix> {
        if top.ncols != bottom.ncols {
            return Err(Error::DimensionMismatch {
                context: "BitMatrix::stack".into(),
                expected: top.ncols,
                got: bottom.ncols,
            });
        }
        let mut rows = Vec::with_capacity(top.nrows() + bottom.nrows());
        rows.extend(top.rows.iter().cloned());
        rows.extend(bottom.rows.iter().cloned());
        Ok(Self { rows, ncols: top.ncols })
    }

    pub fn is_zero(&self) -> bool {
        self.rows.iter().all(BitVector::is_zero)
    }

    /// Reduce in place to reduced row-echelon form and return the rank.
    ///
    /// Pivot columns are chosen left to right, nonzero rows end up on top
    /// ordered by pivot, zero rows at the bottom. The result depends only
    /// on the row space, so equal spans give equal reduced matrices.
    pub fn echelonize(&mut self) -> usize {
        let mut rank = 0;
        for col in 0..self.ncols {
            if rank == self.rows.len() {
                break;
            }
            let Some(p) = (rank..self.rows.len()).find(|&r| self.rows[r].get(col)) else {
                continue;
            };
            self.rows.swap(rank, p);
            let pivot = self.rows[rank].clone();
            for (r, row) in self.rows.iter_mut().enumerate() {
                if r != rank && row.get(col) {
                    row.xor_assign(&pivot);
                }
            }
            rank += 1;
        }
        rank
    }

    /// Rank without touching `self`.
    pub fn rank(&self) -> usize {
        self.clone().echelonize()
    }

    /// Drop all zero rows, keeping the order of the rest.
    pub fn without_zero_rows(&self) -> BitMatrix {
        Self {
            rows: self.rows.iter().filter(|r| !r.is_zero()).cloned().collect(),
            ncols: self.ncols,
        }
    }
}

impl fmt::Display for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "[{row}]")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitMatrix({}x{}, [", self.nrows(), self.ncols)?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{row}")?;
        }
        f.write_str("])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn m(ncols: usize, rows: &[&[usize]]) -> BitMatrix {
        BitMatrix::from_rows(ncols, rows.iter().map(|r| BitVector::from_indices(ncols, r))).unwrap()
    }

    #[test]
    fn identity_has_full_rank() {
        assert_eq!(BitMatrix::identity(7).rank(), 7);
        assert_eq!(BitMatrix::zeros(3, 7).rank(), 0);
    }

    #[test]
    fn echelonize_reduces_to_canonical_form() {
        let mut a = m(3, &[&[0, 1], &[1, 2], &[0, 2]]);
        let rank = a.echelonize();
        assert_eq!(rank, 2);
        assert_eq!(a, m(3, &[&[0, 2], &[1, 2], &[]]));

        // same span, different generators
        let mut b = m(3, &[&[1, 2], &[0, 1]]);
        b.echelonize();
        assert_eq!(b, m(3, &[&[0, 2], &[1, 2]]));
    }

    #[test]
    fn row_add_folds_source_into_dest() {
        let mut a = m(3, &[&[0], &[1]]);
        a.row_add(0, 1);
        assert_eq!(a.row(1), &BitVector::from_indices(3, &[0, 1]));
        a.row_add(1, 1);
        assert!(a.row(1).is_zero());
    }

    #[test]
    fn stack_checks_columns() {
        let a = BitMatrix::identity(2);
        let b = BitMatrix::identity(3);
        assert!(matches!(
            BitMatrix::stack(&a, &b),
            Err(Error::DimensionMismatch { expected: 2, got: 3, .. })
        ));
        let s = BitMatrix::stack(&a, &BitMatrix::zeros(1, 2)).unwrap();
        assert_eq!(s.nrows(), 3);
        assert_eq!(s.rank(), 2);
    }

    #[test]
    fn push_row_rejects_wrong_length() {
        let mut a = BitMatrix::empty(4);
        assert!(a.push_row(BitVector::zeros(5)).is_err());
        assert!(a.push_row(BitVector::zeros(4)).is_ok());
    }

    #[test]
    fn without_zero_rows_keeps_order() {
        let a = m(3, &[&[], &[2], &[], &[0]]);
        assert_eq!(a.without_zero_rows(), m(3, &[&[2], &[0]]));
    }

    #[test]
    fn deserialization_checks_row_lengths() {
        let m = BitMatrix::identity(3);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(serde_json::from_str::<BitMatrix>(&json).unwrap(), m);

        let ragged = r#"{"rows":[{"words":[1],"len":3},{"words":[1],"len":4}],"ncols":3}"#;
        assert!(serde_json::from_str::<BitMatrix>(ragged).is_err());
    }
}
