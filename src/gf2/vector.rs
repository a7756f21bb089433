//! Dense bit-vector over GF(2).

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{Error, Result};

/// A vector over GF(2) of fixed length.
///
/// Bit `i` lives in word `i / 64` at position `i % 64`. Bits at or past
/// `len` are always zero, so derived equality and hashing are exact.
/// Dimensions up to 128 stay inline.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBitVector")]
pub struct BitVector {
    words: SmallVec<[u64; 2]>,
    len: usize,
}

/// Unchecked wire form of [`BitVector`].
#[derive(Deserialize)]
struct RawBitVector {
    words: SmallVec<[u64; 2]>,
    len: usize,
}

impl TryFrom<RawBitVector> for BitVector {
    type Error = Error;

    fn try_from(raw: RawBitVector) -> Result<Self> {
        let expected = raw.len.div_ceil(64);
        if raw.words.len() != expected {
            return Err(Error::InvariantViolation(format!(
                "bit-vector of length {} needs {expected} words, got {}",
                raw.len,
                raw.words.len()
            )));
        }
        let v = Self { words: raw.words, len: raw.len };
        let mut masked = v.clone();
        masked.mask_tail();
        if masked != v {
            return Err(Error::InvariantViolation(format!(
                "bit-vector of length {} has bits set past its length",
                v.len
            )));
        }
        Ok(v)
    }
}

impl BitVector {
    /// Zero vector of the given length.
    pub fn zeros(len: usize) -> Self {
        Self {
            words: SmallVec::from_elem(0, len.div_ceil(64)),
            len,
        }
    }

    /// Standard basis vector `e_index`.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn unit(len: usize, index: usize) -> Self {
        let mut v = Self::zeros(len);
        v.set(index);
        v
    }

    /// Vector with the listed bits set.
    ///
    /// # Panics
    /// Panics if any index is `>= len`.
    pub fn from_indices(len: usize, indices: &[usize]) -> Self {
        let mut v = Self::zeros(len);
        for &i in indices {
            v.set(i);
        }
        v
    }

    /// Vector from a sequence of bits; the length is the sequence length.
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        let bits: Vec<bool> = bits.into_iter().collect();
        let mut v = Self::zeros(bits.len());
        for (i, b) in bits.into_iter().enumerate() {
            if b {
                v.set(i);
            }
        }
        v
    }

    /// Uniformly random vector (the zero vector included).
    pub fn random<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        let mut v = Self::zeros(len);
        for w in v.words.iter_mut() {
            *w = rng.next_u64();
        }
        v.mask_tail();
        v
    }

    /// Uniformly random nonzero vector. Redraws until a nonzero vector
    /// comes up, so `len` must be at least 1.
    ///
    /// # Panics
    /// Panics if `len == 0`.
    pub fn random_nonzero<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        assert!(len > 0, "no nonzero vectors of length 0");
        loop {
            let v = Self::random(len, rng);
            if !v.is_zero() {
                return v;
            }
        }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// # Panics
    /// Panics if `i >= self.len()`.
    pub fn get(&self, i: usize) -> bool {
        assert!(i < self.len, "bit index {i} out of range (len={})", self.len);
        (self.words[i / 64] >> (i % 64)) & 1 == 1
    }

    /// # Panics
    /// Panics if `i >= self.len()`.
    pub fn set(&mut self, i: usize) {
        assert!(i < self.len, "bit index {i} out of range (len={})", self.len);
        self.words[i / 64] |= 1u64 << (i % 64);
    }

    /// # Panics
    /// Panics if `i >= self.len()`.
    pub fn clear_bit(&mut self, i: usize) {
        assert!(i < self.len, "bit index {i} out of range (len={})", self.len);
        self.words[i / 64] &= !(1u64 << (i % 64));
    }

    /// # Panics
    /// Panics if `i >= self.len()`.
    pub fn flip(&mut self, i: usize) {
        assert!(i < self.len, "bit index {i} out of range (len={})", self.len);
        self.words[i / 64] ^= 1u64 << (i % 64);
    }

    /// Zero every bit.
    pub fn clear(&mut self) {
        for w in self.words.iter_mut() {
            *w = 0;
        }
    }

    /// Addition in GF(2).
    ///
    /// # Panics
    /// Panics if the lengths differ.
    pub fn xor_assign(&mut self, other: &Self) {
        assert_eq!(
            self.len, other.len,
            "xor_assign: length mismatch ({} vs {})",
            self.len, other.len
        );
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a ^= b;
        }
    }

    pub fn xor(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.xor_assign(other);
        out
    }

    /// Index of the lowest set bit, the leading column in echelon form.
    pub fn pivot(&self) -> Option<usize> {
        self.words.iter().enumerate().find_map(|(wi, &w)| {
            (w != 0).then(|| wi * 64 + w.trailing_zeros() as usize)
        })
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Indices of set bits, ascending.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.get(i))
    }

    /// `self` followed by `other`.
    pub fn concat(&self, other: &Self) -> Self {
        let mut out = Self::zeros(self.len + other.len);
        for i in self.ones() {
            out.set(i);
        }
        for i in other.ones() {
            out.set(self.len + i);
        }
        out
    }

    /// Bits `start..end` as a new vector.
    ///
    /// # Panics
    /// Panics if the range is out of bounds or reversed.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        assert!(start <= end && end <= self.len, "slice {start}..{end} out of range (len={})", self.len);
        let mut out = Self::zeros(end - start);
        for i in start..end {
            if self.get(i) {
                out.set(i - start);
            }
        }
        out
    }

    fn mask_tail(&mut self) {
        let rem = self.len % 64;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len {
            f.write_str(if self.get(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVector({}, [{}])", self.len, self)
    }
}
