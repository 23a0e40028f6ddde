//! Level-of-detail (LoD) metadata
//!
//! A [`Lod`] groups consecutive rows of a tensor into sequences. Detection
//! models use it to record which image each region of interest belongs to:
//! rows `offsets[i]..offsets[i + 1]` belong to image `i`.

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::{Result, TensorError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(try_from = "RawLod"))]
pub struct Lod {
    offsets: Vec<usize>,
}

/// Unchecked wire form of [`Lod`]
#[cfg(feature = "serialize")]
#[derive(Deserialize)]
struct RawLod {
    offsets: Vec<usize>,
}

#[cfg(feature = "serialize")]
impl TryFrom<RawLod> for Lod {
    type Error = TensorError;

    fn try_from(raw: RawLod) -> Result<Self> {
        Self::from_offsets(raw.offsets)
    }
}

impl Lod {
    /// Build from offsets. They must start at 0 and be non-decreasing.
    pub fn from_offsets(offsets: Vec<usize>) -> Result<Self> {
        Self::check_offsets(&offsets)?;
        Ok(Self { offsets })
    }

    /// Re-run the offset checks of [`from_offsets`](Self::from_offsets)
    pub fn validate(&self) -> Result<()> {
        Self::check_offsets(&self.offsets)
    }

    fn check_offsets(offsets: &[usize]) -> Result<()> {
        if offsets.first() != Some(&0) {
            return Err(TensorError::invalid_argument_op(
                "lod",
                &format!("offsets must start at 0, got {offsets:?}"),
            ));
        }
        if offsets.windows(2).any(|w| w[1] < w[0]) {
            return Err(TensorError::invalid_argument_op(
                "lod",
                &format!("offsets must be non-decreasing, got {offsets:?}"),
            ));
        }
        Ok(())
    }

    /// Build from per-sequence lengths
    pub fn from_lengths(lengths: &[usize]) -> Self {
        let mut offsets = Vec::with_capacity(lengths.len() + 1);
        offsets.push(0);
        let mut total = 0;
        for &len in lengths {
            total += len;
            offsets.push(total);
        }
        Self { offsets }
    }

    /// A single sequence covering `rows` rows
    pub fn single(rows: usize) -> Self {
        Self::from_lengths(&[rows])
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn num_sequences(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Total number of rows covered
    pub fn total(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    pub fn lengths(&self) -> Vec<usize> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    pub fn sequence_range(&self, sequence: usize) -> Option<std::ops::Range<usize>> {
        if sequence >= self.num_sequences() {
            return None;
        }
        Some(self.offsets[sequence]..self.offsets[sequence + 1])
    }

    /// Sequence index owning `row`
    pub fn sequence_of(&self, row: usize) -> Option<usize> {
        if row >= self.total() {
            return None;
        }
        // First offset strictly greater than row, minus one
        let upper = self.offsets.partition_point(|&o| o <= row);
        Some(upper - 1)
    }

    /// Sequence index for every row, in row order
    pub fn sequence_ids(&self) -> Vec<usize> {
        let mut ids = Vec::with_capacity(self.total());
        for (seq, len) in self.lengths().into_iter().enumerate() {
            ids.extend(std::iter::repeat(seq).take(len));
        }
        ids
    }
}
