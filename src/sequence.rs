use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::vocab::PAD_ID;

/// Which end of a short sequence receives the padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadSide {
    #[default]
    Left,
    Right,
}

/// Which end of a long sequence is cut off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Truncation {
    /// Drop leading tokens, keep the tail.
    #[default]
    Pre,
    /// Drop trailing tokens, keep the head.
    Post,
}

#[derive(Debug, Clone, Copy)]
pub struct SequenceEncoder {
    max_len: usize,
    padding: PadSide,
    truncation: Truncation,
}

impl SequenceEncoder {
    pub fn new(max_len: usize, padding: PadSide, truncation: Truncation) -> Self {
        SequenceEncoder {
            max_len,
            padding,
            truncation,
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Truncates or pads `ids` to exactly `max_len` entries.
    pub fn encode(&self, ids: &[u32]) -> EncodedSequence {
        debug_assert!(!ids.contains(&PAD_ID), "token ids must not use the pad sentinel");

        let kept = ids.len().min(self.max_len);
        let window_start = match self.truncation {
            Truncation::Pre => ids.len() - kept,
            Truncation::Post => 0,
        };
        let window = &ids[window_start..window_start + kept];

        let mut padded = Vec::with_capacity(self.max_len);
        match self.padding {
            PadSide::Left => {
                padded.resize(self.max_len - kept, PAD_ID);
                padded.extend_from_slice(window);
            }
            PadSide::Right => {
                padded.extend_from_slice(window);
                padded.resize(self.max_len, PAD_ID);
            }
        }

        EncodedSequence {
            ids: padded,
            window_start,
            kept,
        }
    }
}

/// A fixed-length id sequence plus the raw token window it was cut from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSequence {
    ids: Vec<u32>,
    window_start: usize,
    kept: usize,
}

impl EncodedSequence {
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn into_ids(self) -> Vec<u32> {
        self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of pad slots in front of the first real token.
    pub fn leading_pad_count(&self) -> usize {
        leading_pad_count(&self.ids)
    }

    /// Raw token indices that survived truncation.
    pub fn window(&self) -> Range<usize> {
        self.window_start..self.window_start + self.kept
    }

    /// Maps an index into the unpadded token sequence onto this sequence.
    /// `None` when that token was truncated away.
    pub fn position(&self, raw_index: usize) -> Option<usize> {
        if !self.window().contains(&raw_index) {
            return None;
        }
        Some(raw_index - self.window_start + self.leading_pad_count())
    }
}

/// Counts pad sentinels at the head of `ids`.
pub fn leading_pad_count(ids: &[u32]) -> usize {
    ids.iter().take_while(|&&id| id == PAD_ID).count()
}
