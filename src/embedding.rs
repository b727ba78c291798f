use candle_core::{Device, Tensor};

use crate::error::{Error, Result};
use crate::vectors::VectorLookup;
use crate::vocab::{UNK_ID, Vocabulary};

/// Dense `(vocab_size + 1, dim)` lookup table indexed by vocabulary id.
///
/// Row 0 belongs to the pad sentinel and is always zero. A vocabulary word
/// without a pretrained vector also gets a zero row and is counted in
/// [`EmbeddingMatrix::oov_count`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    data: Vec<f32>,
    rows: usize,
    dim: usize,
    oov: usize,
}

impl EmbeddingMatrix {
    pub fn build(vocab: &Vocabulary, vectors: &impl VectorLookup, dim: usize) -> Result<Self> {
        if vectors.dim() != dim {
            return Err(Error::InvalidConfig(format!(
                "embedding_dim is {dim} but the pretrained vectors have {} values",
                vectors.dim()
            )));
        }

        let rows = vocab.len() + 1;
        let mut data = vec![0f32; rows * dim];
        let mut oov = 0usize;

        for (word, id) in vocab.iter() {
            // the unknown token has no pretrained counterpart
            if id == UNK_ID {
                continue;
            }
            match vectors.lookup(word) {
                Some(vector) if vector.len() != dim => {
                    return Err(Error::DimensionMismatch {
                        word: word.to_string(),
                        line: 0,
                        expected: dim,
                        found: vector.len(),
                    });
                }
                Some(vector) => {
                    let offset = id as usize * dim;
                    data[offset..offset + dim].copy_from_slice(vector);
                }
                None => {
                    tracing::trace!(word, id, "no pretrained vector");
                    oov += 1;
                }
            }
        }

        tracing::info!(rows, dim, oov, "embedding matrix shape");

        Ok(EmbeddingMatrix {
            data,
            rows,
            dim,
            oov,
        })
    }

    /// `(rows, dim)`; rows is the vocabulary size plus the pad row.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.dim)
    }

    pub fn row(&self, id: u32) -> Option<&[f32]> {
        let id = id as usize;
        (id < self.rows).then(|| &self.data[id * self.dim..(id + 1) * self.dim])
    }

    /// Vocabulary words that had no pretrained vector.
    pub fn oov_count(&self) -> usize {
        self.oov
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        Ok(Tensor::from_slice(&self.data, (self.rows, self.dim), device)?)
    }
}

/// Frozen lookup over an [`EmbeddingMatrix`] living on a device.
pub struct Embedding {
    pub weights: Tensor,
}

impl Embedding {
    pub fn from_matrix(matrix: &EmbeddingMatrix, device: &Device) -> Result<Embedding> {
        Ok(Embedding {
            weights: matrix.to_tensor(device)?,
        })
    }

    /// Replaces every id with its row: `ids` of shape `(..)` become `(.., dim)`.
    /// Pad ids read the zero row.
    pub fn forward(&self, ids: &Tensor) -> candle_core::Result<Tensor> {
        let mut dims = ids.dims().to_vec();
        dims.push(self.weights.dim(1)?);
        self.weights.index_select(&ids.flatten_all()?, 0)?.reshape(dims)
    }
}
