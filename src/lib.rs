pub mod align;
pub mod config;
pub mod embedding;
pub mod error;
pub mod file_loader;
pub mod pipeline;
pub mod records;
pub mod sequence;
pub mod tokenizer;
pub mod vectors;
pub mod vocab;

pub use align::{SpanAligner, SpanIndex, TokenSpan};
pub use config::{FailurePolicy, PipelineConfig, SequenceLengths};
pub use embedding::{Embedding, EmbeddingMatrix};
pub use error::{AlignError, Error, Result};
pub use pipeline::{
    DataPaths, Pipeline, PipelineOutput, PreparedDataset, PreparedExample, SkippedRecord,
};
pub use records::{Record, load_squad};
pub use sequence::{EncodedSequence, PadSide, SequenceEncoder, Truncation};
pub use tokenizer::{Tokenize, WhitespaceTokenizer, WordTokenizer};
pub use vectors::{PretrainedVectors, VectorLookup};
pub use vocab::{PAD_ID, UNK_ID, UNK_TOKEN, Vocabulary};
