use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::file_loader::load_file;
use crate::sequence::{PadSide, SequenceEncoder, Truncation};

/// What to do with a record whose answer cannot be aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Drop the record and keep going.
    #[default]
    Skip,
    /// Fail the whole run.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceLengths {
    pub context: usize,
    pub question: usize,
}

impl Default for SequenceLengths {
    fn default() -> Self {
        SequenceLengths {
            context: 300,
            question: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Largest vocabulary id handed out, `<unk>` included.
    pub max_word_num: usize,
    /// Width of the pretrained vectors.
    pub embedding_dim: usize,
    pub max_sequence_len: SequenceLengths,
    pub padding: PadSide,
    pub truncation: Truncation,
    pub lowercase: bool,
    /// Re-read every aligned span and compare it with the answer text.
    pub verify_spans: bool,
    pub on_alignment_error: FailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            max_word_num: 100_000,
            embedding_dim: 100,
            max_sequence_len: SequenceLengths::default(),
            padding: PadSide::default(),
            truncation: Truncation::default(),
            lowercase: true,
            verify_spans: true,
            on_alignment_error: FailurePolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON config; missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(&load_file(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.max_word_num == 0 {
            errors.push("max_word_num must be greater than 0");
        }
        if self.embedding_dim == 0 {
            errors.push("embedding_dim must be greater than 0");
        }
        if self.max_sequence_len.context == 0 {
            errors.push("max_sequence_len.context must be greater than 0");
        }
        if self.max_sequence_len.question == 0 {
            errors.push("max_sequence_len.question must be greater than 0");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfig(errors.join("; ")))
        }
    }

    pub fn context_encoder(&self) -> SequenceEncoder {
        SequenceEncoder::new(self.max_sequence_len.context, self.padding, self.truncation)
    }

    pub fn question_encoder(&self) -> SequenceEncoder {
        SequenceEncoder::new(self.max_sequence_len.question, self.padding, self.truncation)
    }
}
