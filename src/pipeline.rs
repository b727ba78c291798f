//! End-to-end preparation: records in, padded id matrices, answer spans and an
//! embedding matrix out.

use std::path::{Path, PathBuf};

use candle_core::{Device, Tensor};

use crate::align::{SpanAligner, SpanIndex};
use crate::config::{FailurePolicy, PipelineConfig};
use crate::embedding::{Embedding, EmbeddingMatrix};
use crate::error::{AlignError, Error, Result};
use crate::records::{Record, load_squad};
use crate::sequence::{EncodedSequence, SequenceEncoder};
use crate::tokenizer::Tokenize;
use crate::vectors::PretrainedVectors;
use crate::vocab::Vocabulary;

/// Input files for a run. The vocabulary comes from `vocabulary` when set,
/// otherwise it is fitted on `corpus`.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub squad: PathBuf,
    pub corpus: Option<PathBuf>,
    pub vocabulary: Option<PathBuf>,
    pub vectors: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedExample {
    pub id: String,
    pub context: EncodedSequence,
    pub question: EncodedSequence,
    pub span: SpanIndex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub id: String,
    pub reason: AlignError,
}

#[derive(Debug, Clone)]
pub struct PreparedDataset {
    examples: Vec<PreparedExample>,
    skipped: Vec<SkippedRecord>,
    context_len: usize,
    question_len: usize,
}

impl PreparedDataset {
    pub fn examples(&self) -> &[PreparedExample] {
        &self.examples
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn context_rows(&self) -> Vec<&[u32]> {
        self.examples.iter().map(|e| e.context.ids()).collect()
    }

    pub fn question_rows(&self) -> Vec<&[u32]> {
        self.examples.iter().map(|e| e.question.ids()).collect()
    }

    pub fn spans(&self) -> Vec<SpanIndex> {
        self.examples.iter().map(|e| e.span).collect()
    }

    /// `(examples, context_len)` u32 tensor.
    pub fn context_tensor(&self, device: &Device) -> Result<Tensor> {
        let flat: Vec<u32> = self
            .examples
            .iter()
            .flat_map(|e| e.context.ids().iter().copied())
            .collect();
        Ok(Tensor::from_vec(flat, (self.len(), self.context_len), device)?)
    }

    /// `(examples, question_len)` u32 tensor.
    pub fn question_tensor(&self, device: &Device) -> Result<Tensor> {
        let flat: Vec<u32> = self
            .examples
            .iter()
            .flat_map(|e| e.question.ids().iter().copied())
            .collect();
        Ok(Tensor::from_vec(flat, (self.len(), self.question_len), device)?)
    }

    /// `(examples, 2)` u32 tensor of `[start, end]` rows.
    pub fn span_tensor(&self, device: &Device) -> Result<Tensor> {
        let flat: Vec<u32> = self
            .examples
            .iter()
            .flat_map(|e| [e.span.start as u32, e.span.end as u32])
            .collect();
        Ok(Tensor::from_vec(flat, (self.len(), 2), device)?)
    }
}

pub struct PipelineOutput {
    pub vocabulary: Vocabulary,
    pub dataset: PreparedDataset,
    pub embedding: EmbeddingMatrix,
}

impl PipelineOutput {
    /// `(examples, context_len, dim)` embedded contexts.
    pub fn context_embeddings(&self, device: &Device) -> Result<Tensor> {
        let layer = Embedding::from_matrix(&self.embedding, device)?;
        Ok(layer.forward(&self.dataset.context_tensor(device)?)?)
    }

    /// `(examples, question_len, dim)` embedded questions.
    pub fn question_embeddings(&self, device: &Device) -> Result<Tensor> {
        let layer = Embedding::from_matrix(&self.embedding, device)?;
        Ok(layer.forward(&self.dataset.question_tensor(device)?)?)
    }
}

pub struct Pipeline<T> {
    config: PipelineConfig,
    tokenizer: T,
}

impl<T: Tokenize> Pipeline<T> {
    pub fn new(config: PipelineConfig, tokenizer: T) -> Result<Self> {
        config.validate()?;
        Ok(Pipeline { config, tokenizer })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage from files.
    pub fn run(&self, paths: &DataPaths) -> Result<PipelineOutput> {
        let records = load_squad(&paths.squad)?;
        let vocabulary = self.build_vocabulary(paths)?;
        let dataset = self.prepare(&records, &vocabulary)?;
        let embedding = self.build_embedding(&vocabulary, &paths.vectors)?;

        Ok(PipelineOutput {
            vocabulary,
            dataset,
            embedding,
        })
    }

    pub fn build_vocabulary(&self, paths: &DataPaths) -> Result<Vocabulary> {
        let PipelineConfig {
            max_word_num,
            lowercase,
            ..
        } = self.config;
        match (&paths.vocabulary, &paths.corpus) {
            (Some(saved), _) => Vocabulary::load(saved, max_word_num, lowercase),
            (None, Some(corpus)) => Vocabulary::fit_file(corpus, max_word_num, lowercase),
            (None, None) => Err(Error::InvalidConfig(
                "either a tokenized corpus or a saved vocabulary is required".into(),
            )),
        }
    }

    /// Streams the vector file, keeping only vocabulary words, and fills the matrix.
    pub fn build_embedding(
        &self,
        vocabulary: &Vocabulary,
        vectors: impl AsRef<Path>,
    ) -> Result<EmbeddingMatrix> {
        let dim = self.config.embedding_dim;
        let vectors = PretrainedVectors::load(vectors, dim, |word| vocabulary.contains(word))?;
        EmbeddingMatrix::build(vocabulary, &vectors, dim)
    }

    /// Encodes and aligns every record.
    ///
    /// A record that fails validation or alignment is either dropped and listed
    /// in [`PreparedDataset::skipped`] or ends the run, per `on_alignment_error`.
    pub fn prepare(&self, records: &[Record], vocabulary: &Vocabulary) -> Result<PreparedDataset> {
        let aligner = SpanAligner::new(&self.tokenizer).verify_spans(self.config.verify_spans);
        let context_encoder = self.config.context_encoder();
        let question_encoder = self.config.question_encoder();

        let mut examples = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();

        for record in records {
            let prepared = self.prepare_record(
                record,
                vocabulary,
                &aligner,
                &context_encoder,
                &question_encoder,
            );
            match prepared {
                Ok(example) => examples.push(example),
                Err(reason) => match self.config.on_alignment_error {
                    FailurePolicy::Abort => return Err(Error::record(&record.id, reason)),
                    FailurePolicy::Skip => {
                        tracing::warn!(id = %record.id, %reason, "skipping record");
                        skipped.push(SkippedRecord {
                            id: record.id.clone(),
                            reason,
                        });
                    }
                },
            }
        }

        tracing::info!(
            prepared = examples.len(),
            skipped = skipped.len(),
            "prepared records"
        );

        Ok(PreparedDataset {
            examples,
            skipped,
            context_len: context_encoder.max_len(),
            question_len: question_encoder.max_len(),
        })
    }

    fn prepare_record(
        &self,
        record: &Record,
        vocabulary: &Vocabulary,
        aligner: &SpanAligner<&T>,
        context_encoder: &SequenceEncoder,
        question_encoder: &SequenceEncoder,
    ) -> std::result::Result<PreparedExample, AlignError> {
        record.validate()?;

        let context_tokens = self.tokenizer.tokenize(&record.context);
        let context = context_encoder.encode(&vocabulary.encode(&context_tokens));
        let span = aligner.align(record, &context_tokens, &context)?;

        let question_tokens = self.tokenizer.tokenize(&record.question);
        let question = question_encoder.encode(&vocabulary.encode(&question_tokens));

        tracing::debug!(id = %record.id, start = span.start, end = span.end, "aligned");

        Ok(PreparedExample {
            id: record.id.clone(),
            context,
            question,
            span,
        })
    }
}
