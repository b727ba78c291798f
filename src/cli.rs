use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use squad_prep::{DataPaths, Pipeline, PipelineConfig, WordTokenizer};

/// Prepare SQuAD passages for a reading-comprehension model: padded id
/// matrices, token-level answer spans and a pretrained embedding matrix.
#[derive(Parser, Debug)]
#[command(name = "squad-prep", version, about)]
pub struct Cli {
    /// SQuAD v1.1 JSON file
    #[arg(long)]
    pub squad: PathBuf,

    /// Tokenized corpus, one document per line, used to fit the vocabulary
    #[arg(long, required_unless_present = "vocab")]
    pub corpus: Option<PathBuf>,

    /// Saved `<word> <id>` vocabulary to use instead of fitting one
    #[arg(long)]
    pub vocab: Option<PathBuf>,

    /// Pretrained word vectors, `<word> <f32> ...` per line
    #[arg(long)]
    pub vectors: PathBuf,

    /// JSON pipeline config; flags below override its fields
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub max_words: Option<usize>,

    #[arg(long)]
    pub embedding_dim: Option<usize>,

    #[arg(long)]
    pub context_len: Option<usize>,

    #[arg(long)]
    pub question_len: Option<usize>,

    /// Do not re-read aligned spans against the answer text
    #[arg(long)]
    pub no_verify: bool,

    /// Write the vocabulary used for this run
    #[arg(long)]
    pub save_vocab: Option<PathBuf>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let config = self.pipeline_config()?;
        tracing::debug!(?config, "pipeline config");

        let paths = DataPaths {
            squad: self.squad,
            corpus: self.corpus,
            vocabulary: self.vocab,
            vectors: self.vectors,
        };

        let pipeline = Pipeline::new(config, WordTokenizer::new())?;
        let output = pipeline.run(&paths)?;

        if let Some(path) = &self.save_vocab {
            let file = File::create(path)
                .with_context(|| format!("Cannot create '{}'", path.display()))?;
            output.vocabulary.write_to(BufWriter::new(file))?;
            tracing::info!(path = %path.display(), "vocabulary saved");
        }

        let (rows, dim) = output.embedding.shape();
        println!("records prepared:      {}", output.dataset.len());
        println!("records skipped:       {}", output.dataset.skipped().len());
        println!("vocabulary size:       {}", output.vocabulary.len());
        println!("embedding matrix:      {rows} x {dim}");
        println!("words without vectors: {}", output.embedding.oov_count());
        Ok(())
    }

    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_path(path)
                .with_context(|| format!("Cannot read config '{}'", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(max_words) = self.max_words {
            config.max_word_num = max_words;
        }
        if let Some(dim) = self.embedding_dim {
            config.embedding_dim = dim;
        }
        if let Some(len) = self.context_len {
            config.max_sequence_len.context = len;
        }
        if let Some(len) = self.question_len {
            config.max_sequence_len.question = len;
        }
        if self.no_verify {
            config.verify_spans = false;
        }

        config.validate()?;
        Ok(config)
    }
}
