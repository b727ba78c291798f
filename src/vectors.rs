//! Flat `<token> <value> ...` key-value files.
//!
//! The same layout carries two kinds of payload: a word-index vocabulary
//! (`<token> <index>`) and pretrained embeddings (`<token> <f32> <f32> ...`).
//! A line with exactly one value is an index entry, anything longer is a vector.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use crate::error::{Error, Result};
use crate::file_loader::read_lines;

#[derive(Debug, Clone, PartialEq)]
pub enum WordPair {
    Index(u32),
    Vector(Vec<f32>),
}

/// One parsed line, with its 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub struct WordEntry {
    pub line: usize,
    pub word: String,
    pub pair: WordPair,
}

/// Parses one line. Blank lines yield `None`.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<WordEntry>> {
    let line = line.trim_end();
    if line.is_empty() {
        return Ok(None);
    }

    let mut fields = line.split(' ');
    let word = fields.next().unwrap_or_default().to_string();
    let values: Vec<&str> = fields.collect();

    let pair = match values.as_slice() {
        [] => {
            return Err(Error::Parse {
                line: line_no,
                message: format!("{word:?} has no value"),
            });
        }
        [index] => WordPair::Index(index.parse().map_err(|_| Error::Parse {
            line: line_no,
            message: format!("{index:?} is not an integer index"),
        })?),
        floats => {
            let vector = floats
                .iter()
                .map(|v| {
                    v.parse::<f32>().map_err(|_| Error::Parse {
                        line: line_no,
                        message: format!("{v:?} is not a float"),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            WordPair::Vector(vector)
        }
    };

    Ok(Some(WordEntry {
        line: line_no,
        word,
        pair,
    }))
}

/// Streams word pairs from a reader, one line at a time.
pub struct WordPairReader<B: BufRead> {
    lines: Lines<B>,
    line_no: usize,
}

impl<B: BufRead> WordPairReader<B> {
    pub fn new(reader: B) -> Self {
        Self::from_lines(reader.lines())
    }

    pub fn from_lines(lines: Lines<B>) -> Self {
        WordPairReader { lines, line_no: 0 }
    }
}

impl WordPairReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_lines(read_lines(path)?))
    }
}

impl<B: BufRead> Iterator for WordPairReader<B> {
    type Item = Result<WordEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;

            match parse_line(&line, self.line_no) {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Lookup of a pretrained vector by word. `None` means the source has no
/// vector for that word.
pub trait VectorLookup {
    fn dim(&self) -> usize;
    fn lookup(&self, word: &str) -> Option<&[f32]>;
}

/// In-memory pretrained vectors of a fixed width.
#[derive(Debug, Clone, Default)]
pub struct PretrainedVectors {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl PretrainedVectors {
    pub fn new(dim: usize) -> Self {
        PretrainedVectors {
            dim,
            vectors: HashMap::new(),
        }
    }

    /// Streams a vector file, keeping only words accepted by `keep`.
    ///
    /// Every vector line is width-checked against `dim`, kept or not, so a file
    /// of the wrong dimensionality fails early.
    pub fn load(path: impl AsRef<Path>, dim: usize, keep: impl FnMut(&str) -> bool) -> Result<Self> {
        let path = path.as_ref();
        let vectors = Self::from_pairs(WordPairReader::open(path)?, dim, keep)?;
        tracing::info!(
            path = %path.display(),
            kept = vectors.len(),
            "number of trained word vectors kept"
        );
        Ok(vectors)
    }

    pub fn from_pairs(
        entries: impl IntoIterator<Item = Result<WordEntry>>,
        dim: usize,
        mut keep: impl FnMut(&str) -> bool,
    ) -> Result<Self> {
        let mut out = Self::new(dim);
        let mut seen = 0usize;

        for entry in entries {
            let WordEntry { line, word, pair } = entry?;
            seen += 1;
            match pair {
                WordPair::Vector(vector) => {
                    if vector.len() != dim {
                        return Err(Error::DimensionMismatch {
                            word,
                            line,
                            expected: dim,
                            found: vector.len(),
                        });
                    }
                    if keep(&word) {
                        out.vectors.insert(word, vector);
                    }
                }
                WordPair::Index(_) => {
                    return Err(Error::Parse {
                        line,
                        message: format!("{word:?} is an index entry, expected a vector"),
                    });
                }
            }
        }

        tracing::debug!(seen, kept = out.vectors.len(), "read word vectors");
        Ok(out)
    }

    pub fn insert(&mut self, word: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        let word = word.into();
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch {
                word,
                line: 0,
                expected: self.dim,
                found: vector.len(),
            });
        }
        self.vectors.insert(word, vector);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl VectorLookup for PretrainedVectors {
    fn dim(&self) -> usize {
        self.dim
    }

    fn lookup(&self, word: &str) -> Option<&[f32]> {
        self.vectors.get(word).map(Vec::as_slice)
    }
}
