use std::borrow::Cow;
use std::io::{self, Write};
use std::path::Path;

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};
use crate::file_loader::read_lines;
use crate::tokenizer::{Tokenize, WhitespaceTokenizer};
use crate::vectors::{WordPair, WordPairReader};

/// Padding sentinel. Never assigned to a word.
pub const PAD_ID: u32 = 0;
pub const UNK_TOKEN: &str = "<unk>";
pub const UNK_ID: u32 = 1;

/// Word to id mapping with ids dense in `1..=len()`.
///
/// Id `n` is stored at position `n - 1`; the unknown token always holds id 1.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    words: IndexSet<String>,
    lowercase: bool,
}

impl Vocabulary {
    /// Fits a vocabulary on a pre-tokenized corpus, one document per line.
    ///
    /// Words are ranked by descending frequency, ties keep first-seen order,
    /// and the table is capped at `max_word_num` ids including `<unk>`.
    pub fn fit<I, S>(corpus: I, max_word_num: usize, lowercase: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if max_word_num == 0 {
            return Err(Error::Vocabulary("max_word_num must be at least 1".into()));
        }

        let mut counts = WordCounts::default();
        for line in corpus {
            counts.add_line(line.as_ref(), lowercase);
        }
        Ok(counts.into_vocabulary(max_word_num, lowercase))
    }

    /// Fits on a tokenized corpus file, streaming it line by line.
    pub fn fit_file(path: impl AsRef<Path>, max_word_num: usize, lowercase: bool) -> Result<Self> {
        if max_word_num == 0 {
            return Err(Error::Vocabulary("max_word_num must be at least 1".into()));
        }

        let mut counts = WordCounts::default();
        for line in read_lines(path)? {
            counts.add_line(&line?, lowercase);
        }
        Ok(counts.into_vocabulary(max_word_num, lowercase))
    }

    /// Builds a vocabulary from `(word, id)` pairs whose ids are exactly
    /// `1..=n`, with `<unk>` at id 1 and `n <= max_word_num`.
    ///
    /// Words are normalized the same way lookups are, so a lowercasing
    /// vocabulary never holds an entry `id()` cannot reach.
    pub fn from_word_pairs<I>(pairs: I, max_word_num: usize, lowercase: bool) -> Result<Self>
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        let mut pairs: Vec<(String, u32)> = pairs.into_iter().collect();
        if pairs.len() > max_word_num {
            return Err(Error::Vocabulary(format!(
                "{} ids exceed max_word_num {max_word_num}",
                pairs.len()
            )));
        }
        pairs.sort_by_key(|(_, id)| *id);

        let mut words = IndexSet::with_capacity(pairs.len());
        for (expected, (word, id)) in (1u32..).zip(pairs) {
            if id != expected {
                return Err(Error::Vocabulary(format!(
                    "ids must be dense from 1, found {id} where {expected} was expected"
                )));
            }
            let word = if lowercase { word.to_lowercase() } else { word };
            if !words.insert(word) {
                return Err(Error::Vocabulary(format!("duplicate word at id {id}")));
            }
        }

        if words.get_index(0).map(String::as_str) != Some(UNK_TOKEN) {
            return Err(Error::Vocabulary(format!("id {UNK_ID} must be {UNK_TOKEN}")));
        }

        Ok(Vocabulary { words, lowercase })
    }

    /// Loads a saved `<word> <id>` file holding at most `max_word_num` ids.
    pub fn load(path: impl AsRef<Path>, max_word_num: usize, lowercase: bool) -> Result<Self> {
        let path = path.as_ref();
        let mut pairs = Vec::new();
        for entry in WordPairReader::open(path)? {
            let entry = entry?;
            match entry.pair {
                WordPair::Index(id) => pairs.push((entry.word, id)),
                WordPair::Vector(_) => {
                    return Err(Error::Parse {
                        line: entry.line,
                        message: format!("{:?} has a vector, expected an index", entry.word),
                    });
                }
            }
        }

        let vocab = Self::from_word_pairs(pairs, max_word_num, lowercase)?;
        tracing::info!(path = %path.display(), words = vocab.len(), "loaded vocabulary");
        Ok(vocab)
    }

    /// Writes the vocabulary as `<word> <id>` lines, readable by [`Vocabulary::load`].
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for (word, id) in self.iter() {
            writeln!(writer, "{word} {id}")?;
        }
        writer.flush()
    }

    /// Number of ids in use, `<unk>` included.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn unk_id(&self) -> u32 {
        UNK_ID
    }

    pub fn lowercase(&self) -> bool {
        self.lowercase
    }

    /// Exact lookup of an already-normalized word.
    pub fn get(&self, word: &str) -> Option<u32> {
        self.words.get_index_of(word).map(|i| i as u32 + 1)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Id of a raw token; unknown words map to the unknown id.
    pub fn id(&self, token: &str) -> u32 {
        self.get(&normalize(token, self.lowercase)).unwrap_or(UNK_ID)
    }

    pub fn token(&self, id: u32) -> Option<&str> {
        if id == PAD_ID {
            return None;
        }
        self.words.get_index(id as usize - 1).map(String::as_str)
    }

    pub fn encode(&self, tokens: &[&str]) -> Vec<u32> {
        tokens.iter().map(|token| self.id(token)).collect()
    }

    /// Maps ids back to words. Padding is skipped, unassigned ids read as `<unk>`.
    pub fn decode(&self, ids: &[u32]) -> Vec<&str> {
        ids.iter()
            .filter(|&&id| id != PAD_ID)
            .map(|&id| self.token(id).unwrap_or(UNK_TOKEN))
            .collect()
    }

    /// `(word, id)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.words
            .iter()
            .enumerate()
            .map(|(i, word)| (word.as_str(), i as u32 + 1))
    }
}

#[derive(Default)]
struct WordCounts(IndexMap<String, usize>);

impl WordCounts {
    fn add_line(&mut self, line: &str, lowercase: bool) {
        for word in WhitespaceTokenizer.tokenize(line) {
            let word = normalize(word, lowercase);
            match self.0.get_mut(&*word) {
                Some(count) => *count += 1,
                None => {
                    self.0.insert(word.into_owned(), 1);
                }
            }
        }
    }

    fn into_vocabulary(mut self, max_word_num: usize, lowercase: bool) -> Vocabulary {
        self.0.shift_remove(UNK_TOKEN);

        let unique = self.0.len();
        let mut ranked: Vec<(String, usize)> = self.0.into_iter().collect();
        // stable sort: equal counts stay in first-seen order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let mut words = IndexSet::with_capacity(unique.min(max_word_num - 1) + 1);
        words.insert(UNK_TOKEN.to_string());
        words.extend(ranked.into_iter().take(max_word_num - 1).map(|(w, _)| w));

        tracing::info!(unique, kept = words.len(), "number of unique tokens");

        Vocabulary { words, lowercase }
    }
}

fn normalize(word: &str, lowercase: bool) -> Cow<'_, str> {
    if lowercase && word.chars().any(char::is_uppercase) {
        Cow::Owned(word.to_lowercase())
    } else {
        Cow::Borrowed(word)
    }
}
