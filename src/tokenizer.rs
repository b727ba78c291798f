use once_cell::sync::Lazy;
use regex::Regex;

// numbers keep their inner separators, words keep inner hyphens/apostrophes,
// any other visible symbol stands alone
static WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+(?:[.,]\d+)+|\w+(?:['’-]\w+)*|[^\w\s]").expect("word pattern is valid")
});

/// Splits text into an ordered sequence of tokens borrowed from the input.
///
/// Implementations must be deterministic: the span aligner tokenizes
/// substrings of a context and relies on them agreeing with the tokens of the
/// full context.
pub trait Tokenize {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

impl<T: Tokenize + ?Sized> Tokenize for &T {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        (**self).tokenize(text)
    }
}

/// Moses-style word tokenizer: words and punctuation become separate tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    pub fn new() -> Self {
        WordTokenizer
    }
}

impl Tokenize for WordTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        WORD_RE.find_iter(text).map(|m| m.as_str()).collect()
    }
}

/// Splits on whitespace only, for corpora that are already tokenized.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenize for WhitespaceTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split_whitespace().collect()
    }
}

/// Re-joins tokens with single spaces, the inverse used for display.
pub fn detokenize(tokens: &[&str]) -> String {
    tokens.join(" ")
}
