//! Character-offset to token-offset alignment of answer spans.
//!
//! Given a context, its tokens and an answer located by inclusive character
//! offsets, the aligner finds the token indices bounding the answer:
//!
//! 1. the context from the answer start onward is tokenized; the tokens before
//!    the answer are `tokens(context) - tokens(suffix)`, which is the start index;
//! 2. the context up to and including the answer end is tokenized; its last
//!    token is the answer's final token;
//! 3. the first token at or after the start equal to that final token is the end.
//!
//! Both indices are then moved into the coordinates of the padded sequence.
//! Because step 3 takes the first match, an answer whose final token also
//! occurs earlier inside the answer resolves short; span verification catches
//! that case.

use serde::{Deserialize, Serialize};

use crate::error::AlignError;
use crate::records::Record;
use crate::sequence::EncodedSequence;
use crate::tokenizer::Tokenize;

/// Inclusive token span in the unpadded token sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

/// Inclusive token span in the padded sequence; indices include the padding
/// offset and index directly into the encoded ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanIndex {
    pub start: usize,
    pub end: usize,
}

pub struct SpanAligner<T> {
    tokenizer: T,
    verify: bool,
}

impl<T: Tokenize> SpanAligner<T> {
    /// Creates an aligner with span verification on.
    pub fn new(tokenizer: T) -> Self {
        SpanAligner {
            tokenizer,
            verify: true,
        }
    }

    pub fn verify_spans(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Aligns a record's answer onto its padded context sequence.
    ///
    /// `context_tokens` must come from the same tokenizer applied to the whole
    /// context, and `encoded` from those tokens.
    pub fn align(
        &self,
        record: &Record,
        context_tokens: &[&str],
        encoded: &EncodedSequence,
    ) -> Result<SpanIndex, AlignError> {
        let raw = self.token_span(
            &record.context,
            context_tokens,
            record.answer_start,
            record.answer_end,
        )?;

        if self.verify {
            verify_span(&context_tokens[raw.start..=raw.end], &record.answer_text)?;
        }

        to_padded(raw, encoded)
    }

    /// Finds the inclusive token span covering characters `start..=end`.
    pub fn token_span(
        &self,
        context: &str,
        context_tokens: &[&str],
        start: usize,
        end: usize,
    ) -> Result<TokenSpan, AlignError> {
        let len = context.chars().count();
        if start > end || end >= len {
            return Err(AlignError::OffsetsOutOfBounds { start, end, len });
        }

        let total = context_tokens.len();
        let suffix = self.tokenizer.tokenize(&context[byte_offset(context, start)..]);
        let start_token = total as isize - suffix.len() as isize;
        if start_token < 0 || start_token as usize >= total {
            return Err(AlignError::StartOutOfRange {
                start: start_token,
                total,
            });
        }
        let start_token = start_token as usize;

        let prefix = self.tokenizer.tokenize(&context[..byte_offset(context, end + 1)]);
        let last = *prefix.last().ok_or(AlignError::EmptyAnswerPrefix)?;

        let offset = context_tokens[start_token..]
            .iter()
            .position(|&token| token == last)
            .ok_or_else(|| AlignError::EndTokenNotFound {
                token: last.to_string(),
                start: start_token,
            })?;

        Ok(TokenSpan {
            start: start_token,
            end: start_token + offset,
        })
    }
}

/// Moves a raw span into padded coordinates.
pub fn to_padded(span: TokenSpan, encoded: &EncodedSequence) -> Result<SpanIndex, AlignError> {
    match (encoded.position(span.start), encoded.position(span.end)) {
        (Some(start), Some(end)) => Ok(SpanIndex { start, end }),
        _ => Err(AlignError::Truncated {
            start: span.start,
            end: span.end,
        }),
    }
}

/// Checks that the span's tokens spell the answer, ignoring case and whitespace.
pub fn verify_span(span_tokens: &[&str], answer_text: &str) -> Result<(), AlignError> {
    let found = span_tokens.join(" ");
    if squash(&found) == squash(answer_text) {
        Ok(())
    } else {
        Err(AlignError::SpanMismatch {
            expected: answer_text.to_string(),
            found,
        })
    }
}

fn squash(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// char offset to byte offset; one past the last char maps to the text length
fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(byte, _)| byte)
}
