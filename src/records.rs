//! SQuAD v1.1 records.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AlignError, Result};

/// One question with its answer located by inclusive character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub title: String,
    pub context: String,
    pub question: String,
    pub answer_start: usize,
    pub answer_end: usize,
    pub answer_text: String,
}

impl Record {
    /// Builds a record from a start offset and the answer text, deriving the
    /// inclusive end offset from the answer's length in characters.
    pub fn from_answer(
        id: impl Into<String>,
        title: impl Into<String>,
        context: impl Into<String>,
        question: impl Into<String>,
        answer_text: impl Into<String>,
        answer_start: usize,
    ) -> Self {
        let answer_text = answer_text.into();
        // saturating: an oversized start must fail `validate`, never wrap
        let answer_end = answer_start
            .saturating_add(answer_text.chars().count().saturating_sub(1));
        Record {
            id: id.into(),
            title: title.into(),
            context: context.into(),
            question: question.into(),
            answer_start,
            answer_end,
            answer_text,
        }
    }

    /// Checks `answer_start <= answer_end < chars(context)`.
    pub fn validate(&self) -> std::result::Result<(), AlignError> {
        let len = self.context.chars().count();
        if self.answer_start > self.answer_end || self.answer_end >= len {
            return Err(AlignError::OffsetsOutOfBounds {
                start: self.answer_start,
                end: self.answer_end,
                len,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SquadFile {
    data: Vec<SquadArticle>,
}

#[derive(Debug, Deserialize)]
struct SquadArticle {
    #[serde(default)]
    title: String,
    paragraphs: Vec<SquadParagraph>,
}

#[derive(Debug, Deserialize)]
struct SquadParagraph {
    context: String,
    qas: Vec<SquadQa>,
}

#[derive(Debug, Deserialize)]
struct SquadQa {
    id: String,
    question: String,
    #[serde(default)]
    answers: Vec<SquadAnswer>,
}

#[derive(Debug, Deserialize)]
struct SquadAnswer {
    text: String,
    answer_start: usize,
}

/// Reads a SQuAD JSON file into one record per answered question.
pub fn load_squad(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let squad: SquadFile = serde_json::from_reader(BufReader::new(file))?;
    let records = flatten(squad);
    tracing::info!(path = %path.display(), records = records.len(), "loaded squad records");
    Ok(records)
}

/// Parses SQuAD JSON held in memory.
pub fn parse_squad(json: &str) -> Result<Vec<Record>> {
    Ok(flatten(serde_json::from_str(json)?))
}

fn flatten(squad: SquadFile) -> Vec<Record> {
    let mut records = Vec::new();
    for article in squad.data {
        for paragraph in article.paragraphs {
            for qa in paragraph.qas {
                let Some(answer) = qa.answers.into_iter().next() else {
                    tracing::warn!(id = %qa.id, "question has no answer, skipping");
                    continue;
                };
                records.push(Record::from_answer(
                    qa.id,
                    article.title.clone(),
                    paragraph.context.clone(),
                    qa.question,
                    answer.text,
                    answer.answer_start,
                ));
            }
        }
    }
    records
}
