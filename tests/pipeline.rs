use std::fs;
use std::path::Path;

use candle_core::Device;
use squad_prep::{
    DataPaths, Error, Pipeline, PipelineConfig, SequenceLengths, UNK_TOKEN, Vocabulary,
    WordTokenizer,
};
use tempfile::TempDir;

const SQUAD: &str = r#"{
    "version": "1.1",
    "data": [{
        "title": "University_of_Notre_Dame",
        "paragraphs": [{
            "context": "The Virgin Mary appeared to Saint Bernadette Soubirous in 1858.",
            "qas": [
                {
                    "id": "5733be284776f41900661182",
                    "question": "To whom did the Virgin Mary appear?",
                    "answers": [{"text": "Saint Bernadette Soubirous", "answer_start": 28}]
                },
                {
                    "id": "5733be284776f4190066117f",
                    "question": "When?",
                    "answers": [{"text": "1858", "answer_start": 58}]
                },
                {
                    "id": "broken",
                    "question": "Where?",
                    "answers": [{"text": "Lourdes", "answer_start": 200}]
                }
            ]
        }]
    }]
}"#;

const CORPUS: &str = "the virgin mary appeared to saint bernadette soubirous in 1858 .\n\
                      the grotto at lourdes .\n";

// every vocabulary word except "soubirous" has a vector
const VECTORS: &str = "the 0.1 0.1 0.1\n\
                       virgin 0.2 0.2 0.2\n\
                       mary 0.3 0.3 0.3\n\
                       appeared 0.4 0.4 0.4\n\
                       to 0.5 0.5 0.5\n\
                       saint 0.6 0.6 0.6\n\
                       bernadette 0.7 0.7 0.7\n\
                       in 0.8 0.8 0.8\n\
                       1858 0.9 0.9 0.9\n\
                       . 1.0 1.0 1.0\n\
                       grotto 1.1 1.1 1.1\n\
                       at 1.2 1.2 1.2\n\
                       lourdes 1.3 1.3 1.3\n\
                       paris 9.0 9.0 9.0\n";

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn fixture() -> (TempDir, DataPaths) {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths {
        squad: write(dir.path(), "train.json", SQUAD),
        corpus: Some(write(dir.path(), "corpus.tk.txt", CORPUS)),
        vocabulary: None,
        vectors: write(dir.path(), "vectors.txt", VECTORS),
    };
    (dir, paths)
}

fn config() -> PipelineConfig {
    PipelineConfig {
        embedding_dim: 3,
        max_sequence_len: SequenceLengths {
            context: 16,
            question: 10,
        },
        ..PipelineConfig::default()
    }
}

#[test]
fn full_run_produces_aligned_spans_and_embeddings() {
    let (_dir, paths) = fixture();
    let pipeline = Pipeline::new(config(), WordTokenizer).unwrap();
    let output = pipeline.run(&paths).unwrap();

    let dataset = &output.dataset;
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.skipped().len(), 1);
    assert_eq!(dataset.skipped()[0].id, "broken");

    // 11 context tokens left-padded to 16
    let first = &dataset.examples()[0];
    assert_eq!(first.context.leading_pad_count(), 5);
    assert_eq!((first.span.start, first.span.end), (10, 12));
    let answer = output
        .vocabulary
        .decode(&first.context.ids()[first.span.start..=first.span.end]);
    assert_eq!(answer, vec!["saint", "bernadette", "soubirous"]);

    let second = &dataset.examples()[1];
    assert_eq!((second.span.start, second.span.end), (14, 14));

    let embedding = &output.embedding;
    assert_eq!(embedding.shape(), (output.vocabulary.len() + 1, 3));
    assert!(embedding.row(0).unwrap().iter().all(|&v| v == 0.0));
    let soubirous = output.vocabulary.id("Soubirous");
    assert!(embedding.row(soubirous).unwrap().iter().all(|&v| v == 0.0));
    assert_eq!(embedding.oov_count(), 1);
    assert_eq!(
        embedding.row(output.vocabulary.id("saint")).unwrap(),
        &[0.6, 0.6, 0.6]
    );
}

#[test]
fn question_ids_round_trip_through_the_vocabulary() {
    let (_dir, paths) = fixture();
    let pipeline = Pipeline::new(config(), WordTokenizer).unwrap();
    let output = pipeline.run(&paths).unwrap();

    let question = &output.dataset.examples()[0].question;
    assert_eq!(question.len(), 10);
    assert_eq!(
        output.vocabulary.decode(question.ids()),
        vec![
            "to", UNK_TOKEN, UNK_TOKEN, "the", "virgin", "mary", UNK_TOKEN, UNK_TOKEN
        ]
    );
}

#[test]
fn saved_vocabulary_reproduces_the_run() {
    let (dir, paths) = fixture();
    let pipeline = Pipeline::new(config(), WordTokenizer).unwrap();
    let fitted = pipeline.run(&paths).unwrap();

    let vocab_path = dir.path().join("vocab.txt");
    fitted
        .vocabulary
        .write_to(fs::File::create(&vocab_path).unwrap())
        .unwrap();

    let reloaded_paths = DataPaths {
        corpus: None,
        vocabulary: Some(vocab_path.clone()),
        ..paths
    };
    let reloaded = pipeline.run(&reloaded_paths).unwrap();

    assert_eq!(reloaded.dataset.examples(), fitted.dataset.examples());
    assert_eq!(reloaded.embedding, fitted.embedding);

    let loaded = Vocabulary::load(&vocab_path, config().max_word_num, true).unwrap();
    assert_eq!(loaded.len(), fitted.vocabulary.len());
}

#[test]
fn vector_width_mismatch_fails_the_run() {
    let (_dir, paths) = fixture();
    let config = PipelineConfig {
        embedding_dim: 4,
        ..config()
    };
    let pipeline = Pipeline::new(config, WordTokenizer).unwrap();
    let err = pipeline.run(&paths).err().unwrap();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}

#[test]
fn saved_vocabulary_must_respect_the_word_cap() {
    let (dir, paths) = fixture();
    let fitted = Pipeline::new(config(), WordTokenizer)
        .unwrap()
        .run(&paths)
        .unwrap();
    assert!(fitted.vocabulary.len() > 3);

    let vocab_path = dir.path().join("vocab.txt");
    fitted
        .vocabulary
        .write_to(fs::File::create(&vocab_path).unwrap())
        .unwrap();

    let capped = PipelineConfig {
        max_word_num: 3,
        ..config()
    };
    let pipeline = Pipeline::new(capped, WordTokenizer).unwrap();
    let saved_paths = DataPaths {
        corpus: None,
        vocabulary: Some(vocab_path),
        ..paths
    };
    let err = pipeline.build_vocabulary(&saved_paths).unwrap_err();
    assert!(matches!(err, Error::Vocabulary(_)));
}

#[test]
fn embedded_contexts_follow_the_matrix_rows() {
    let (_dir, paths) = fixture();
    let output = Pipeline::new(config(), WordTokenizer)
        .unwrap()
        .run(&paths)
        .unwrap();

    let contexts = output.context_embeddings(&Device::Cpu).unwrap();
    assert_eq!(contexts.dims(), &[2, 16, 3]);
    let questions = output.question_embeddings(&Device::Cpu).unwrap();
    assert_eq!(questions.dims(), &[2, 10, 3]);

    let first = &output.dataset.examples()[0];
    let rows = contexts.to_vec3::<f32>().unwrap();
    // leading pads read the zero row, the answer start is "saint"
    assert_eq!(rows[0][0], vec![0.0, 0.0, 0.0]);
    assert_eq!(rows[0][first.span.start], vec![0.6, 0.6, 0.6]);
}
