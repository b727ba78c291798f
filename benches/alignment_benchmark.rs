/*
To run benchmarks:

Run all benchmarks -> cargo bench
Run specific benchmark -> cargo bench token_span
Run and open HTML report -> cargo bench && open target/criterion/report/index.html
*/

use criterion::{Criterion, criterion_group, criterion_main};
use squad_prep::{
    PadSide, Record, SequenceEncoder, SpanAligner, Tokenize, Truncation, Vocabulary, WordTokenizer,
};
use std::hint::black_box;

const CONTEXT: &str = "Architecturally, the school has a Catholic character. Atop the Main \
    Building's gold dome is a golden statue of the Virgin Mary. Immediately in front of the \
    Main Building and facing it, is a copper statue of Christ with arms upraised with the \
    legend \"Venite Ad Me Omnes\". Next to the Main Building is the Basilica of the Sacred \
    Heart. Immediately behind the basilica is the Grotto, a Marian place of prayer and \
    reflection. It is a replica of the grotto at Lourdes, France where the Virgin Mary \
    reputedly appeared to Saint Bernadette Soubirous in 1858.";

fn create_test_record() -> Record {
    let answer = "Saint Bernadette Soubirous";
    let start = CONTEXT.find(answer).unwrap();
    Record::from_answer("bench", "University_of_Notre_Dame", CONTEXT, "To whom?", answer, start)
}

fn bench_tokenize(c: &mut Criterion) {
    let tokenizer = WordTokenizer::new();

    c.bench_function("tokenize_context", |b| {
        b.iter(|| tokenizer.tokenize(black_box(CONTEXT)))
    });
}

fn bench_token_span(c: &mut Criterion) {
    let record = create_test_record();
    let aligner = SpanAligner::new(WordTokenizer::new());
    let tokens = WordTokenizer::new().tokenize(&record.context);

    c.bench_function("token_span", |b| {
        b.iter(|| {
            aligner
                .token_span(
                    black_box(&record.context),
                    black_box(&tokens),
                    record.answer_start,
                    record.answer_end,
                )
                .unwrap()
        })
    });
}

fn bench_full_alignment(c: &mut Criterion) {
    let record = create_test_record();
    let tokenizer = WordTokenizer::new();
    let vocab = Vocabulary::fit([tokenizer.tokenize(CONTEXT).join(" ")], 1000, true).unwrap();
    let encoder = SequenceEncoder::new(300, PadSide::Left, Truncation::Pre);

    let mut group = c.benchmark_group("alignment");

    for verify in [false, true] {
        let aligner = SpanAligner::new(tokenizer).verify_spans(verify);
        group.bench_function(format!("encode_and_align_verify_{verify}"), |b| {
            b.iter(|| {
                let record = black_box(&record);
                let tokens = tokenizer.tokenize(&record.context);
                let encoded = encoder.encode(&vocab.encode(&tokens));
                aligner.align(record, &tokens, &encoded).unwrap()
            })
        });
    }

    group.finish();
}

// Alignment cost grows with how far into the context the answer sits
fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("alignment_scaling");
    let aligner = SpanAligner::new(WordTokenizer::new());

    for repeats in [1, 4, 16].iter() {
        let context = vec![CONTEXT; *repeats].join(" ");
        let tokens = WordTokenizer::new().tokenize(&context);
        let start = context.rfind("Saint Bernadette").unwrap();
        let end = start + "Saint Bernadette Soubirous".len() - 1;

        group.bench_with_input(format!("token_span_x{}", repeats), repeats, |b, _| {
            b.iter(|| {
                aligner
                    .token_span(black_box(&context), &tokens, start, end)
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_token_span,
    bench_full_alignment,
    bench_scaling
);
criterion_main!(benches);
