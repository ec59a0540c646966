use std::{path::Path, time::Duration};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hmmtagger::{CorpusReader, ModelTrainer};

fn train(tags: &Path, words: &Path) {
    let mut trainer = ModelTrainer::new();
    for pair in CorpusReader::open(tags, words).expect("failed to open corpus") {
        let pair = pair.expect("failed to read line");
        trainer
            .append(&pair.tags, &pair.words)
            .expect("failed to append example");
    }
    trainer.finish().expect("failed to train");
}

fn train_benchmark(c: &mut Criterion) {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data");
    let tags = dir.join("train-tags.txt");
    let words = dir.join("train-sentences.txt");
    c.bench_function("train", |b| {
        b.iter(|| train(black_box(&tags), black_box(&words)))
    });
}

criterion_group! {
    name = benchmarks;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = train_benchmark
}

criterion_main!(benchmarks);
