use criterion::{black_box, criterion_group, criterion_main, Criterion};
use email_classifier::{Dataset, Example, Pipeline};

fn synthetic_dataset(size: usize) -> Dataset {
    (0..size)
        .map(|i| {
            if i % 3 == 0 {
                Example::new(format!("Claim your free prize number {} before midnight, winner!", i), "spam")
            } else {
                Example::new(format!("Notes from meeting {} are attached, see you tomorrow", i), "ham")
            }
        })
        .collect()
}

fn setup_benchmark_pipeline() -> Pipeline {
    Pipeline::builder().fit(&Dataset::sample()).unwrap()
}

fn bench_prediction(c: &mut Criterion) {
    let pipeline = setup_benchmark_pipeline();
    let mut group = c.benchmark_group("Prediction");

    // Configure sampling
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("short_text", |b| b.iter(|| {
        pipeline.predict(black_box("Free prize inside")).unwrap()
    }));

    let long_text = "Hey, are you coming to the meeting tomorrow? ".repeat(50);
    group.bench_function("long_text", |b| b.iter(|| {
        pipeline.predict(black_box(&long_text)).unwrap()
    }));

    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("Training");
    group.sample_size(20);

    for size in [100, 1000] {
        let dataset = synthetic_dataset(size);
        group.bench_function(format!("fit_{}", size), |b| b.iter(|| {
            Pipeline::builder().fit(black_box(&dataset)).unwrap()
        }));
    }

    group.finish();
}

criterion_group!(benches, bench_prediction, bench_training);
criterion_main!(benches);
