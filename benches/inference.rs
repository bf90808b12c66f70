//! Scoring benchmark: aligned row → probability, per classifier family.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use txn_risk::features::FEATURE_ORDER;
use txn_risk::model::{
    EnsembleKind, LinearKind, LinearModel, Node, ScoringAdapter, Tree, TreeEnsemble,
};

fn names() -> Vec<String> {
    FEATURE_ORDER.iter().map(|c| c.to_string()).collect()
}

fn linear() -> ScoringAdapter {
    let d = FEATURE_ORDER.len();
    let coef = (0..d).map(|i| (i as f64 - 7.0) / 10.0).collect();
    let model = LinearModel::new(LinearKind::Logistic, "bench", names(), coef, -1.0).unwrap();
    ScoringAdapter::new(Box::new(model))
}

/// Complete binary tree of the given depth, splitting on features round-robin.
fn tree(depth: usize, offset: usize) -> Tree {
    let d = FEATURE_ORDER.len();
    let internal = (1 << depth) - 1;
    let mut nodes = Vec::with_capacity(2 * internal + 1);
    for i in 0..internal {
        nodes.push(Node::Split {
            feature: (i + offset) % d,
            threshold: 0.0,
            left: 2 * i + 1,
            right: 2 * i + 2,
        });
    }
    for i in 0..=internal {
        nodes.push(Node::Leaf {
            value: (i % 7) as f64 / 7.0,
        });
    }
    Tree { nodes }
}

fn forest(kind: EnsembleKind) -> ScoringAdapter {
    let trees = (0..100).map(|t| tree(6, t)).collect();
    let model = TreeEnsemble::new(kind, "bench", names(), trees, 0.0).unwrap();
    ScoringAdapter::new(Box::new(model))
}

fn bench_single_row(c: &mut Criterion) {
    let row: Vec<f64> = (0..FEATURE_ORDER.len()).map(|i| (i as f64 - 5.0) * 0.3).collect();
    let logistic = linear();
    let rf = forest(EnsembleKind::RandomForest);
    let gb = forest(EnsembleKind::GradientBoosting);

    c.bench_function("score_one_logistic", |b| {
        b.iter(|| logistic.score_one(black_box(&row)).unwrap())
    });
    c.bench_function("score_one_random_forest_100", |b| {
        b.iter(|| rf.score_one(black_box(&row)).unwrap())
    });
    c.bench_function("score_one_gradient_boosting_100", |b| {
        b.iter(|| gb.score_one(black_box(&row)).unwrap())
    });
}

fn bench_batch(c: &mut Criterion) {
    let d = FEATURE_ORDER.len();
    let matrix = Array2::from_shape_fn((1024, d), |(r, c)| ((r * 31 + c * 17) % 200) as f64 / 100.0 - 1.0);
    let rf = forest(EnsembleKind::RandomForest);

    c.bench_function("score_batch_1024_random_forest", |b| {
        b.iter(|| black_box(rf.score(black_box(matrix.view())).unwrap()))
    });
}

criterion_group!(benches, bench_single_row, bench_batch);
criterion_main!(benches);
