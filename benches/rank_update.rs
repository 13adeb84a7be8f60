use criterion::{black_box, criterion_group, criterion_main, Criterion};

use crowdrank::{Belief, CostModel, ItemId, Rank};

fn bench_update(c: &mut Criterion) {
    c.bench_function("update_5_of_200", |b| {
        let items: Vec<ItemId> = (0..200).collect();
        let beliefs = vec![Belief::prior(); items.len()];
        let mut rank = Rank::from_beliefs(items, &beliefs, CostModel::None, 0.5)
            .unwrap()
            .with_seed(3);
        let ordering = [10, 50, 90, 130, 170];
        b.iter(|| black_box(rank.update(&ordering, Some(170), None)));
    });
}

fn bench_sample_item(c: &mut Criterion) {
    c.bench_function("sample_from_50", |b| {
        let items: Vec<ItemId> = (0..50).collect();
        let beliefs = vec![Belief::prior(); items.len()];
        let mut rank = Rank::from_beliefs(items, &beliefs, CostModel::rank_power(1.0), 0.5)
            .unwrap()
            .with_seed(3);
        let old = [1, 2, 3, 4];
        b.iter(|| black_box(rank.sample_item(&old, &[])));
    });
}

fn bench_evaluate_ordering(c: &mut Criterion) {
    c.bench_function("evaluate_ordering_10", |b| {
        let items: Vec<ItemId> = (0..100).collect();
        let beliefs = vec![Belief::prior(); items.len()];
        let rank = Rank::from_beliefs(items, &beliefs, CostModel::None, 0.5).unwrap();
        let ordering: Vec<ItemId> = (0..10).map(|i| i * 10).collect();
        b.iter(|| black_box(rank.evaluate_ordering(&ordering)));
    });
}

criterion_group!(benches, bench_update, bench_sample_item, bench_evaluate_ordering);
criterion_main!(benches);
