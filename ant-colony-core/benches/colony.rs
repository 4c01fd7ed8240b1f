use ant_colony_core::ant::construct;
use ant_colony_core::pheromone::update;
use ant_colony_core::problem::{initial_pheromone, ItemCatalogue};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn bench_construct(c: &mut Criterion) {
    let catalogue = ItemCatalogue::generate(1000, 500, 42);
    let pheromone = initial_pheromone(catalogue.len());
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    c.bench_function("construct_1000_items", |b| {
        b.iter(|| {
            black_box(construct(
                black_box(&catalogue),
                black_box(&pheromone),
                1.0,
                5.0,
                &mut rng,
            ))
        })
    });
}

fn bench_update(c: &mut Criterion) {
    let mut pheromone = initial_pheromone(1000);
    let all_values: Vec<u32> = (0..20).map(|i| 100 + i * 13).collect();
    let all_item_sets: Vec<Vec<usize>> = (0..20).map(|i| (i..i + 12).collect()).collect();

    c.bench_function("pheromone_update_20_ants", |b| {
        b.iter(|| {
            update(
                black_box(&mut pheromone),
                0.1,
                100.0,
                black_box(&all_values),
                black_box(&all_item_sets),
            )
        })
    });
}

criterion_group!(benches, bench_construct, bench_update);
criterion_main!(benches);
