use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sphharm::lanes::{Batch, LANES};
use sphharm::legendre::{fill_column, OrderCoefficients, RecursionTables, Sectorials};

/// Random latitudes batch with prepared sectorial chains.
fn prepare(rng: &mut StdRng, tables: &RecursionTables) -> (Batch, Vec<Sectorials>) {
    let nmax = tables.nmax;
    let lat: [f64; LANES] = std::array::from_fn(|_| rng.random_range(-1.5..1.5));
    let sect = lat
        .iter()
        .map(|phi| {
            let mut s = Sectorials::try_new(nmax).unwrap();
            s.prepare(phi.cos(), &tables.dm, nmax);
            s
        })
        .collect();
    (Batch::from_fn(|l| lat[l].sin()), sect)
}

fn bench_columns(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xFEEDFACE);
    let mut group = c.benchmark_group("legendre/fill_column");

    for nmax in [360, 2160, 10800] {
        let tables = RecursionTables::new(nmax);
        let mut coeffs = OrderCoefficients::try_new(nmax).unwrap();
        let mut out = vec![Batch::zero(); nmax + 1];

        for (label, dynamic) in [("dynamic", true), ("xnum_only", false)] {
            group.bench_with_input(BenchmarkId::new(label, nmax), &nmax, |b, &nmax| {
                b.iter_batched(
                    || prepare(&mut rng, &tables),
                    |(t, sect)| {
                        for m in (0..=nmax).step_by(nmax / 36) {
                            coeffs.fill(&tables, m);
                            fill_column(m, nmax, &coeffs, &t, &sect, dynamic, &mut out);
                        }
                        black_box(out[0][0])
                    },
                    BatchSize::LargeInput,
                )
            });
        }
    }
    group.finish();
}

fn bench_tables(c: &mut Criterion) {
    c.bench_function("legendre/recursion_tables_nmax10800", |b| {
        b.iter(|| black_box(RecursionTables::new(black_box(10_800))))
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_columns, bench_tables
);
criterion_main!(benches);
