//! Benchmarks for file name parsing and title similarity
//!
//! Covers the three parse patterns, marker stripping and the matcher's
//! title comparison.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use reelmatch::metadata::matcher::titles_similar;
use reelmatch::scanner::filename::{clean_title, parse_file_name};

const NAMES: &[(&str, &str)] = &[
    ("paren_year", "The Matrix (1999).mkv"),
    ("dotted_release", "Inception.2010.1080p.BluRay.x264.DTS-HD.MA.5.1-GROUP.mkv"),
    ("spaced_year", "Blade Runner 2049 2017 2160p UHD HDR.mkv"),
    ("no_year", "Some_Home_Video_Final_Cut.mp4"),
    ("out_of_range", "Nosferatu (1850).avi"),
];

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_file_name");

    for (label, name) in NAMES {
        group.throughput(Throughput::Bytes(name.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), name, |b, name| {
            b.iter(|| parse_file_name(black_box(name)));
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_batch");

    let names: Vec<String> = (0..1000)
        .map(|i| format!("Movie.Number.{i}.{}.1080p.WEB-DL.x265.mkv", 1950 + i % 70))
        .collect();
    group.throughput(Throughput::Elements(names.len() as u64));
    group.bench_function("1000_release_names", |b| {
        b.iter(|| {
            for name in &names {
                black_box(parse_file_name(name));
            }
        });
    });

    group.finish();
}

fn bench_cleanup_and_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("title_helpers");

    group.bench_function("clean_title", |b| {
        b.iter(|| clean_title(black_box("The_Lord.of.the.Rings.EXTENDED.REMASTERED.2160p")));
    });

    group.bench_function("titles_similar/equal", |b| {
        b.iter(|| titles_similar(black_box("The Matrix"), black_box("the matrix")));
    });

    group.bench_function("titles_similar/miss", |b| {
        b.iter(|| {
            titles_similar(
                black_box("The Lord of the Rings The Return of the King"),
                black_box("Harry Potter and the Prisoner of Azkaban"),
            )
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_batch,
    bench_cleanup_and_similarity
);
criterion_main!(benches);
