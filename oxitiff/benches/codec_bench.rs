//! Strip engine throughput per codec.
//!
//! Each iteration writes or reads a whole 256x256 image through a
//! [`Tiff`] handle, so the numbers include buffering and placement as well
//! as the codec itself.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxitiff::{CodecRegistry, Directory, Predictor, Scheme, Tiff};
use std::hint::black_box;
use std::io::Cursor;

const SIDE: u32 = 256;
const ROWS_PER_STRIP: u32 = 32;

/// Smooth gradient with a little noise, like a scanned photograph.
fn image() -> Vec<u8> {
    let mut seed: u32 = 0x9E37_79B9;
    (0..SIDE * SIDE)
        .map(|i| {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let (x, y) = (i % SIDE, i / SIDE);
            (((x + y) / 2) as u8).wrapping_add((seed >> 29) as u8)
        })
        .collect()
}

fn configs() -> Vec<(&'static str, Directory)> {
    let base = Directory::new(SIDE, SIDE).with_rows_per_strip(ROWS_PER_STRIP);
    vec![
        ("none", base.clone()),
        ("packbits", base.clone().with_compression(Scheme::PackBits)),
        ("lzw", base.clone().with_compression(Scheme::Lzw)),
        (
            "lzw_predictor",
            base.clone()
                .with_compression(Scheme::Lzw)
                .with_predictor(Predictor::Horizontal),
        ),
        ("deflate", base.with_compression(Scheme::AdobeDeflate)),
    ]
}

fn write_image(registry: &CodecRegistry, dir: Directory, pixels: &[u8]) -> Tiff<Cursor<Vec<u8>>> {
    let strip_size = (SIDE * ROWS_PER_STRIP) as usize;
    let mut tiff = Tiff::create(Cursor::new(Vec::new()), dir, registry).unwrap();
    for (strip, data) in pixels.chunks(strip_size).enumerate() {
        tiff.write_encoded_strip(strip as u32, data).unwrap();
    }
    tiff
}

fn bench_encode(c: &mut Criterion) {
    let registry = CodecRegistry::new();
    let pixels = image();
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(pixels.len() as u64));
    for (name, dir) in configs() {
        if !registry.is_configured(dir.compression) {
            continue;
        }
        group.bench_with_input(BenchmarkId::from_parameter(name), &dir, |b, dir| {
            b.iter(|| black_box(write_image(&registry, dir.clone(), black_box(&pixels)).finish().unwrap()))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let registry = CodecRegistry::new();
    let pixels = image();
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(pixels.len() as u64));
    for (name, dir) in configs() {
        if !registry.is_configured(dir.compression) {
            continue;
        }
        let parts = write_image(&registry, dir, &pixels).finish().unwrap();
        let nstrips = SIDE.div_ceil(ROWS_PER_STRIP);
        group.bench_with_input(BenchmarkId::from_parameter(name), &parts, |b, (store, dir, chunks)| {
            let mut buf = vec![0u8; (SIDE * ROWS_PER_STRIP) as usize];
            b.iter(|| {
                let mut tiff =
                    Tiff::open(store.clone(), dir.clone(), chunks.clone(), &registry).unwrap();
                for strip in 0..nstrips {
                    tiff.read_encoded_strip(strip, &mut buf).unwrap();
                }
                black_box(&buf);
            })
        });
    }
    group.finish();
}

fn bench_scanlines(c: &mut Criterion) {
    let registry = CodecRegistry::new();
    let pixels = image();
    let mut group = c.benchmark_group("scanlines");
    group.throughput(Throughput::Bytes(pixels.len() as u64));
    for (name, dir) in configs() {
        if !registry.is_configured(dir.compression) {
            continue;
        }
        let parts = write_image(&registry, dir, &pixels).finish().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &parts, |b, (store, dir, chunks)| {
            let mut line = vec![0u8; SIDE as usize];
            b.iter(|| {
                let mut tiff =
                    Tiff::open(store.clone(), dir.clone(), chunks.clone(), &registry).unwrap();
                for row in 0..SIDE {
                    tiff.read_scanline(&mut line, row, 0).unwrap();
                }
                black_box(&line);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_scanlines);
criterion_main!(benches);
