//! Integration tests for tiled images.

use oxitiff::{CodecRegistry, Directory, PlanarConfig, Predictor, Scheme, Tiff, TiffError};
use std::io::Cursor;

const WIDTH: usize = 40;
const LENGTH: usize = 40;
const TILE: usize = 16;

fn image(spp: usize) -> Vec<u8> {
    (0..WIDTH * LENGTH * spp)
        .map(|i| ((i / 3) as u8).wrapping_add((i % 3) as u8 * 40))
        .collect()
}

/// Cut the tile at (`x`, `y`) out of a contiguous image, zero padded.
fn cut_tile(image: &[u8], spp: usize, x: usize, y: usize) -> Vec<u8> {
    let mut tile = vec![0u8; TILE * TILE * spp];
    for row in 0..TILE {
        let iy = y + row;
        if iy >= LENGTH {
            break;
        }
        let cols = TILE.min(WIDTH - x);
        let src = (iy * WIDTH + x) * spp;
        let dst = row * TILE * spp;
        tile[dst..dst + cols * spp].copy_from_slice(&image[src..src + cols * spp]);
    }
    tile
}

fn origins() -> impl Iterator<Item = (usize, usize)> {
    (0..LENGTH)
        .step_by(TILE)
        .flat_map(|y| (0..WIDTH).step_by(TILE).map(move |x| (x, y)))
}

fn round_trip(registry: &CodecRegistry, dir: Directory, spp: usize) {
    let scheme = dir.compression;
    let pixels = image(spp);
    let mut tiff = Tiff::create(Cursor::new(Vec::new()), dir, registry).unwrap();
    for (x, y) in origins() {
        let tile = cut_tile(&pixels, spp, x, y);
        let n = tiff.write_tile(&tile, x as u32, y as u32, 0, 0).unwrap();
        assert_eq!(n, tile.len());
    }
    let (store, dir, chunks) = tiff.finish().unwrap();
    assert_eq!(chunks.len(), 9);
    assert!(chunks.byte_counts.iter().all(|&c| c > 0));

    let mut tiff = Tiff::open(store, dir, chunks, registry).unwrap();
    let mut buf = vec![0u8; TILE * TILE * spp];
    for (x, y) in origins() {
        tiff.read_tile(&mut buf, x as u32, y as u32, 0, 0).unwrap();
        assert_eq!(buf, cut_tile(&pixels, spp, x, y), "{scheme} tile at {x},{y}");
    }
}

#[test]
fn test_tiles_round_trip_every_codec() {
    let registry = CodecRegistry::new();
    for scheme in [
        Scheme::None,
        Scheme::Lzw,
        Scheme::PackBits,
        Scheme::Deflate,
    ] {
        if !registry.is_configured(scheme) {
            continue;
        }
        let dir = Directory::new(WIDTH as u32, LENGTH as u32)
            .with_tiles(TILE as u32, TILE as u32)
            .with_compression(scheme);
        round_trip(&registry, dir, 1);
    }
}

#[test]
fn test_tiles_with_predictor() {
    let registry = CodecRegistry::new();
    for scheme in [Scheme::Lzw, Scheme::AdobeDeflate] {
        if !registry.is_configured(scheme) {
            continue;
        }
        let dir = Directory::new(WIDTH as u32, LENGTH as u32)
            .with_samples_per_pixel(3)
            .with_tiles(TILE as u32, TILE as u32)
            .with_predictor(Predictor::Horizontal)
            .with_compression(scheme);
        round_trip(&registry, dir, 3);
    }
}

#[test]
fn test_tile_cursor_follows_tile() {
    let registry = CodecRegistry::new();
    let dir = Directory::new(WIDTH as u32, LENGTH as u32).with_tiles(TILE as u32, TILE as u32);
    let mut tiff = Tiff::create(Cursor::new(Vec::new()), dir, &registry).unwrap();
    for tile in 0..9 {
        tiff.write_encoded_tile(tile, &[tile as u8; TILE * TILE]).unwrap();
    }
    let (store, dir, chunks) = tiff.finish().unwrap();

    let mut tiff = Tiff::open(store, dir, chunks, &registry).unwrap();
    let mut buf = vec![0u8; TILE * TILE];
    assert_eq!(tiff.read_encoded_tile(5, &mut buf).unwrap(), TILE * TILE);
    assert_eq!(buf, vec![5u8; TILE * TILE]);
    assert_eq!(tiff.current_tile(), Some(5));
    assert_eq!(tiff.current_row(), 16);
    assert_eq!(tiff.current_column(), 32);

    // A short buffer is filled only as far as it goes
    let mut small = [0u8; 10];
    assert_eq!(tiff.read_encoded_tile(2, &mut small).unwrap(), 10);
    assert_eq!(small, [2; 10]);
}

#[test]
fn test_separate_plane_tiles() {
    let registry = CodecRegistry::new();
    let dir = Directory::new(WIDTH as u32, LENGTH as u32)
        .with_samples_per_pixel(2)
        .with_planar_config(PlanarConfig::Separate)
        .with_tiles(TILE as u32, TILE as u32);
    assert_eq!(dir.compute_tile(16, 16, 0, 1).unwrap(), 13);

    let mut tiff = Tiff::create(Cursor::new(Vec::new()), dir, &registry).unwrap();
    for sample in 0..2u16 {
        for (x, y) in origins() {
            let value = (sample as usize * 100 + y / TILE * 3 + x / TILE) as u8;
            tiff.write_tile(&vec![value; TILE * TILE], x as u32, y as u32, 0, sample)
                .unwrap();
        }
    }
    let (store, dir, chunks) = tiff.finish().unwrap();
    assert_eq!(chunks.len(), 18);

    let mut tiff = Tiff::open(store, dir, chunks, &registry).unwrap();
    let mut buf = vec![0u8; TILE * TILE];
    tiff.read_tile(&mut buf, 20, 30, 0, 1).unwrap();
    assert_eq!(buf, vec![104u8; TILE * TILE]);
}

#[test]
fn test_raw_tiles() {
    let registry = CodecRegistry::new();
    let dir = Directory::new(WIDTH as u32, LENGTH as u32).with_tiles(TILE as u32, TILE as u32);
    let mut tiff = Tiff::create(Cursor::new(Vec::new()), dir, &registry).unwrap();
    tiff.write_raw_tile(4, b"abc").unwrap();
    tiff.write_raw_tile(4, b"def").unwrap();
    tiff.write_raw_tile(0, b"xy").unwrap();
    let (store, dir, chunks) = tiff.finish().unwrap();
    assert_eq!(chunks.offsets[4], 0);
    assert_eq!(chunks.byte_counts[4], 6);
    assert_eq!(chunks.offsets[0], 6);

    let mut tiff = Tiff::open(store, dir, chunks, &registry).unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(tiff.read_raw_tile(4, &mut buf).unwrap(), 6);
    assert_eq!(&buf[..6], b"abcdef");
    let err = tiff.read_raw_tile(1, &mut buf).unwrap_err();
    assert!(err.to_string().contains("Invalid tile byte count"));
}

#[test]
fn test_tile_bounds() {
    let registry = CodecRegistry::new();
    let dir = Directory::new(WIDTH as u32, LENGTH as u32).with_tiles(TILE as u32, TILE as u32);
    let mut tiff = Tiff::create(Cursor::new(Vec::new()), dir, &registry).unwrap();
    let tile = vec![0u8; TILE * TILE];

    let err = tiff.write_tile(&tile, 40, 0, 0, 0).unwrap_err();
    assert!(matches!(err, TiffError::OutOfRange { what: "column", .. }));
    let err = tiff.write_tile(&tile, 0, 0, 0, 1).unwrap_err();
    assert!(matches!(err, TiffError::OutOfRange { what: "sample", .. }));
    let err = tiff.write_encoded_tile(9, &tile).unwrap_err();
    assert_eq!(err.to_string(), "9: tile out of range, max 8");
    assert!(tiff.write_scanline(&tile, 0, 0).is_err());
    assert!(tiff.write_encoded_strip(0, &tile).is_err());
    assert!(tiff.write_raw_strip(0, &tile).is_err());
}

#[test]
fn test_tiled_image_rejects_strip_access() {
    let registry = CodecRegistry::new();
    let dir = Directory::new(WIDTH as u32, LENGTH as u32).with_tiles(TILE as u32, TILE as u32);
    let mut tiff = Tiff::create(Cursor::new(Vec::new()), dir, &registry).unwrap();
    tiff.write_encoded_tile(0, &[1; TILE * TILE]).unwrap();
    let (store, dir, chunks) = tiff.finish().unwrap();

    let mut tiff = Tiff::open(store, dir, chunks, &registry).unwrap();
    let err = tiff.read_scanline(&mut [0; WIDTH], 0, 0).unwrap_err();
    assert!(err.to_string().contains("Can not read scanlines from a tiled image"));
    let err = tiff.read_encoded_strip(0, &mut [0; WIDTH]).unwrap_err();
    assert!(err.to_string().contains("Can not read strips from a tiled image"));
    let err = tiff.read_raw_strip(0, &mut [0; WIDTH]).unwrap_err();
    assert!(err.to_string().contains("Can not read strips from a tiled image"));
}
