//! LZW integration tests.

use oxitiff_lzw::{BitOrder, LzwConfig, LzwDecoder, LzwEncoder, LzwError, compress_tiff, decompress_tiff};

/// Image-like test pattern: diagonal ramp.
fn ramp(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push(((x + y) % 256) as u8);
        }
    }
    data
}

/// Xorshift noise; defeats the dictionary so the table fills quickly.
fn noise(size: usize) -> Vec<u8> {
    let mut state = 0x9E37_79B9u32;
    (0..size)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

#[test]
fn test_lzw_roundtrip_simple() {
    let original = b"TOBEORNOTTOBEORTOBEORNOT";
    let compressed = compress_tiff(original).expect("compression failed");
    let decompressed = decompress_tiff(&compressed, original.len()).expect("decompression failed");
    assert_eq!(decompressed, original);
}

#[test]
fn test_lzw_roundtrip_large_text() {
    let original = b"The quick brown fox jumps over the lazy dog. ".repeat(100);
    let compressed = compress_tiff(&original).expect("compression failed");
    let decompressed = decompress_tiff(&compressed, original.len()).expect("decompression failed");
    assert_eq!(decompressed, original);
}

#[test]
fn test_lzw_empty_input() {
    let compressed = compress_tiff(b"").expect("compression failed");
    let decompressed = decompress_tiff(&compressed, 0).expect("decompression failed");
    assert!(decompressed.is_empty());
}

#[test]
fn test_lzw_all_byte_values() {
    let original: Vec<u8> = (0..=255u8).collect();
    let compressed = compress_tiff(&original).expect("compression failed");
    let decompressed = decompress_tiff(&compressed, original.len()).expect("decompression failed");
    assert_eq!(decompressed, original);
}

#[test]
fn test_lzw_full_image_ramp() {
    let data = ramp(512, 512);
    let compressed = compress_tiff(&data).expect("compression failed");
    let decompressed = decompress_tiff(&compressed, data.len()).expect("decompression failed");
    assert_eq!(decompressed, data);
}

#[test]
fn test_lzw_reset_boundary() {
    // Far more strings than a 12-bit table can hold
    let data = noise(200_000);
    let mut encoder = LzwEncoder::new(LzwConfig::TIFF).unwrap();
    let mut compressed = Vec::new();
    assert_eq!(encoder.encode(&data, &mut compressed, usize::MAX), data.len());
    assert!(encoder.table_resets() >= 1, "expected at least one clear code");
    encoder.finish(&mut compressed);

    let decompressed = decompress_tiff(&compressed, data.len()).expect("decompression failed");
    assert_eq!(decompressed, data);
}

#[test]
fn test_lzw_chunked_encode_matches_one_shot() {
    let data = ramp(300, 40);
    let one_shot = compress_tiff(&data).unwrap();

    // Tiny output limit forces many early returns
    let mut encoder = LzwEncoder::new(LzwConfig::TIFF).unwrap();
    let mut compressed = Vec::new();
    let mut input = &data[..];
    while !input.is_empty() {
        let mut chunk = Vec::new();
        let consumed = encoder.encode(input, &mut chunk, 16);
        compressed.extend_from_slice(&chunk);
        input = &input[consumed..];
    }
    encoder.finish(&mut compressed);
    assert_eq!(compressed, one_shot);
}

#[test]
fn test_lzw_scanline_by_scanline_decode() {
    let width = 97;
    let data = ramp(width, 64);
    let compressed = compress_tiff(&data).unwrap();

    let mut decoder = LzwDecoder::new(LzwConfig::TIFF).unwrap();
    decoder.begin(&compressed);
    assert_eq!(decoder.bit_order(), BitOrder::Msb);
    let mut cursor = 0;
    for row in data.chunks(width) {
        let mut out = vec![0u8; width];
        cursor += decoder.decode(&compressed[cursor..], &mut out).unwrap();
        assert_eq!(out, row);
    }
}

#[test]
fn test_lzw_truncated_strip() {
    let data = ramp(128, 16);
    let compressed = compress_tiff(&data).unwrap();
    let truncated = &compressed[..compressed.len() / 2];

    let mut decoder = LzwDecoder::new(LzwConfig::TIFF).unwrap();
    decoder.begin(truncated);
    let mut out = vec![0u8; data.len()];
    match decoder.decode(truncated, &mut out) {
        Err(LzwError::UnexpectedEof { missing }) => {
            assert!(missing > 0 && missing < data.len());
        }
        other => panic!("expected UnexpectedEof, got {other:?}"),
    }
}

#[test]
fn test_compression_effectiveness() {
    let test_cases = vec![
        (b"AAAAAAAAAAAAAAAAAAAA".to_vec(), "all same"),
        (b"ABABABABABABABABABAB".to_vec(), "alternating"),
        (
            b"This is a test. This is a test. This is a test.".to_vec(),
            "repeated phrase",
        ),
    ];

    for (data, description) in test_cases {
        let compressed = compress_tiff(&data).expect("compression failed");
        assert!(
            compressed.len() < data.len(),
            "{} should compress",
            description
        );
        let decompressed = decompress_tiff(&compressed, data.len()).expect("decompression failed");
        assert_eq!(decompressed, data);
    }
}
