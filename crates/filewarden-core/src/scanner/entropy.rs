/// Shannon entropy over a byte-value histogram.
///
/// Computed on raw bytes (never on decoded text) so that binary content
/// such as packed executables or encrypted blobs trends towards 8 bits/byte.

/// Entropy in bits per byte, in `0.0..=8.0`.  Empty input is defined as `0.0`.
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut counts = [0u64; 256];
    for &byte in data {
        counts[byte as usize] += 1;
    }

    let total = data.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum::<f64>()
        // A single distinct byte yields -0.0; normalise so callers can compare with 0.
        .max(0.0)
}
