//! Benchmark utilities.

use rand::Rng;

/// Generate a random payload of the specified size.
///
/// The newline separator is never produced so records stay intact.
pub fn random_payload(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen_range(b'!'..=b'~')).collect()
}

/// Generate a batch of payloads of the specified size.
pub fn generate_payloads(count: usize, payload_size: usize) -> Vec<Vec<u8>> {
    (0..count).map(|_| random_payload(payload_size)).collect()
}
