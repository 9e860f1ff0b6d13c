//! Property-based test generators using proptest.

use kfs_bus::Offset;
use proptest::prelude::*;

/// Strategy for a single message payload.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

/// Strategy for a batch of payloads as a partition might hold.
pub fn payload_batch_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(payload_strategy(), 0..32)
}

/// Strategy for a read window size, including windows smaller than a record.
pub fn window_strategy() -> impl Strategy<Value = usize> {
    0usize..256
}

/// Strategy for valid topic names.
pub fn topic_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9._-]{0,31}").expect("Invalid regex")
}

/// Strategy for boundary offsets `(oldest, newest)` with `newest >= oldest`.
pub fn boundary_strategy() -> impl Strategy<Value = (Offset, Offset)> {
    (0..Offset::MAX / 2, 0..Offset::MAX / 2).prop_map(|(oldest, span)| (oldest, oldest + span))
}

/// Frames payloads the way reads do: each payload followed by `separator`.
pub fn framed(payloads: &[Vec<u8>], separator: u8) -> Vec<u8> {
    let mut out = Vec::new();
    for payload in payloads {
        out.extend_from_slice(payload);
        out.push(separator);
    }
    out
}
