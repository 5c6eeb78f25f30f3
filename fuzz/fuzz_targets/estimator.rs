#![no_main]

use libfuzzer_sys::fuzz_target;
use streamsketch::{CardinalityEstimator, HashWidth};
use wyhash::WyHash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let width = if data[0] & 1 == 0 {
        HashWidth::Bits32
    } else {
        HashWidth::Bits64
    };
    let mut estimator = CardinalityEstimator::<WyHash>::with_hash_width(0.05, width).unwrap();
    for chunk in data[1..].chunks(8) {
        let mut buf = [0u8; 8];
        buf[..chunk.len()].copy_from_slice(chunk);
        // raw hashes exercise every register and rank combination
        estimator.insert_hash(u64::from_le_bytes(buf));
        estimator.insert(chunk);

        let estimate = estimator.estimate();
        assert!(estimate.is_finite());
        assert!(estimate >= 0.0);
    }
});
