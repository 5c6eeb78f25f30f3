#![no_main]

use libfuzzer_sys::fuzz_target;
use streamsketch::{classify, MembershipFilter, Status};
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let num_bits = (wyhash(data, 0) % 4096) as usize + 1;
    let num_hashes = (wyhash(data, 1) % 16) as u32 + 1;
    let mut filter = MembershipFilter::new(num_bits, num_hashes).unwrap();

    let items: Vec<&str> = text.split(',').collect();
    let results = classify(&mut filter, items.iter().copied());
    for (item, status) in results {
        if status == Status::InvalidInput {
            assert!(item.trim().is_empty());
        } else {
            assert!(filter.contains(item));
        }
    }
});
