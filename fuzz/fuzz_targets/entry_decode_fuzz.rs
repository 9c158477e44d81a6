//! Fuzz test for cache entry decoding
//!
//! Feeds arbitrary blobs to the entry decoder. Whatever the store hands back,
//! decoding must either yield a well-formed entry or report a miss, and
//! classifying a decoded entry must never panic.
//!
//! Run with: cargo +nightly fuzz run entry_decode_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use statline_cache::{CacheEntry, CacheRead};

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        if let Some(entry) = CacheEntry::<serde_json::Value>::decode(raw) {
            let metadata = entry.metadata;

            // Anything decoded must encode again
            assert!(entry.encode().is_ok(), "decoded entry failed to encode");

            for now in [metadata.stored_at, metadata.stale_at, metadata.expires_at, i64::MIN, i64::MAX] {
                let _ = metadata.freshness_at(now);
            }

            let read = CacheRead::fresh(entry.value);
            assert!(read.is_hit());
        }
    }
});
