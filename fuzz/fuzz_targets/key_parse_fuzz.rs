//! Fuzz test for key type inference and stat field parsing
//!
//! Both parsers are total: every input maps to a key type, and every input
//! either names a stat field or is rejected with a validation error.
//!
//! Run with: cargo +nightly fuzz run key_parse_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use statline_cache::{CacheKeyType, TtlPolicy};
use statline_core::StatField;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let key_type = CacheKeyType::from_key(input);
        let policy = TtlPolicy::default();
        assert!(policy.ttl_for(key_type, true) > 0, "every key type has a TTL");
        assert!(policy.provider_ttl_secs(policy.ttl_for(key_type, false)) > 0);

        // A parsed field always prints back to something it parses from
        if let Ok(field) = input.parse::<StatField>() {
            assert_eq!(field.as_str().parse::<StatField>().ok(), Some(field));
        }
    }
});
