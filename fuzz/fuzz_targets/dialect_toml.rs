//! Fuzz target for dialect documents.
//!
//! Tries to load arbitrary strings as TOML dialects. Loading may fail but
//! must never panic, and anything that loads must validate.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_dialect_toml
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use quarry_query::Dialect;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(dialect) = Dialect::from_toml_str(source) {
        assert!(dialect.validate().is_ok());
    }
});
