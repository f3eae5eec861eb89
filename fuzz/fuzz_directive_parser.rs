//! Fuzz target for the conditional-directive tree builder.
//!
//! Run with: cargo +nightly fuzz run fuzz_directive_parser
//!
//! This exercises `DirectiveTree::parse()` with arbitrary byte sequences to
//! find panics, hangs, or runaway allocation in the scanner and tree
//! builder. Combination synthesis is deliberately not called here: subset
//! enumeration is exponential in path length, so adversarial inputs would
//! time out without indicating a bug.

#![no_main]

use libfuzzer_sys::fuzz_target;

use srcimport_core::DirectiveTree;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    // Errors are fine; panics are not.
    let _ = DirectiveTree::parse(source);
});
