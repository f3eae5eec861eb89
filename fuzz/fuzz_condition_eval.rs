//! Fuzz target for the directive-condition parser and evaluator.
//!
//! Run with: cargo +nightly fuzz run fuzz_condition_eval

#![no_main]

use std::collections::HashSet;

use libfuzzer_sys::fuzz_target;

use srcimport_core::syntax::condition::Condition;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(condition) = Condition::parse(text) else {
        return;
    };

    let empty = HashSet::new();
    let all: HashSet<String> = condition.identifiers().iter().cloned().collect();
    let _ = condition.eval(&empty);
    let _ = condition.eval(&all);
});
