#![no_main]
use libfuzzer_sys::fuzz_target;

use loris_dsl::ast::Process;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(program) = loris_dsl::parse(s, "fuzz.pi") {
            // Canonicalization must terminate, never panic, and be
            // idempotent on every parseable term.
            let mut p = Process::Root {
                next: Box::new(program.root),
            };
            loris_engine::congruence::canonicalize(&mut p);
            let mut again = p.clone();
            loris_engine::congruence::canonicalize(&mut again);
            assert_eq!(p, again);
        }
    }
});
