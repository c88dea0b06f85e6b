//! Types generated at build time from `schemas/`.

/// `schemas/people.json`, package `io.loopholelabs.polyglot.test.data`.
pub mod people {
    include!(concat!(env!("OUT_DIR"), "/people.rs"));
}

/// `schemas/flat.json`, which declares no package.
pub mod flat {
    include!(concat!(env!("OUT_DIR"), "/flat.rs"));
}

pub use people::io::loopholelabs::polyglot::test::data;
