//! Library surface of the `gw-server` binary, split out so the wiring
//! pipeline (config → adapters → registry → executor) can be exercised as
//! a cross-module integration test without spawning the process.

#![forbid(unsafe_code)]

pub mod wiring;
