//! Shared engine services used by the locomotion crates.
#![forbid(unsafe_code)]

pub mod logging;
