//! fsprobe - file content round-trip verifier
//!
//! Writes a known payload to a fresh file, rereads it through an independent
//! handle and confirms byte-for-byte equality. Failures come back as values
//! tagged with the stage (create, write, read) that detected them.

pub mod chaos;
pub mod cli;
pub mod config;
pub mod payload;
pub mod report;
pub mod verifier;

pub use payload::Payload;
pub use verifier::{verify, RoundTripVerifier, Stage, VerificationResult};
