//! Speech engines.
//!
//! Implementations of [`SpeechEngine`](crate::SpeechEngine).
//!
//! # Available Engines
//!
//! - `espeak` - the system espeak-ng (requires the binary on PATH)
//! - `scripted` - in-memory engine without audio, for tests and dry runs

pub mod espeak;
pub mod scripted;
