//! espeak-ng host speech engine.
//!
//! Drives the `espeak-ng` command line tool: one child process per playback
//! request, `--voices` for the voice list, and `-w` for rendering to WAV.
//!
//! # System Requirements
//!
//! **espeak-ng** must be installed on your system (plain `espeak` also works):
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>
//!
//! # Parameter Mapping
//!
//! | Request field | espeak-ng flag | Mapping |
//! |---|---|---|
//! | `voice` | `-v` | the voice's language code, omitted for the default voice |
//! | `rate` | `-s` | `175 wpm × rate` |
//! | `pitch` | `-p` | `50 × pitch`, capped at 99 |

pub mod command;
pub mod engine;
pub mod voices;

pub use command::EspeakConfig;
pub use engine::EspeakEngine;
