//! Narrator Library
//!
//! Fetches text from a JSON API, optionally polishes it with Gemini, turns it
//! into speech with Google TTS, and plays the result.

pub mod config;
pub mod enhance;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod playback;
pub mod tts;
