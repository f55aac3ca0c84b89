//! Integration tests for tasrun core
//!
//! Tests whole scripts through parsing, playback, reloading and
//! save-state gating.

#[cfg(test)]
mod repeat_tests;
