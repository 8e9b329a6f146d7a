//! Test Fixtures Module
//!
//! Shared helpers for voice bridge integration tests:
//! - Audio fixtures (programmatically generated)
//! - In-process fake providers with failure injection
//! - Session and configuration builders

// Not every test binary uses every fixture
#![allow(dead_code)]

pub mod audio;
pub mod providers;
pub mod sessions;

pub use audio::*;
pub use providers::*;
pub use sessions::*;
