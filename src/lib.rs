//! lambda-pack library exports for testing.
//!
//! This module exposes internal components for integration testing.

pub mod archive;
pub mod clean;
pub mod commands;
pub mod config;
pub mod package;
pub mod patterns;
pub mod pipenv;
pub mod preflight;
pub mod process;
pub mod timing;
pub mod verify;
