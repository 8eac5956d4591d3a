//! # WireBox Support
//!
//! Shared utilities used across the WireBox DI crates.
//!
//! This crate provides:
//! - Text rendering for error messages and dependency chains
//! - Common utilities shared between wirebox crates

pub mod rendering;
