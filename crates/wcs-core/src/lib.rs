//! Core types and definitions for the weapon control system.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geodetic types, weapon enums, the error taxonomy, inbound commands,
//! outbound events, status snapshots, and configuration. It has no
//! dependency on any runtime framework.

pub mod commands;
pub mod config;
pub mod constants;
pub mod enums;
pub mod errors;
pub mod events;
pub mod state;
pub mod types;
