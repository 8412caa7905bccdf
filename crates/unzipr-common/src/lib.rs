//! Common utilities for unzipr.
//!
//! This crate provides the foundational types used by the archive crates:
//!
//! - [`BinaryReader`] - Bounds-checked little-endian reading from byte slices
//! - [`crc`] - CRC-32 (ISO-3309 / ZIP polynomial) hashing utilities

mod error;
mod reader;

pub mod crc;

pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
