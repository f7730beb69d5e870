//! # Scroller Common
//!
//! Shared building blocks for the Scroller recipe storage crates.
//!
//! This crate provides:
//! - Item identifiers
//! - The named binary tag codec used for the on-disk recipe files
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
mod mutf8;
pub mod nbt;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::nbt::{Compound, Tag, TagType};
}

pub use prelude::*;
