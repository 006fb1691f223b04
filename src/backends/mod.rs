//! Persistence backend abstraction
//!
//! The engine consumes storage through the [`Backend`] capability trait and
//! never generates SQL itself. `MemoryBackend` is a complete in-memory
//! implementation for development and testing.

pub mod core;
pub mod memory;

pub use self::core::*;
pub use self::memory::*;
