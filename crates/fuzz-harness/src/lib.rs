//! SX9 Orbital Fuzz Harness
//!
//! Property-based testing infrastructure for the orbital and link libraries.
//! Provides domain strategies, a seeded runner for CLI sweeps, and the named
//! fuzz targets both of them execute.
//!
//! # Usage
//!
//! ```rust
//! use fuzz_harness::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn my_fuzz_test(el in elevation_deg()) {
//!         prop_assert!(el > 0.0);
//!     }
//! }
//! ```

pub mod generators;
pub mod runner;
pub mod targets;

pub mod prelude {
    pub use crate::generators::*;
    pub use crate::runner::{FuzzConfig, FuzzFailure, FuzzResult, FuzzRunner};
    pub use proptest::prelude::*;
}

// Re-export proptest for convenience
pub use proptest;
