//! Structural comparison of two system descriptions.
//!
//! ## Entry point
//!
//! ```ignore
//! use sysdesc_core::compare::compare_scope;
//!
//! let comparison = compare_scope(&desc1, &desc2, "packages")?;
//! let only_left = comparison.as_description(Side::One);
//! ```
//!
//! ## Partition
//!
//! For a scope present on both sides, every element lands in exactly one of
//! `only_in1`, `only_in2`, one side of a `changed` pair, or `common`.
//! Elements are paired by the identity fields of their kind (`name` for most,
//! `alias` for repositories). Relative order of the inputs is preserved.
//!
//! This holds for sequences without duplicate identities. `common` is the
//! full-equality intersection of the untouched inputs, computed apart from
//! the pairing, so when one side repeats an identity an element can show up
//! both in `common` and in `only_in1`/`only_in2` or a changed pair.

pub mod engine;
pub mod model;

pub use engine::{compare_descriptions, compare_scope, extract_changed};
pub use model::{Comparison, Side};
