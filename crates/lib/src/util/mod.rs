//! Shared utilities.
//!
//! Content hashing used for check memoization, and the identifier/naming
//! helpers shared by the sub-builders and the code generator.

pub mod hash;
pub mod naming;

#[cfg(test)]
pub mod testutil;
