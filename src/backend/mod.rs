//! Engine implementations.

pub mod memory;
