//! Project data model
//!
//! Compilation units, their source files, and the edits pending against them.

mod unit;

pub use unit::*;
