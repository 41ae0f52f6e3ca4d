//! ELM (Expression Logical Model) documents for static measure analysis
//!
//! This crate provides:
//! - The library envelope (identifier, statements, value sets, codes)
//! - A lenient expression node model that keeps unknown node shapes traversable
//! - JSON loading with structural validation

pub mod library;
pub mod load;
pub mod node;

pub use library::*;
pub use node::*;
