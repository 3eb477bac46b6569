//! Uniform grid aggregation of weighted points.

pub mod aggregate;
pub mod anchor;
pub mod config;
pub mod memo;

pub use aggregate::*;
pub use anchor::*;
pub use config::*;
pub use memo::*;
