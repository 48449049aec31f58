//! Boolean operations on boundary-representation shells.
//!
//! Shells live in a [`topology::TopologyStore`] and are built with the
//! operations in [`operations::creation`]; [`operations::boolean`] combines
//! them.

pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod tessellation;
pub mod topology;

pub use error::{Result, ShellboolError};
