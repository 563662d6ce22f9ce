//! Common utility functions.

pub mod fs;

pub use fs::{expand_path, is_yaml};
