//! Core infrastructure shared by the fetch and install halves
//!
//! Configuration, root locking, terminal output, and progress reporting.

pub mod config;
pub mod lock;
pub mod output;
pub mod progress;
