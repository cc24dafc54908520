//! Shared data models for NVMe backends

mod controller;
mod firmware;

pub use controller::*;
pub use firmware::*;
