//! # Utilities Module
//!
//! Geometry helpers shared by the tilemap, physics and entities.

pub mod math;

pub use math::*;
