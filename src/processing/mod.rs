//! Conversion stages and the batch orchestrator that drives them.

pub mod batch;
pub mod image;
pub mod video;
