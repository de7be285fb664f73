//! Vision model seam for dental image analysis.
//!
//! This crate builds the prompts sent to a vision-capable language model,
//! defines the [`VisionModel`] trait the model client implements, and cleans
//! up the free-text answer before it is parsed into report sections.

pub mod prompts;
pub mod analysis;

pub use analysis::*;
pub use prompts::*;
