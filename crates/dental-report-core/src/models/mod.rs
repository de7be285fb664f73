//! Domain models for report generation.

mod branding;
mod options;
mod patient;

pub use branding::*;
pub use options::*;
pub use patient::*;
