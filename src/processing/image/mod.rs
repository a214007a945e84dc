//! Image conversion via the `image` crate.
//!
//! - [`convert_image`]: decode → filters → resample → encode for one file.
//! - [`filters`]: CSS-equivalent brightness/contrast/saturate.
//! - [`formats`]: target-specific encoders and quality mapping.

mod executor;
pub mod filters;
pub mod formats;
mod resize;

pub use executor::convert_image;
