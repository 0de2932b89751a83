//! Core value types
//!
//! - [`AttributeCoordinate`]: validated (group, element) address parsed from a tag expression
//! - [`PixelFrame`]: one decoded frame of 16-bit grayscale samples
//! - [`NormalizedImage`]: 8-bit output of the contrast normalizer

mod coordinate;
mod frame;

pub use coordinate::AttributeCoordinate;
pub use frame::{NormalizedImage, PixelFrame};
