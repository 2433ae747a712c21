//! Pixel to sky transforms for the FITS WCS sidecars that accompany
//! drizzled HST images.
//!
//! Only what those headers use is supported: CD or PC+CDELT matrices, the
//! zenithal projections and forward SIP distortion.

pub mod builder;
pub mod coordinate;
pub mod error;
pub mod header;
pub mod linear;
pub mod projection;
pub mod rotation;
pub mod sip;

pub use builder::{Wcs, WcsBuilder};
pub use coordinate::{CelestialCoord, IntermediateCoord, NativeCoord, PixelCoord};
pub use error::{WcsError, WcsResult};
pub use header::{KeywordMap, KeywordProvider, KeywordValue, TextHeader};
pub use linear::LinearTransform;
pub use projection::Projection;
pub use rotation::SphericalRotation;
pub use sip::SipDistortion;
