//! Standalone helpers used around the client.
//!
//! # Modules
//!
//! - [`charset`]: recursive charset conversion
//! - [`geo`]: flat-earth distance between two coordinates

pub mod charset;
pub mod geo;

pub use charset::{CharsetValue, EncodingRsTranscoder, Transcoder, convert, convert_with};
pub use geo::geo_distance;
