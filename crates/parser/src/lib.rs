//! Shape identifier grammar and decoder.
//!
//! An identifier such as `CwRwCwCw:P-P-P-P-` names up to four stacked layers,
//! bottom first, each holding up to four two-character quarter tokens.
//!
//! # Invariants
//! - Decoding is the only way to obtain a [`ShapeData`].
//! - A rejected identifier never yields a partial result.
//! - Layer and quarter order are preserved exactly; re-encoding a decoded shape
//!   reproduces the identifier it came from.

mod data;
mod decode;
mod error;

pub use data::{QuarterColor, QuarterType, ShapeData, ShapeLayerData, ShapeQuarterData};
pub use decode::{IDENTIFIER_PATTERN, LAYER_SEPARATOR, MAX_LAYERS, MAX_QUARTERS, decode, is_valid};
pub use error::ParseError;

/// Shape shown when a caller does not name one.
pub const DEFAULT_SHAPE: &str = "CwRwCwCw:P-P-P-P-:P-P-P-P-:CcCcCcCc";

pub fn crate_info() -> &'static str {
    "shapez-parser v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("parser"));
    }

    #[test]
    fn default_shape_is_valid() {
        assert!(is_valid(DEFAULT_SHAPE));
    }
}
