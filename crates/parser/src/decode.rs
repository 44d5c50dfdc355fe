use regex::Regex;
use std::sync::OnceLock;

use crate::data::{QuarterColor, QuarterType, ShapeData, ShapeLayerData, ShapeQuarterData};
use crate::error::ParseError;

/// Grammar gate: one to four layers of one to four `<type><color>` tokens.
pub const IDENTIFIER_PATTERN: &str =
    r"^([CRWSPc-][rgbypcwu-]){1,4}(:([CRWSPc-][rgbypcwu-]){1,4}){0,3}$";

pub const LAYER_SEPARATOR: &str = ":";
pub const MAX_LAYERS: usize = 4;
pub const MAX_QUARTERS: usize = 4;

const TOKEN_LEN: usize = 2;

fn identifier_regex() -> &'static Regex {
    static IDENTIFIER_RE: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER_RE.get_or_init(|| {
        Regex::new(IDENTIFIER_PATTERN).expect("shape identifier regex should compile")
    })
}

/// Whether `identifier` passes the grammar gate.
pub fn is_valid(identifier: &str) -> bool {
    identifier_regex().is_match(identifier)
}

/// Decode a shape identifier.
///
/// The whole string is checked against [`IDENTIFIER_PATTERN`] first; only then
/// is it split into layers on `:`, each layer into two-character tokens left to
/// right, and each token into its type and color characters.
pub fn decode(identifier: &str) -> Result<ShapeData, ParseError> {
    if !is_valid(identifier) {
        tracing::debug!(identifier, "rejected shape identifier");
        return Err(ParseError::malformed(identifier));
    }

    let layers = identifier
        .split(LAYER_SEPARATOR)
        .map(|source| decode_layer(identifier, source))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::trace!(identifier, layers = layers.len(), "decoded shape identifier");
    Ok(ShapeData::new(identifier, layers))
}

impl std::str::FromStr for ShapeData {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

fn decode_layer(identifier: &str, source: &str) -> Result<ShapeLayerData, ParseError> {
    let chars: Vec<char> = source.chars().collect();
    let quarters = chars
        .chunks(TOKEN_LEN)
        .map(|token| decode_token(identifier, token))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ShapeLayerData::new(source, quarters))
}

/// Split one token into type and color. A trailing single-character token has
/// no color and is read as unpainted (`-`).
fn decode_token(identifier: &str, token: &[char]) -> Result<ShapeQuarterData, ParseError> {
    let kind = token
        .first()
        .copied()
        .and_then(QuarterType::from_char)
        .ok_or_else(|| ParseError::malformed(identifier))?;
    let color = match token.get(1) {
        Some(&c) => QuarterColor::from_char(c).ok_or_else(|| ParseError::malformed(identifier))?,
        None => QuarterColor::Empty,
    };
    Ok(ShapeQuarterData { kind, color })
}
