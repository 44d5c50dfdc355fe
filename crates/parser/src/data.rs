use serde::Serialize;
use std::fmt;

/// The kind of a quarter: which mesh fragment it is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum QuarterType {
    Circle,
    Rect,
    Wind,
    Star,
    Pin,
    Crystal,
    Empty,
}

impl QuarterType {
    pub const ALL: [QuarterType; 7] = [
        Self::Circle,
        Self::Rect,
        Self::Wind,
        Self::Star,
        Self::Pin,
        Self::Crystal,
        Self::Empty,
    ];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'C' => Some(Self::Circle),
            'R' => Some(Self::Rect),
            'W' => Some(Self::Wind),
            'S' => Some(Self::Star),
            'P' => Some(Self::Pin),
            'c' => Some(Self::Crystal),
            '-' => Some(Self::Empty),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Circle => 'C',
            Self::Rect => 'R',
            Self::Wind => 'W',
            Self::Star => 'S',
            Self::Pin => 'P',
            Self::Crystal => 'c',
            Self::Empty => '-',
        }
    }
}

/// The paint code of a quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum QuarterColor {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Cyan,
    White,
    /// `u`: a shape part that was never painted.
    Uncolored,
    /// `-`: no paint at all, used by pins.
    Empty,
}

impl QuarterColor {
    pub const ALL: [QuarterColor; 9] = [
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::Yellow,
        Self::Purple,
        Self::Cyan,
        Self::White,
        Self::Uncolored,
        Self::Empty,
    ];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'r' => Some(Self::Red),
            'g' => Some(Self::Green),
            'b' => Some(Self::Blue),
            'y' => Some(Self::Yellow),
            'p' => Some(Self::Purple),
            'c' => Some(Self::Cyan),
            'w' => Some(Self::White),
            'u' => Some(Self::Uncolored),
            '-' => Some(Self::Empty),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Red => 'r',
            Self::Green => 'g',
            Self::Blue => 'b',
            Self::Yellow => 'y',
            Self::Purple => 'p',
            Self::Cyan => 'c',
            Self::White => 'w',
            Self::Uncolored => 'u',
            Self::Empty => '-',
        }
    }
}

/// One of the four rotational slots within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ShapeQuarterData {
    pub kind: QuarterType,
    pub color: QuarterColor,
}

impl fmt::Display for ShapeQuarterData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.as_char(), self.color.as_char())
    }
}

/// One decoded layer. Quarter index is the rotational position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeLayerData {
    source: String,
    quarters: Vec<ShapeQuarterData>,
}

impl ShapeLayerData {
    pub(crate) fn new(source: &str, quarters: Vec<ShapeQuarterData>) -> Self {
        Self {
            source: source.to_string(),
            quarters,
        }
    }

    /// The layer segment this layer was decoded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn quarters(&self) -> &[ShapeQuarterData] {
        &self.quarters
    }

    pub fn quarter(&self, index: usize) -> Option<&ShapeQuarterData> {
        self.quarters.get(index)
    }
}

impl fmt::Display for ShapeLayerData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for quarter in &self.quarters {
            write!(f, "{quarter}")?;
        }
        Ok(())
    }
}

/// A decoded shape: layers bottom to top.
///
/// Only [`crate::decode`] constructs this type, so holding one proves the
/// identifier passed the grammar gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeData {
    identifier: String,
    layers: Vec<ShapeLayerData>,
}

impl ShapeData {
    pub(crate) fn new(identifier: &str, layers: Vec<ShapeLayerData>) -> Self {
        Self {
            identifier: identifier.to_string(),
            layers,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn layers(&self) -> &[ShapeLayerData] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&ShapeLayerData> {
        self.layers.get(index)
    }

    pub fn quarter(&self, layer: usize, quarter: usize) -> Option<&ShapeQuarterData> {
        self.layer(layer).and_then(|l| l.quarter(quarter))
    }

    /// Iterate every quarter with its `(layer, quarter)` position.
    pub fn quarters(&self) -> impl Iterator<Item = (usize, usize, &ShapeQuarterData)> + '_ {
        self.layers.iter().enumerate().flat_map(|(i, layer)| {
            layer
                .quarters()
                .iter()
                .enumerate()
                .map(move |(j, quarter)| (i, j, quarter))
        })
    }
}

/// Re-encodes from the decoded structure, not from the stored identifier.
impl fmt::Display for ShapeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, layer) in self.layers.iter().enumerate() {
            if i > 0 {
                f.write_str(crate::LAYER_SEPARATOR)?;
            }
            write!(f, "{layer}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_chars_round_trip() {
        for kind in QuarterType::ALL {
            assert_eq!(QuarterType::from_char(kind.as_char()), Some(kind));
        }
        assert_eq!(QuarterType::from_char('X'), None);
    }

    #[test]
    fn color_chars_round_trip() {
        for color in QuarterColor::ALL {
            assert_eq!(QuarterColor::from_char(color.as_char()), Some(color));
        }
        assert_eq!(QuarterColor::from_char('C'), None);
    }

    #[test]
    fn crystal_and_cyan_share_a_letter_in_different_positions() {
        assert_eq!(QuarterType::from_char('c'), Some(QuarterType::Crystal));
        assert_eq!(QuarterColor::from_char('c'), Some(QuarterColor::Cyan));
    }

    #[test]
    fn quarter_display() {
        let q = ShapeQuarterData {
            kind: QuarterType::Star,
            color: QuarterColor::Yellow,
        };
        assert_eq!(q.to_string(), "Sy");
    }
}
