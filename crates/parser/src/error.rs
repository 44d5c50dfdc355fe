use shapez_common::{Component, Tagged};

/// Errors from decoding a shape identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("[shape-parser] malformed shape identifier `{identifier}`")]
    MalformedIdentifier { identifier: String },
}

impl ParseError {
    pub(crate) fn malformed(identifier: &str) -> Self {
        Self::MalformedIdentifier {
            identifier: identifier.to_string(),
        }
    }

    /// The identifier that was rejected.
    pub fn identifier(&self) -> &str {
        match self {
            Self::MalformedIdentifier { identifier } => identifier,
        }
    }
}

impl Tagged for ParseError {
    fn component(&self) -> Component {
        Component::Parser
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_identifier() {
        let err = ParseError::malformed("X-");
        assert!(err.to_string().contains("`X-`"));
        assert!(err.to_string().starts_with("[shape-parser]"));
        assert_eq!(err.identifier(), "X-");
        assert_eq!(err.component(), Component::Parser);
    }
}
