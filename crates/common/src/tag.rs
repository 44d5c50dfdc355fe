use std::fmt;

/// The component an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Parser,
    Registry,
    Assembly,
    Scheduler,
    Viewer,
}

impl Component {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parser => "shape-parser",
            Self::Registry => "quarter-registry",
            Self::Assembly => "shape-assembly",
            Self::Scheduler => "render-scheduler",
            Self::Viewer => "shape-viewer",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every error type so callers can tell which component failed
/// without matching on the concrete enum.
pub trait Tagged {
    fn component(&self) -> Component;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_names_are_distinct() {
        let all = [
            Component::Parser,
            Component::Registry,
            Component::Assembly,
            Component::Scheduler,
            Component::Viewer,
        ];
        let mut names: Vec<_> = all.iter().map(|c| c.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(Component::Registry.to_string(), "quarter-registry");
    }
}
