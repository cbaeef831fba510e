//! Per-file strictness levels.

use std::fmt;

/// How strictly a file asked to be checked.
///
/// Levels are ordered: a file at a higher level opts into every check of the
/// levels below it. Diagnostics carry a minimum level and are suppressed in
/// files below it.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum StrictLevel {
    /// No sigil declared.
    #[default]
    None,
    /// `# typed: false` — parse and namespace errors only.
    False,
    /// `# typed: true` — resolver and inference errors.
    True,
    /// `# typed: strict` — additionally require annotations.
    Strict,
    /// `# typed: strong` — no untyped values at all.
    Strong,
}

impl fmt::Display for StrictLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrictLevel::None => "none",
            StrictLevel::False => "false",
            StrictLevel::True => "true",
            StrictLevel::Strict => "strict",
            StrictLevel::Strong => "strong",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(StrictLevel::None < StrictLevel::False);
        assert!(StrictLevel::False < StrictLevel::True);
        assert!(StrictLevel::True < StrictLevel::Strict);
        assert!(StrictLevel::Strict < StrictLevel::Strong);
    }
}
