//! The languages a visitor can pick in the playground.

use std::fmt;
use std::str::FromStr;

use crate::error::PlaygroundError;

/// A selectable source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    JavaScript,
    Python,
}

impl Language {
    /// All languages, in the order the selector lists them.
    pub const ALL: [Language; 2] = [Language::JavaScript, Language::Python];

    /// The selector value (`"javascript"` or `"python"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = PlaygroundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(Language::JavaScript),
            "python" | "py" => Ok(Language::Python),
            other => Err(PlaygroundError::Config(format!(
                "unknown language '{other}', expected 'javascript' or 'python'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_javascript() {
        assert_eq!(Language::default(), Language::JavaScript);
    }

    #[test]
    fn test_parse_selector_values() {
        assert_eq!("javascript".parse::<Language>().unwrap(), Language::JavaScript);
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!(" py ".parse::<Language>().unwrap(), Language::Python);
        assert!("ruby".parse::<Language>().is_err());
    }

    #[test]
    fn test_display_round_trips_selector_value() {
        for language in Language::ALL {
            assert_eq!(language.to_string().parse::<Language>().unwrap(), language);
        }
    }
}
