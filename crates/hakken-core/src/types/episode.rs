use std::fmt;

use serde::{Deserialize, Serialize};

use super::element::{Element, ElementKind};

/// Elements extracted from a single filename, in extraction order.
///
/// Created once per recognition request and read-only afterwards. Several
/// elements may share a kind (e.g. competing episode-number guesses); the
/// accessors always prefer the earliest one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedEpisode {
    input: String,
    elements: Vec<Element>,
}

impl ParsedEpisode {
    /// Wraps the tokenizer output for `input`.
    #[must_use]
    pub fn new(input: impl Into<String>, elements: Vec<Element>) -> Self {
        Self {
            input: input.into(),
            elements,
        }
    }

    /// An episode with no elements, used when tokenization failed.
    #[must_use]
    pub fn empty(input: impl Into<String>) -> Self {
        Self::new(input, Vec::new())
    }

    /// The filename these elements were extracted from.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns the first value of `kind`, or `None` if no such element exists.
    #[must_use]
    pub fn find(&self, kind: ElementKind) -> Option<&str> {
        self.elements
            .iter()
            .find(|e| e.kind() == kind)
            .map(Element::value)
    }

    /// Returns the first value of `kind`, or an empty string if absent.
    #[must_use]
    pub fn element(&self, kind: ElementKind) -> &str {
        self.find(kind).unwrap_or("")
    }

    /// Iterates over every value of `kind` in extraction order.
    pub fn all(&self, kind: ElementKind) -> impl Iterator<Item = &str> + '_ {
        self.elements
            .iter()
            .filter(move |e| e.kind() == kind)
            .map(Element::value)
    }

    /// Shortcut for the title element.
    #[must_use]
    pub fn title(&self) -> &str {
        self.element(ElementKind::Title)
    }

    /// Parses the first episode element as a plain number.
    ///
    /// Ranges and versioned numbers ("01-12", "12v2") yield their leading number.
    #[must_use]
    pub fn episode_number(&self) -> Option<u32> {
        let value = self.find(ElementKind::Episode)?;
        let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }
}

impl fmt::Display for ParsedEpisode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParsedEpisode(")?;
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{element}")?;
        }
        write!(f, ")")
    }
}
