//! # Tokenizer Boundary
//!
//! The recognition engine never looks inside a tokenizer; it only consumes the
//! ordered element list one produces.

use std::sync::Arc;

use crate::error::Result;
use crate::types::Element;

/// Turns a filename into an ordered sequence of labeled elements.
///
/// Implementations must be pure: the same input always yields the same
/// elements, and calls may happen concurrently from scan workers.
pub trait Tokenizer: Send + Sync {
    /// Extracts elements from `input` in extraction order.
    ///
    /// # Errors
    ///
    /// Returns an error when nothing can be extracted. Callers in the
    /// recognition path treat any error as "no elements".
    fn tokenize(&self, input: &str) -> Result<Vec<Element>>;
}

impl<T: Tokenizer + ?Sized> Tokenizer for &T {
    fn tokenize(&self, input: &str) -> Result<Vec<Element>> {
        (**self).tokenize(input)
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for Arc<T> {
    fn tokenize(&self, input: &str) -> Result<Vec<Element>> {
        (**self).tokenize(input)
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for Box<T> {
    fn tokenize(&self, input: &str) -> Result<Vec<Element>> {
        (**self).tokenize(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HakkenError;
    use crate::types::ElementKind;

    struct Fixed;

    impl Tokenizer for Fixed {
        fn tokenize(&self, input: &str) -> Result<Vec<Element>> {
            if input.is_empty() {
                return Err(HakkenError::EmptyInput);
            }
            Ok(vec![Element::new(ElementKind::Title, input)])
        }
    }

    #[test]
    fn smart_pointers_delegate() {
        let boxed: Box<dyn Tokenizer> = Box::new(Fixed);
        assert_eq!(boxed.tokenize("a").unwrap()[0].value(), "a");

        let shared = Arc::new(Fixed);
        assert!(shared.tokenize("").is_err());

        let borrowed = &Fixed;
        assert_eq!(borrowed.tokenize("b").unwrap().len(), 1);
    }
}
