use thiserror::Error;

/// Errors that can occur while extracting elements from a filename.
#[derive(Debug, Error)]
pub enum HakkenError {
    /// The input string is empty or contains only whitespace.
    #[error("input is empty or whitespace-only")]
    EmptyInput,

    /// The tokenizer could not make sense of the input.
    #[error("failed to extract elements from input: {input:?}")]
    TokenizeFailed {
        /// The input that could not be tokenized.
        input: String,
    },

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),
}

/// Result type alias for Hakken core operations.
pub type Result<T> = std::result::Result<T, HakkenError>;
