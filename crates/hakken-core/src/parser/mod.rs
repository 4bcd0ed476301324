pub mod heuristic;
pub mod tokenizer;

pub use heuristic::HeuristicTokenizer;
pub use tokenizer::Tokenizer;
