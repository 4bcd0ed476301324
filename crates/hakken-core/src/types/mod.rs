pub mod element;
pub mod episode;
pub mod id;

pub use element::{Element, ElementKind};
pub use episode::ParsedEpisode;
pub use id::AnimeId;
