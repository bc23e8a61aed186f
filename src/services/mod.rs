pub mod catalog;
pub mod posters;
pub mod providers;
pub mod recommendations;
pub mod recommender;
pub mod similarity;
pub mod title_search;

pub use catalog::{Catalog, Dataset};
pub use posters::PosterService;
pub use recommender::KBounds;
pub use similarity::{Embeddings, SimilarityIndex, SimilarityMatrix};
