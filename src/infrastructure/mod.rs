pub mod embeddings;
pub mod relevance;
pub mod sqlite;
