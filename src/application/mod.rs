pub mod match_engine;
pub mod paper_trading;
pub mod relevance;
pub mod retry;
pub mod stats;
pub mod vector_index;
