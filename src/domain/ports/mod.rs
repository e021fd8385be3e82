pub mod embedding_port;
pub mod match_repository;
pub mod relevance_service;
pub mod trade_repository;
pub mod vector_store;
