use crate::domain::error::DomainError;

/// Durable embedding cache keyed by market id. Append-only upsert.
pub trait VectorStore: Send + Sync {
    fn store(&self, id: &str, vector: &[f32]) -> Result<(), DomainError>;
    fn load_all(&self) -> Result<Vec<(String, Vec<f32>)>, DomainError>;
    fn get_stored_dimension(&self) -> Result<Option<usize>, DomainError>;
}
