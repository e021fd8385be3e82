use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy)]
pub enum InputType {
    /// Market text being indexed.
    Document,
    /// Signal headline being matched against the index.
    Query,
}

#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// One vector per input text, in order. An empty vector means "no embedding".
    async fn embed(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError>;
    fn dimension(&self) -> usize;
}
