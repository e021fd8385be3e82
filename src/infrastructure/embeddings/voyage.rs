use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use crate::infrastructure::embeddings::status_error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct VoyageProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct VoyageRequest<'a> {
    input: &'a [String],
    model: &'a str,
    input_type: &'static str,
}

#[derive(Deserialize)]
struct VoyageResponse {
    data: Vec<VoyageEmbedding>,
}

#[derive(Deserialize)]
struct VoyageEmbedding {
    index: usize,
    embedding: Vec<f32>,
}

impl VoyageProvider {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| "voyage-3-lite".to_string()),
            base_url: base_url.unwrap_or_else(|| "https://api.voyageai.com".to_string()),
        }
    }

    fn model_dimension(model: &str) -> usize {
        match model {
            "voyage-3" | "voyage-code-3" => 1024,
            "voyage-3-large" | "voyage-large-2" => 1536,
            _ => 512,
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for VoyageProvider {
    async fn embed(
        &self,
        texts: &[String],
        input_type: InputType,
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        // Markets are indexed as documents, headlines are matched as queries.
        let input_type = match input_type {
            InputType::Document => "document",
            InputType::Query => "query",
        };

        let resp = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&VoyageRequest {
                input: texts,
                model: &self.model,
                input_type,
            })
            .send()
            .await
            .map_err(|e| DomainError::TransientFetch(format!("Voyage request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error("Voyage", status, &body));
        }

        let mut result: VoyageResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Embedding(format!("Voyage response parse error: {e}")))?;
        if result.data.len() != texts.len() {
            return Err(DomainError::Embedding(format!(
                "Voyage returned {} embeddings for {} inputs",
                result.data.len(),
                texts.len()
            )));
        }
        result.data.sort_by_key(|d| d.index);
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        Self::model_dimension(&self.model)
    }
}
