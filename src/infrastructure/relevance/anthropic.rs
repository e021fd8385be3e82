use crate::domain::entities::market::Market;
use crate::domain::entities::signal::Signal;
use crate::domain::error::DomainError;
use crate::domain::ports::relevance_service::RelevanceService;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = "You judge whether a news headline bears on a prediction market. \
Answer with a single raw JSON object and nothing else: no markdown, no code fences, no commentary.";

/// Relevance assessment backed by the Anthropic messages API.
pub struct AnthropicRelevance {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<RequestMessage>,
}

#[derive(Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicRelevance {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| "claude-3-5-haiku-latest".to_string()),
            base_url: base_url.unwrap_or_else(|| "https://api.anthropic.com".to_string()),
        }
    }

    pub fn build_prompt(signal: &Signal, market: &Market) -> String {
        let fmt_price = |outcome: &str| {
            market
                .outcome_price(outcome)
                .map(|p| format!("{p:.3}"))
                .unwrap_or_else(|| "N/A".to_string())
        };
        format!(
            "Headline: {headline}\n\
             Market: {question} - {description}\n\
             Current prices: YES={yes}, NO={no}\n\n\
             Does this headline bear on how the market resolves? If it does, say which outcome it \
             pushes toward (YES or NO) and how confident you are, from 0 to 1.\n\n\
             Reply with exactly this JSON shape:\n\
             {{\"relevant\": bool, \"direction\": \"YES\" | \"NO\" | null, \"confidence\": float, \"reasoning\": \"string\"}}",
            headline = signal.headline,
            question = market.question,
            description = market.description,
            yes = fmt_price("yes"),
            no = fmt_price("no"),
        )
    }
}

#[async_trait]
impl RelevanceService for AnthropicRelevance {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn assess(&self, signal: &Signal, market: &Market) -> Result<String, DomainError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: 256,
            system: SYSTEM_PROMPT,
            messages: vec![RequestMessage {
                role: "user",
                content: Self::build_prompt(signal, market),
            }],
        };

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::TransientFetch(format!("Relevance request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let msg = format!("Relevance API {status}: {body}");
            return Err(if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                DomainError::TransientFetch(msg)
            } else {
                DomainError::Config(msg)
            });
        }

        let body: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::TransientFetch(format!("Relevance response unreadable: {e}")))?;
        let text = body
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_prices_and_shape() {
        let signal = Signal::new("s1", "Fed signals rate cut", "wire");
        let mut market = Market::new("m1", "Will the Fed cut rates in March?");
        market.outcome_prices = vec![0.41, 0.59];

        let prompt = AnthropicRelevance::build_prompt(&signal, &market);
        assert!(prompt.contains("Fed signals rate cut"));
        assert!(prompt.contains("YES=0.410, NO=0.590"));
        assert!(prompt.contains("\"relevant\": bool"));
    }

    #[test]
    fn test_prompt_without_prices() {
        let signal = Signal::new("s1", "Headline", "wire");
        let market = Market::new("m1", "Question?");
        assert!(AnthropicRelevance::build_prompt(&signal, &market).contains("YES=N/A, NO=N/A"));
    }
}
