/// AI assistant client
///
/// Calls an external generative-language API to enhance or generate
/// feedback messages and to analyze sentiment. Pure request/response; no
/// state is kept anywhere.

use serde::{Deserialize, Serialize};

use crate::configuration::AiSettings;
use crate::error::{AppError, UpstreamError};

#[derive(Clone)]
pub struct AiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

/// Result of sentiment analysis on a feedback message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: String,
    pub confidence: f64,
    pub summary: String,
}

impl AiClient {
    pub fn new(settings: &AiSettings, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        }
    }

    pub fn from_settings(settings: &AiSettings) -> Self {
        Self::new(settings, reqwest::Client::new())
    }

    async fn generate_content(&self, prompt: &str) -> Result<String, AppError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach AI service: {}", e);
                AppError::Upstream(UpstreamError::AiService(e.to_string()))
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!("AI service returned error: {}", e);
                AppError::Upstream(UpstreamError::AiService(e.to_string()))
            })?
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                tracing::error!("Failed to decode AI response: {}", e);
                AppError::Upstream(UpstreamError::AiService(e.to_string()))
            })?;

        extract_text(response).ok_or_else(|| {
            AppError::Upstream(UpstreamError::AiService(
                "response contained no candidates".to_string(),
            ))
        })
    }

    /// Rewrite a feedback message to be clearer and more constructive while
    /// keeping the original intent.
    pub async fn enhance_message(&self, original: &str) -> Result<String, AppError> {
        let prompt = format!(
            "Please enhance the following feedback message to make it more \
             constructive, clear, and professional while maintaining the \
             original intent and sentiment. Keep it concise and respectful. \
             The enhanced message should be between 100-300 characters:\n\n\
             Original message: \"{}\"\n\nEnhanced message:",
            original
        );

        Ok(self.generate_content(&prompt).await?.trim().to_string())
    }

    /// Draft a feedback message from a topic description.
    pub async fn generate_message(&self, topic: &str) -> Result<String, AppError> {
        let prompt = format!(
            "Generate a constructive and professional feedback message based \
             on the following description or topic. Make it specific, \
             actionable, and respectful. The message should be between \
             100-300 characters:\n\nTopic/Description: \"{}\"\n\nFeedback message:",
            topic
        );

        Ok(self.generate_content(&prompt).await?.trim().to_string())
    }

    pub async fn analyze_sentiment(&self, message: &str) -> Result<SentimentAnalysis, AppError> {
        let prompt = format!(
            "Analyze the sentiment of this feedback message and provide a \
             JSON response with the following format:\n\
             {{\"sentiment\": \"positive\" | \"negative\" | \"neutral\", \
             \"confidence\": number between 0 and 1, \
             \"summary\": \"brief summary of the message tone and key points\"}}\n\n\
             Message to analyze: \"{}\"\n\nResponse:",
            message
        );

        let text = self.generate_content(&prompt).await?;
        Ok(parse_sentiment(&text))
    }
}

fn extract_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content
        .parts
        .into_iter()
        .next()
        .map(|part| part.text)
}

/// Models wrap JSON in markdown fences often enough that we strip them
/// before parsing; anything still unparseable falls back to neutral.
fn parse_sentiment(text: &str) -> SentimentAnalysis {
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    serde_json::from_str::<SentimentAnalysis>(trimmed).unwrap_or_else(|_| SentimentAnalysis {
        sentiment: "neutral".to_string(),
        confidence: 0.5,
        summary: "Unable to analyze sentiment".to_string(),
    })
}
