/// AI assistant handlers
///
/// Thin adapters over the AI client. Public, like the send-message page
/// that uses them; nothing here touches account state.

use actix_web::{web, HttpResponse};

use crate::ai_client::AiClient;
use crate::error::AppError;
use crate::validators::is_valid_message;

#[derive(serde::Deserialize)]
pub struct EnhanceRequest {
    pub content: String,
}

#[derive(serde::Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(serde::Deserialize)]
pub struct AnalyzeRequest {
    pub content: String,
}

/// POST /api/ai/enhance
pub async fn enhance_message(
    form: web::Json<EnhanceRequest>,
    ai_client: web::Data<AiClient>,
) -> Result<HttpResponse, AppError> {
    let content = is_valid_message(&form.content)?;
    let enhanced = ai_client.enhance_message(&content).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Message enhanced successfully",
        "enhanced": enhanced,
    })))
}

/// POST /api/ai/generate
pub async fn generate_message(
    form: web::Json<GenerateRequest>,
    ai_client: web::Data<AiClient>,
) -> Result<HttpResponse, AppError> {
    let prompt = is_valid_message(&form.prompt)?;
    let generated = ai_client.generate_message(&prompt).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Message generated successfully",
        "generated": generated,
    })))
}

/// POST /api/ai/analyze-sentiment
pub async fn analyze_sentiment(
    form: web::Json<AnalyzeRequest>,
    ai_client: web::Data<AiClient>,
) -> Result<HttpResponse, AppError> {
    let content = is_valid_message(&form.content)?;
    let analysis = ai_client.analyze_sentiment(&content).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Sentiment analyzed successfully",
        "analysis": analysis,
    })))
}
