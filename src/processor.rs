//! Relay orchestration shared by the standalone server and the serverless
//! function: build the prompt, spend exactly one upstream call, reshape the
//! reply.

use crate::catalog::{RecommendRequest, RecommendResponse};
use crate::error::ApiError;
use crate::interpret;
use crate::prompt::PromptBuilder;
use crate::upstream::GenerativeApi;

/// Runs one validated request through the relay.
///
/// Callers gate first (method, body shape, non-empty message) so an invalid
/// request never reaches the upstream.
///
/// # Errors
///
/// Returns `ApiError::Upstream` when the model provider fails and
/// `ApiError::InternalServerError` when the catalog cannot be serialized.
/// Upstream shape problems and unparseable model text are recovered into
/// successful replies, never errors.
pub async fn process_recommendation(
    request: &RecommendRequest,
    upstream: &dyn GenerativeApi,
) -> Result<RecommendResponse, ApiError> {
    let prompt = PromptBuilder::recommendation_prompt(&request.message, &request.context)
        .map_err(|e| ApiError::internal_server_error(format!("failed to serialize catalog: {e}")))?;

    tracing::debug!(
        prompt_len = prompt.len(),
        products = request.context.len(),
        "calling generative API"
    );

    match upstream.generate(&prompt).await? {
        Some(raw) => Ok(interpret::interpret(&raw, &request.context)),
        None => Ok(RecommendResponse::reply(interpret::EMPTY_REPLY)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use crate::upstream::scripted::ScriptedUpstream;
    use serde_json::Map;

    fn product(
        name: &str,
        category: &str,
    ) -> Product {
        let mut extra = Map::new();
        extra.insert("price".to_string(), serde_json::Value::from(149_000));

        Product {
            name: name.to_string(),
            category: category.to_string(),
            description: "x".to_string(),
            extra,
        }
    }

    fn request() -> RecommendRequest {
        RecommendRequest {
            message: "recommend sandals".to_string(),
            context: vec![product("Boehajj", "sandal"), product("Shirt", "apparel")],
        }
    }

    #[tokio::test]
    async fn test_matching_reply_returns_filtered_products() {
        let upstream = ScriptedUpstream::replying(r#"{"reply_text":"try these","recommended_products":["Boehajj"]}"#);

        let response = process_recommendation(&request(), &upstream).await.unwrap();

        assert_eq!(response.reply.as_deref(), Some("try these"));
        let products = response.products.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Boehajj");
        // the full product object comes back, passthrough fields included
        assert!(products[0].extra.contains_key("price"));
        assert_eq!(upstream.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_recommendations_return_reply_only() {
        let upstream = ScriptedUpstream::replying(r#"{"recommended_products":[]}"#);

        let response = process_recommendation(&request(), &upstream).await.unwrap();

        assert!(response.reply.is_some());
        assert!(response.products.is_none());
    }

    #[tokio::test]
    async fn test_silent_upstream_maps_to_apology() {
        let upstream = ScriptedUpstream::silent();

        let response = process_recommendation(&request(), &upstream).await.unwrap();

        assert_eq!(response.reply.as_deref(), Some(interpret::EMPTY_REPLY));
        assert!(response.products.is_none());
    }

    #[tokio::test]
    async fn test_upstream_failure_surfaces_message() {
        let upstream = ScriptedUpstream::failing(503, "overloaded");

        let err = process_recommendation(&request(), &upstream).await.unwrap_err();

        assert_eq!(err.status(), 500);
        assert!(err.message().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_prompt_sent_upstream_omits_passthrough_fields() {
        let upstream = ScriptedUpstream::replying(r#"{"recommended_products":[]}"#);

        process_recommendation(&request(), &upstream).await.unwrap();

        let prompts = upstream.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("recommend sandals"));
        assert!(prompts[0].contains("Boehajj"));
        assert!(prompts[0].contains("Shirt"));
        assert!(!prompts[0].contains("149000"));
        assert!(!prompts[0].contains("price"));
    }

    #[tokio::test]
    async fn test_prose_reply_passes_through_verbatim() {
        let upstream = ScriptedUpstream::replying("Honestly, go with the sandals.");

        let response = process_recommendation(&request(), &upstream).await.unwrap();

        assert_eq!(response.reply.as_deref(), Some("Honestly, go with the sandals."));
    }
}
