//! # chat-to-products
//!
//! A library and HTTP relay that turns storefront chat messages into product
//! recommendations using a generative-language API.
//!
//! The relay receives a customer's chat message together with the product
//! catalog excerpt the widget currently shows, forwards both to the Gemini
//! `generateContent` endpoint as a single prompt, and reshapes the model's
//! free-form reply into something the widget can render: a friendly reply
//! string, a filtered list of the caller's own product objects, or both.
//!
//! ## Features
//!
//! - **Prompt construction**: products are projected down to
//!   name/category/description before they reach the model
//! - **Tolerant interpretation**: fenced JSON, bare prose, and off-contract
//!   shapes from the model all degrade to a plain reply instead of an error
//! - **Two deployment surfaces**: a standalone actix-web server and a Vercel
//!   serverless function, both driving the same core
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! chat-to-products = { version = "0.1", default-features = false }
//! ```
//!
//! ### Basic Example
//!
//! ```rust,no_run
//! use chat_to_products::{Product, RelayClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let client = RelayClient::new("your-api-key", "gemini-2.0-flash");
//!
//!     let catalog: Vec<Product> = serde_json::from_str(
//!         r#"[{"name": "Boehajj", "category": "sandal", "description": "leather sandal"}]"#,
//!     )?;
//!
//!     let response = client.recommend("what goes with a summer dress?", catalog).await?;
//!
//!     if let Some(reply) = response.reply {
//!         println!("{reply}");
//!     }
//!     for product in response.products.unwrap_or_default() {
//!         println!("- {}", product.name);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Server Mode
//!
//! The `server` feature (enabled by default) adds the actix-web binary with
//! Swagger UI and the Vercel function handler:
//!
//! ```bash
//! cargo run
//! ```

// Core modules - always available
pub mod catalog;
pub mod config;
pub mod error;
pub mod interpret;
pub mod processor;
pub mod prompt;
pub mod upstream;

// Re-export commonly used types for easier access
pub use catalog::{Product, RecommendRequest, RecommendResponse};
pub use config::RelayConfig;
pub use error::{ApiError, ErrorResponse};
pub use upstream::{GeminiClient, GenerativeApi, UpstreamError};

// Server-specific modules - only when server feature is enabled
#[cfg(feature = "server")]
pub mod vercel;

/// A high-level client for running the recommendation relay outside HTTP.
///
/// # Example
///
/// ```no_run
/// use chat_to_products::{Product, RelayClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     let client = RelayClient::new("your-api-key", "gemini-2.0-flash");
///     let response = client.recommend("recommend sandals", Vec::<Product>::new()).await?;
///     Ok(())
/// }
/// ```
pub struct RelayClient {
    upstream: GeminiClient,
}

impl RelayClient {
    /// Creates a client against the default Gemini endpoint.
    ///
    /// # Arguments
    ///
    /// * `api_key` - API key for the generative-language API
    /// * `model` - Model identifier (e.g., "gemini-2.0-flash")
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            upstream: GeminiClient::new(Some(api_key.into()), model.into(), config::DEFAULT_ENDPOINT),
        }
    }

    /// Creates a client from a full [`RelayConfig`], including a custom
    /// endpoint.
    #[must_use]
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            upstream: GeminiClient::from_config(config),
        }
    }

    /// Asks the model for recommendations out of `context` for `message`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::BadRequest` for an empty message and
    /// `ApiError::Upstream` when the provider call fails. A model reply that
    /// ignores the JSON contract is not an error; it comes back as a plain
    /// `reply`.
    pub async fn recommend(
        &self,
        message: impl Into<String>,
        context: Vec<Product>,
    ) -> Result<RecommendResponse, ApiError> {
        let request = RecommendRequest {
            message: message.into(),
            context,
        };
        request.validate()?;

        processor::process_recommendation(&request, &self.upstream).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let _client = RelayClient::new("test-api-key", "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn test_recommend_rejects_empty_message() {
        let client = RelayClient::new("test-api-key", "gemini-2.0-flash");

        let err = client.recommend("", vec![]).await.unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_request_serialization_round_trip() {
        let json = r#"{"message":"recommend sandals","context":[{"name":"Boehajj"}]}"#;
        let request: RecommendRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.message, "recommend sandals");
        assert_eq!(request.context.len(), 1);

        let back = serde_json::to_string(&request).unwrap();
        let reparsed: RecommendRequest = serde_json::from_str(&back).unwrap();
        assert_eq!(reparsed.context[0].name, "Boehajj");
    }

    #[test]
    fn test_error_response_structure() {
        let error = ErrorResponse {
            error: "Test error".to_string(),
        };

        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Test error"}));
    }
}
