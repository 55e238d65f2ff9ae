//! Vercel serverless function for the storefront recommendation relay.
//!
//! Receives a chat message plus a product-catalog excerpt, forwards both to
//! the Gemini API, and reshapes the model's reply into the response the chat
//! widget expects. Runs as a serverless function on Vercel; the request gate
//! itself lives in `chat_to_products::vercel`.

use chat_to_products::config::RelayConfig;
use chat_to_products::upstream::GeminiClient;
use chat_to_products::vercel;
use tracing_subscriber::fmt;
use vercel_runtime::{Error, Request, run};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing
    fmt().with_max_level(tracing::Level::INFO).init();
    dotenvy::dotenv().ok();

    // Read once at cold start; a missing key is logged here and the first
    // outbound call fails upstream instead of crashing the function.
    let config = RelayConfig::from_env();
    let client = GeminiClient::from_config(&config);

    tracing::info!(model = %config.model, "Starting chat-to-products serverless function");

    run(move |req: Request| {
        let config = config.clone();
        let client = client.clone();
        async move { vercel::handle(req, &config, &client).await }
    })
    .await
}
