use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// A product from the storefront catalog.
///
/// The relay only ever inspects `name`, `category` and `description`.
/// Everything else the frontend sends (id, imageUrl, price, rating,
/// marketplace links, ...) is collected into `extra` and preserved verbatim
/// when the product is echoed back. Products are matched by exact `name`
/// equality; duplicate names are kept as-is.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    #[cfg_attr(feature = "server", schema(value_type = Object))]
    pub extra: Map<String, Value>,
}

/// Inbound request body: the customer's chat message plus the catalog
/// excerpt the widget currently shows.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct RecommendRequest {
    pub message: String,
    pub context: Vec<Product>,
}

impl RecommendRequest {
    /// Checks the fields serde cannot: an empty `context` is fine, an empty
    /// `message` is not.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::BadRequest` when `message` is empty or whitespace.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.message.trim().is_empty() {
            return Err(ApiError::bad_request("Message must be a non-empty string"));
        }
        Ok(())
    }
}

/// Outbound response body.
///
/// Observable shapes are `{reply}`, `{products}` and `{reply, products}`;
/// absent fields are omitted from the JSON entirely.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct RecommendResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
}

impl RecommendResponse {
    #[must_use]
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            products: None,
        }
    }

    #[must_use]
    pub fn products(products: Vec<Product>) -> Self {
        Self {
            reply: None,
            products: Some(products),
        }
    }
}
