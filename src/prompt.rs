use serde::Serialize;
use std::collections::HashMap;

use crate::catalog::Product;

/// The projection of a product that is allowed to reach the model. Keeping
/// the digest to three fields keeps the instruction payload small and keeps
/// prices, image URLs and marketplace links out of the model's reasoning.
#[derive(Serialize)]
struct ProductDigest<'a> {
    name: &'a str,
    category: &'a str,
    description: &'a str,
}

pub struct PromptBuilder;

impl PromptBuilder {
    // Instruction text embedded at compile time
    const RECOMMENDATION_PROMPT: &'static str = include_str!("../templates/recommendation_prompt.txt");

    #[must_use]
    pub fn render(
        template: &str,
        variables: &HashMap<&str, &str>,
    ) -> String {
        let mut result = template.to_string();

        for (key, value) in variables {
            let placeholder = format!("{{{{{key}}}}}");
            result = result.replace(&placeholder, value);
        }

        result
    }

    /// JSON-serializes the name/category/description projection of the
    /// catalog, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn catalog_digest(products: &[Product]) -> serde_json::Result<String> {
        let digest: Vec<ProductDigest<'_>> = products
            .iter()
            .map(|product| ProductDigest {
                name: &product.name,
                category: &product.category,
                description: &product.description,
            })
            .collect();

        serde_json::to_string(&digest)
    }

    /// Builds the full instruction string sent to the model for one request.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if the catalog digest cannot be serialized.
    pub fn recommendation_prompt(
        message: &str,
        products: &[Product],
    ) -> serde_json::Result<String> {
        let catalog = Self::catalog_digest(products)?;

        let mut variables = HashMap::new();
        variables.insert("CATALOG", catalog.as_str());
        variables.insert("QUESTION", message);

        Ok(Self::render(Self::RECOMMENDATION_PROMPT, &variables))
    }
}
