//! Reshapes the model's raw text into the relay's response.
//!
//! The prompt asks for `{"reply_text": ..., "recommended_products": [...]}`,
//! but models routinely wrap JSON in a markdown fence, answer with a bare
//! array, or ignore the contract entirely and write prose. Everything here
//! degrades to a plain-text reply rather than an error.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::catalog::{Product, RecommendResponse};

/// Reply when the model recommends nothing from the catalog.
pub const NO_MATCH_REPLY: &str =
    "Sorry, I couldn't find a product matching your request. Try asking about something else.";

/// Reply when the upstream answered with no candidate text at all. A
/// degenerate-but-successful outcome, not an error.
pub const EMPTY_REPLY: &str =
    "Sorry, I can't come up with a recommendation right now. Please try again in a moment.";

/// Opening line used when the model recommends products but forgot the
/// friendly sentence it was asked for.
pub const DEFAULT_MATCH_REPLY: &str =
    "Here are the products that best match what you're looking for.";

static JSON_FENCE: OnceLock<Regex> = OnceLock::new();

fn json_fence() -> &'static Regex {
    // One optional fence at the start of the text; this is deliberately not
    // a markdown parser.
    JSON_FENCE.get_or_init(|| Regex::new(r"(?s)^\s*```(?:json|JSON)?\s*\n?(.*?)\s*```").unwrap())
}

/// Extracts the interior of a leading triple-backtick JSON fence, or returns
/// the text unchanged when no fence is present.
#[must_use]
pub fn strip_json_fence(text: &str) -> &str {
    match json_fence().captures(text) {
        Some(caps) => caps.get(1).map_or(text, |m| m.as_str()),
        None => text,
    }
}

/// Maps the model's raw text onto the relay's response shape.
///
/// Products are matched by exact name against `catalog`, the result keeps
/// `catalog` order (not the order the model listed names in), and duplicate
/// names are not deduplicated.
#[must_use]
pub fn interpret(
    raw: &str,
    catalog: &[Product],
) -> RecommendResponse {
    let candidate = strip_json_fence(raw);

    let Ok(value) = serde_json::from_str::<Value>(candidate) else {
        // Not JSON: the whole text is the reply.
        return RecommendResponse::reply(raw);
    };

    match value {
        Value::Object(fields) => {
            if let Some(Value::Array(names)) = fields.get("recommended_products") {
                let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
                let picked: Vec<Product> = catalog
                    .iter()
                    .filter(|product| names.contains(&product.name.as_str()))
                    .cloned()
                    .collect();

                let reply_text = fields.get("reply_text").and_then(Value::as_str);

                if picked.is_empty() {
                    return RecommendResponse::reply(reply_text.unwrap_or(NO_MATCH_REPLY));
                }
                return RecommendResponse {
                    reply: Some(reply_text.unwrap_or(DEFAULT_MATCH_REPLY).to_string()),
                    products: Some(picked),
                };
            }

            if let Some(Value::String(text)) = fields.get("text") {
                return RecommendResponse::reply(text);
            }

            RecommendResponse::reply(raw)
        }
        // Alternate shape: the model answered with full product objects;
        // pass them through verbatim, no cross-referencing.
        Value::Array(_) => match serde_json::from_value::<Vec<Product>>(value) {
            Ok(products) => RecommendResponse::products(products),
            Err(_) => RecommendResponse::reply(raw),
        },
        _ => RecommendResponse::reply(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn product(name: &str) -> Product {
        Product {
            name: name.to_string(),
            category: String::new(),
            description: String::new(),
            extra: Map::new(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![product("A"), product("B"), product("C")]
    }

    #[test]
    fn test_clean_json_with_reply_and_products() {
        let response = interpret(r#"{"reply_text":"hi","recommended_products":["A"]}"#, &catalog());

        assert_eq!(response.reply.as_deref(), Some("hi"));
        let products = response.products.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "A");
    }

    #[test]
    fn test_result_follows_catalog_order_not_model_order() {
        let response = interpret(r#"{"recommended_products":["C","A"]}"#, &catalog());

        let products = response.products.unwrap();
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_duplicate_catalog_names_are_kept() {
        let doubled = vec![product("A"), product("A")];
        let response = interpret(r#"{"recommended_products":["A"]}"#, &doubled);

        assert_eq!(response.products.unwrap().len(), 2);
    }

    #[test]
    fn test_missing_reply_text_gets_default_opening() {
        let response = interpret(r#"{"recommended_products":["B"]}"#, &catalog());

        assert_eq!(response.reply.as_deref(), Some(DEFAULT_MATCH_REPLY));
        assert!(response.products.is_some());
    }

    #[test]
    fn test_empty_recommendations_yield_no_match_reply_without_products() {
        let response = interpret(r#"{"reply_text":null,"recommended_products":[]}"#, &catalog());

        assert_eq!(response.reply.as_deref(), Some(NO_MATCH_REPLY));
        assert!(response.products.is_none());
    }

    #[test]
    fn test_empty_recommendations_keep_model_reply_text() {
        let response = interpret(
            r#"{"reply_text":"nothing fits, sorry","recommended_products":[]}"#,
            &catalog(),
        );

        assert_eq!(response.reply.as_deref(), Some("nothing fits, sorry"));
        assert!(response.products.is_none());
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let response = interpret(r#"{"recommended_products":["Nonexistent"]}"#, &catalog());

        assert_eq!(response.reply.as_deref(), Some(NO_MATCH_REPLY));
        assert!(response.products.is_none());
    }

    #[test]
    fn test_fenced_json_parses_like_unfenced() {
        let unfenced = interpret(r#"{"text":"hello"}"#, &catalog());
        let fenced = interpret("```json\n{\"text\":\"hello\"}\n```", &catalog());

        assert_eq!(unfenced.reply, fenced.reply);
        assert_eq!(fenced.reply.as_deref(), Some("hello"));
    }

    #[test]
    fn test_fence_without_language_tag() {
        let response = interpret("```\n{\"text\":\"hello\"}\n```", &catalog());
        assert_eq!(response.reply.as_deref(), Some("hello"));
    }

    #[test]
    fn test_truncated_json_becomes_verbatim_reply() {
        let raw = r#"{"text": "hel"#;
        let response = interpret(raw, &catalog());

        assert_eq!(response.reply.as_deref(), Some(raw));
        assert!(response.products.is_none());
    }

    #[test]
    fn test_prose_becomes_reply() {
        let raw = "I'd suggest the leather sandals, they go with everything.";
        let response = interpret(raw, &catalog());

        assert_eq!(response.reply.as_deref(), Some(raw));
    }

    #[test]
    fn test_direct_array_is_passed_through_verbatim() {
        let raw = r#"[{"name":"Offcatalog","category":"hat","description":"straw","price":9}]"#;
        let response = interpret(raw, &catalog());

        assert!(response.reply.is_none());
        let products = response.products.unwrap();
        assert_eq!(products[0].name, "Offcatalog");
        assert_eq!(products[0].extra.get("price"), Some(&Value::from(9)));
    }

    #[test]
    fn test_array_of_non_products_falls_back_to_reply() {
        let raw = r#"["A","B"]"#;
        let response = interpret(raw, &catalog());

        assert_eq!(response.reply.as_deref(), Some(raw));
    }

    #[test]
    fn test_object_text_shape() {
        let response = interpret(r#"{"text":"just chatting"}"#, &catalog());
        assert_eq!(response.reply.as_deref(), Some("just chatting"));
    }

    #[test]
    fn test_unrecognized_object_becomes_verbatim_reply() {
        let raw = r#"{"verdict":"none"}"#;
        let response = interpret(raw, &catalog());
        assert_eq!(response.reply.as_deref(), Some(raw));
    }

    #[test]
    fn test_scalar_json_becomes_verbatim_reply() {
        let response = interpret("42", &catalog());
        assert_eq!(response.reply.as_deref(), Some("42"));
    }

    #[test]
    fn test_non_string_names_are_skipped() {
        let response = interpret(r#"{"recommended_products":[1,"B",null]}"#, &catalog());

        let products = response.products.unwrap();
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["B"]);
    }

    #[test]
    fn test_strip_fence_leaves_plain_text_alone() {
        assert_eq!(strip_json_fence("no fence here"), "no fence here");
    }

    #[test]
    fn test_strip_fence_ignores_mid_text_fences() {
        let text = "some prose first\n```json\n{\"text\":\"x\"}\n```";
        assert_eq!(strip_json_fence(text), text);
    }
}
