//! Structural validation with [jsonschema].

use crate::{Cause, Error, Schema, Violation};
use serde_json::Value;

/// The path used for violations that concern the whole document.
pub const ROOT_PATH: &str = "";

/// Validates a JSON value against a schema, returning every violation.
///
/// Validation never stops early: all failed constraints are reported. If the
/// schema can't be compiled, a single violation at the document root is
/// returned instead.
///
/// # Examples
///
/// ```
/// use ceos_ard_validate::{MemoryFetcher, SchemaCache, validate_structure};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let fetcher = MemoryFetcher::new().with_json(
///     "https://ceos-ard.test/schema.json",
///     json!({"type": "object", "required": ["id"]}),
/// );
/// let cache = SchemaCache::new(fetcher);
/// let schema = cache.fetch("https://ceos-ard.test/schema.json").await.unwrap();
/// let violations = validate_structure(&json!({}), &schema);
/// assert_eq!(violations.len(), 1);
/// # })
/// ```
pub fn validate(value: &Value, schema: &Schema) -> Vec<Violation> {
    match schema.validator() {
        Ok(validator) => validator
            .iter_errors(value)
            .map(|error| {
                Violation::error(error.instance_path.to_string(), &error, Cause::Structural)
            })
            .collect(),
        Err(cause) => {
            tracing::warn!("could not compile schema {}: {cause}", schema.url());
            vec![Violation::error(
                ROOT_PATH,
                format!("could not apply schema {}: {cause}", schema.url()),
                Cause::SchemaUnavailable,
            )]
        }
    }
}

/// Returns the violation for a schema that couldn't be fetched or resolved.
pub fn unavailable(url: &str, error: &Error) -> Violation {
    tracing::warn!("schema {url} is unavailable: {error}");
    Violation::error(
        ROOT_PATH,
        format!("could not apply schema {url}: {error}"),
        Cause::SchemaUnavailable,
    )
}
