//! Fetching and resolving schemas.

use crate::{Error, Fetch, Result};
use async_recursion::async_recursion;
use indexmap::IndexMap;
use jsonschema::{Resource, Validator as JsonschemaValidator};
use serde_json::Value;
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::{Arc, OnceLock},
};
use tokio::sync::{Mutex, OnceCell};
use url::Url;

type Cell = Arc<OnceCell<std::result::Result<Arc<Value>, String>>>;

/// A JSON Schema, along with every schema document it references by url.
pub struct Schema {
    url: String,
    resources: IndexMap<String, Arc<Value>>,
    validator: OnceLock<std::result::Result<JsonschemaValidator, String>>,
}

/// Fetches, resolves, and remembers schemas.
///
/// Each url is fetched at most once for the lifetime of the cache, even when
/// many tasks ask for it at the same time. Failures are remembered as well.
#[derive(Debug)]
pub struct SchemaCache {
    fetch: Box<dyn Fetch>,
    documents: Mutex<HashMap<String, Cell>>,
    schemas: Mutex<HashMap<String, Arc<Schema>>>,
}

impl SchemaCache {
    /// Creates a new, empty cache.
    ///
    /// # Examples
    ///
    /// ```
    /// use ceos_ard_validate::{MemoryFetcher, SchemaCache};
    ///
    /// let cache = SchemaCache::new(MemoryFetcher::new());
    /// ```
    pub fn new(fetch: impl Fetch + 'static) -> SchemaCache {
        SchemaCache {
            fetch: Box::new(fetch),
            documents: Mutex::new(HashMap::new()),
            schemas: Mutex::new(HashMap::new()),
        }
    }

    /// Fetches a schema and everything it references.
    ///
    /// # Examples
    ///
    /// ```
    /// use ceos_ard_validate::{MemoryFetcher, SchemaCache};
    /// use serde_json::json;
    ///
    /// # tokio_test::block_on(async {
    /// let fetcher = MemoryFetcher::new().with_json("https://ceos-ard.test/schema.json", json!({"type": "object"}));
    /// let cache = SchemaCache::new(fetcher);
    /// let schema = cache.fetch("https://ceos-ard.test/schema.json").await.unwrap();
    /// assert_eq!(schema.url(), "https://ceos-ard.test/schema.json");
    /// # })
    /// ```
    pub async fn fetch(&self, url: &str) -> Result<Arc<Schema>> {
        if let Some(schema) = self.schemas.lock().await.get(url) {
            return Ok(schema.clone());
        }
        let mut chain = Vec::new();
        let mut resources = IndexMap::new();
        self.resolve(url.to_string(), &mut chain, &mut resources)
            .await?;
        tracing::debug!(
            "resolved {url} with {} referenced document(s)",
            resources.len() - 1
        );
        let schema = Arc::new(Schema {
            url: url.to_string(),
            resources,
            validator: OnceLock::new(),
        });
        let schema = self
            .schemas
            .lock()
            .await
            .entry(url.to_string())
            .or_insert(schema)
            .clone();
        Ok(schema)
    }

    #[async_recursion]
    async fn resolve(
        &self,
        url: String,
        chain: &mut Vec<String>,
        resources: &mut IndexMap<String, Arc<Value>>,
    ) -> Result<()> {
        if chain.contains(&url) {
            let mut chain = chain.clone();
            chain.push(url);
            return Err(Error::SchemaCycle { chain });
        }
        if resources.contains_key(&url) {
            return Ok(());
        }
        let value = self.document(&url).await?;
        chain.push(url.clone());
        for reference in references(&value, &url) {
            self.resolve(reference, chain, resources).await?;
        }
        let _ = chain.pop();
        let _ = resources.insert(url, value);
        Ok(())
    }

    async fn document(&self, url: &str) -> Result<Arc<Value>> {
        let cell = self
            .documents
            .lock()
            .await
            .entry(url.to_string())
            .or_default()
            .clone();
        cell.get_or_init(|| async {
            tracing::debug!("fetching schema {url}");
            let bytes = self.fetch.fetch(url).await.map_err(|err| err.to_string())?;
            serde_json::from_slice::<Value>(&bytes)
                .map(Arc::new)
                .map_err(|err| format!("malformed json: {err}"))
        })
        .await
        .clone()
        .map_err(|cause| Error::SchemaFetch {
            url: url.to_string(),
            cause,
        })
    }
}

impl Schema {
    /// Returns the url this schema was fetched from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the root schema document.
    pub fn root(&self) -> &Value {
        static NULL: Value = Value::Null;
        // The root is inserted last, after everything it references.
        self.resources
            .get(&self.url)
            .map(|value| value.as_ref())
            .unwrap_or(&NULL)
    }

    /// Returns the urls of every document this schema references, directly or
    /// indirectly.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.resources
            .keys()
            .filter(|url| **url != self.url)
            .map(|url| url.as_str())
    }

    /// Returns the compiled validator, compiling it on first use.
    pub(crate) fn validator(&self) -> std::result::Result<&JsonschemaValidator, &str> {
        self.validator
            .get_or_init(|| self.compile())
            .as_ref()
            .map_err(|err| err.as_str())
    }

    fn compile(&self) -> std::result::Result<JsonschemaValidator, String> {
        let mut root = self.root().clone();
        if let Value::Object(object) = &mut root {
            if !object.contains_key("$id") && !object.contains_key("id") {
                let draft4 = object
                    .get("$schema")
                    .and_then(|schema| schema.as_str())
                    .is_some_and(|schema| schema.contains("draft-04"));
                let key = if draft4 { "id" } else { "$id" };
                let _ = object.insert(key.to_string(), self.url.clone().into());
            }
        }
        let resources = self
            .resources
            .iter()
            .filter(|(url, _)| **url != self.url)
            .map(|(url, value)| {
                Resource::from_contents(value.as_ref().clone())
                    .map(|resource| (url.clone(), resource))
                    .map_err(|err| err.to_string())
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        jsonschema::options()
            .with_resources(resources.into_iter())
            .build(&root)
            .map_err(|err| err.to_string())
    }
}

impl Debug for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("url", &self.url)
            .field("references", &self.references().collect::<Vec<_>>())
            .finish()
    }
}

/// Returns the other schema documents that this one references, in the order
/// they first appear.
///
/// Fragment-only references and references back into the same document are
/// skipped, as are anything that isn't http(s).
fn references(value: &Value, url: &str) -> Vec<String> {
    let base = value
        .get("$id")
        .and_then(|id| id.as_str())
        .and_then(|id| Url::parse(id).ok())
        .or_else(|| Url::parse(url).ok());
    let Some(base) = base else {
        return Vec::new();
    };
    let mut references = Vec::new();
    collect_references(value, &base, url, &mut references, false);
    references
}

/// Keywords whose values are instance data, not subschemas.
const DATA_KEYWORDS: [&str; 4] = ["const", "default", "enum", "examples"];

/// Keywords whose values map names to subschemas.
const NAMED_SCHEMAS: [&str; 5] = [
    "$defs",
    "definitions",
    "dependencies",
    "patternProperties",
    "properties",
];

fn collect_references(
    value: &Value,
    base: &Url,
    url: &str,
    references: &mut Vec<String>,
    names: bool,
) {
    match value {
        Value::Object(object) => {
            for (key, value) in object {
                if names {
                    collect_references(value, base, url, references, false);
                    continue;
                }
                if DATA_KEYWORDS.contains(&key.as_str()) {
                    continue;
                }
                if key == "$ref" {
                    if let Some(reference) = value.as_str() {
                        if let Some(reference) = resolve_reference(reference, base, url) {
                            if !references.contains(&reference) {
                                references.push(reference);
                            }
                        }
                        continue;
                    }
                }
                let names = NAMED_SCHEMAS.contains(&key.as_str());
                collect_references(value, base, url, references, names);
            }
        }
        Value::Array(array) => {
            for value in array {
                collect_references(value, base, url, references, false);
            }
        }
        _ => {}
    }
}

fn resolve_reference(reference: &str, base: &Url, url: &str) -> Option<String> {
    if reference.starts_with('#') {
        return None;
    }
    let mut resolved = base.join(reference).ok()?;
    resolved.set_fragment(None);
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    let resolved = String::from(resolved);
    if resolved == url || resolved == base.as_str().trim_end_matches('#') {
        None
    } else {
        Some(resolved)
    }
}
