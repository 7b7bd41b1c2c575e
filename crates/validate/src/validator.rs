use crate::{
    BuildOptions, Config, Document, ExtensionResolver, Fetch, HttpFetcher, Report, Result,
    SchemaCache, SchemaOutcome, Violation, build, inject, structural,
};
use futures_util::future::join_all;
use serde_json::Value;
use std::sync::Arc;

/// Validates STAC items against CARD4L.
///
/// Fetched schemas are cached for the lifetime of the validator (and all of
/// its clones), so re-use one validator when checking many documents.
#[derive(Debug, Clone)]
pub struct Validator {
    cache: Arc<SchemaCache>,
    resolver: ExtensionResolver,
}

impl Validator {
    /// Creates a new validator that fetches schemas over http.
    ///
    /// # Examples
    ///
    /// ```
    /// use ceos_ard_validate::{Config, Validator};
    ///
    /// let validator = Validator::new(Config::default()).unwrap();
    /// ```
    pub fn new(config: Config) -> Result<Validator> {
        let fetcher = HttpFetcher::new(config.timeout)?;
        Ok(Validator::with_fetcher(fetcher, config))
    }

    /// Creates a new validator that gets its schemas from `fetch`.
    pub fn with_fetcher(fetch: impl Fetch + 'static, config: Config) -> Validator {
        Validator {
            cache: Arc::new(SchemaCache::new(fetch)),
            resolver: ExtensionResolver::new(&config),
        }
    }

    /// Returns this validator's schema cache.
    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Validates a document against every extension it must implement.
    ///
    /// Each required extension is checked independently, so a schema that
    /// can't be fetched only shows up as a violation and doesn't stop the
    /// other checks.
    ///
    /// # Examples
    ///
    /// ```
    /// use ceos_ard_validate::{Config, Document, MemoryFetcher, Validator};
    /// use serde_json::json;
    ///
    /// # tokio_test::block_on(async {
    /// let config = Config::default().with_card4l("https://ceos-ard.test/card4l.json");
    /// let fetcher = MemoryFetcher::new().with_json("https://ceos-ard.test/card4l.json", json!({}));
    /// let validator = Validator::with_fetcher(fetcher, config);
    /// let document = Document::from_value(json!({"stac_extensions": ["https://ceos-ard.test/card4l.json"]})).unwrap();
    /// let report = validator.validate(&document).await;
    /// assert!(report.is_empty());
    /// # })
    /// ```
    pub async fn validate(&self, document: &Document) -> Report {
        let urls = self.resolver.resolve(document);
        tracing::info!("validating against {} schema(s)", urls.len());
        let outcomes = join_all(urls.into_iter().map(|url| async move {
            let violations = self.check(&url, document.value()).await;
            SchemaOutcome {
                declared: document.declares(&url),
                url,
                violations,
            }
        }))
        .await;
        let report = build(
            outcomes,
            &BuildOptions {
                check_declared: true,
                href: document.href(),
            },
        );
        tracing::info!("{} path(s) with violations", report.len());
        report
    }

    /// Validates a document against CARD4L's json-schema only.
    ///
    /// CARD4L is added to a copy of the document's `stac_extensions` first, so
    /// this never reports a missing extension.
    pub async fn validate_jsonschema(&self, document: &Document) -> Report {
        let url = self.resolver.card4l();
        let injected = inject(document, url);
        let violations = self.check(url, injected.value()).await;
        let report = build(
            vec![SchemaOutcome {
                url: url.to_string(),
                declared: true,
                violations,
            }],
            &BuildOptions {
                check_declared: false,
                href: document.href(),
            },
        );
        tracing::info!("{} path(s) with violations", report.len());
        report
    }

    async fn check(&self, url: &str, value: &Value) -> Vec<Violation> {
        match self.cache.fetch(url).await {
            Ok(schema) => structural::validate(value, &schema),
            Err(error) => vec![structural::unavailable(url, &error)],
        }
    }
}
