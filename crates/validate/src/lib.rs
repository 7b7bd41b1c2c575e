//! Validate STAC items against the CEOS Analysis Ready Data for Land
//! ([CARD4L](https://github.com/stac-extensions/card4l)) extension.
//!
//! Every item is checked against the CARD4L json-schema, whether it declares
//! the extension or not, and against every other extension it declares. The
//! results are gathered into a single [Report], grouped by the JSON pointer of
//! the offending field.
//!
//! # Examples
//!
//! ```no_run
//! use ceos_ard_validate::{Config, Document, Validator};
//!
//! # tokio_test::block_on(async {
//! let validator = Validator::new(Config::default()).unwrap();
//! let document = Document::from_slice(br#"{"type": "Feature", "stac_extensions": []}"#).unwrap();
//! let report = validator.validate(&document).await;
//! if !report.is_empty() {
//!     println!("{report}");
//! }
//! # })
//! ```
//!
//! Schemas are fetched through the [Fetch] trait. Use a [MemoryFetcher] to
//! validate against a fixed set of schemas without touching the network:
//!
//! ```
//! use ceos_ard_validate::{Config, Document, MemoryFetcher, Validator};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let config = Config::default().with_card4l("https://ceos-ard.test/card4l.json");
//! let fetcher = MemoryFetcher::new().with_json(
//!     "https://ceos-ard.test/card4l.json",
//!     json!({"required": ["properties"]}),
//! );
//! let validator = Validator::with_fetcher(fetcher, config);
//! let document = Document::from_value(json!({"type": "Feature"})).unwrap();
//! let report = validator.validate_jsonschema(&document).await;
//! assert_eq!(report.get("").unwrap().len(), 1);
//! # })
//! ```

mod cache;
mod config;
mod document;
mod error;
mod fetch;
mod report;
mod resolver;
mod structural;
mod validator;

pub use {
    cache::{Schema, SchemaCache},
    config::{CARD4L_OPTICAL, CARD4L_SAR, Config, DEFAULT_TIMEOUT, OPTICAL_EXTENSIONS, Profile},
    document::{Document, STAC_EXTENSIONS, STAC_EXTENSIONS_PATH, inject},
    error::Error,
    fetch::{BoxError, Fetch, HttpFetcher, MemoryFetcher},
    report::{BuildOptions, Cause, Report, SchemaOutcome, Severity, Violation, build},
    resolver::ExtensionResolver,
    structural::{ROOT_PATH, validate as validate_structure},
    validator::Validator,
};

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns a string suitable for use as a HTTP user agent.
pub fn user_agent() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
}
