use crate::{Error, Fetch, Result};
use indexmap::IndexSet;
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;

/// The field where STAC objects declare the extensions they implement.
pub const STAC_EXTENSIONS: &str = "stac_extensions";

/// The JSON pointer of the [STAC_EXTENSIONS] field.
pub const STAC_EXTENSIONS_PATH: &str = "/stac_extensions";

/// A STAC item to be validated.
///
/// The declared extensions are normalized once, when the document is created:
/// a missing field is an empty set, a single string is a one-element set, and
/// anything in an array that isn't a string is dropped. The underlying JSON is
/// never changed.
#[derive(Debug, Clone)]
pub struct Document {
    value: Arc<Value>,
    extensions: IndexSet<String>,
    href: Option<String>,
}

impl Document {
    /// Creates a document from JSON bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use ceos_ard_validate::Document;
    ///
    /// let document = Document::from_slice(br#"{"stac_extensions": "https://ceos-ard.test/a.json"}"#).unwrap();
    /// assert_eq!(document.extensions().len(), 1);
    /// ```
    pub fn from_slice(slice: &[u8]) -> Result<Document> {
        let value: Value = serde_json::from_slice(slice).map_err(Error::DocumentParse)?;
        Document::from_value(value)
    }

    /// Creates a document from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Document> {
        let extensions = match &value {
            Value::Object(object) => normalize(object.get(STAC_EXTENSIONS)),
            _ => return Err(Error::NotAnObject(value)),
        };
        Ok(Document {
            value: Arc::new(value),
            extensions,
            href: None,
        })
    }

    /// Reads a document from an href.
    ///
    /// `http` and `https` hrefs are retrieved with `fetch`, everything else is
    /// read from the local filesystem.
    pub async fn from_href(href: impl ToString, fetch: &dyn Fetch) -> Result<Document> {
        let href = href.to_string();
        let bytes = match Url::parse(&href) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                fetch.fetch(url.as_str()).await.map_err(|err| Error::Get {
                    href: href.clone(),
                    message: err.to_string(),
                })?
            }
            _ => tokio::fs::read(&href).await?.into(),
        };
        let document = Document::from_slice(&bytes)?;
        Ok(document.with_href(href))
    }

    /// Sets the href this document was read from.
    pub fn with_href(mut self, href: impl ToString) -> Document {
        self.href = Some(href.to_string());
        self
    }

    /// Returns the href this document was read from, if any.
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Returns the underlying JSON value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the declared extensions, in the order they were first declared.
    pub fn extensions(&self) -> &IndexSet<String> {
        &self.extensions
    }

    /// Returns true if this document declares the extension.
    pub fn declares(&self, url: &str) -> bool {
        self.extensions.contains(url)
    }
}

/// Returns a copy of `document` that declares `url`.
///
/// Only `url` is added to the copy's `stac_extensions` field. Entries that are
/// already there, including duplicates and entries that aren't strings, are
/// kept as they are, so the copy fails the same checks the original does. A
/// missing field becomes `[url]` and a single value becomes `[value, url]`.
/// The original document is untouched.
///
/// # Examples
///
/// ```
/// use ceos_ard_validate::{Document, inject};
/// use serde_json::json;
///
/// let document = Document::from_value(json!({"type": "Feature"})).unwrap();
/// let injected = inject(&document, "https://ceos-ard.test/card4l.json");
/// assert!(injected.declares("https://ceos-ard.test/card4l.json"));
/// assert!(!document.declares("https://ceos-ard.test/card4l.json"));
/// ```
pub fn inject(document: &Document, url: &str) -> Document {
    let mut object = document
        .value
        .as_object()
        .cloned()
        .unwrap_or_else(Map::new);
    let mut declared = match object.get(STAC_EXTENSIONS).cloned() {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(array)) => array,
        Some(value) => vec![value],
    };
    if !declared.iter().any(|value| value.as_str() == Some(url)) {
        declared.push(url.into());
    }
    let _ = object.insert(STAC_EXTENSIONS.to_string(), Value::Array(declared));
    let extensions = normalize(object.get(STAC_EXTENSIONS));
    Document {
        value: Arc::new(Value::Object(object)),
        extensions,
        href: document.href.clone(),
    }
}

fn normalize(value: Option<&Value>) -> IndexSet<String> {
    match value {
        None | Some(Value::Null) => IndexSet::new(),
        Some(Value::String(s)) => IndexSet::from([s.clone()]),
        Some(Value::Array(array)) => array
            .iter()
            .filter_map(|value| {
                if let Value::String(s) = value {
                    Some(s.clone())
                } else {
                    tracing::warn!("ignoring non-string {STAC_EXTENSIONS} entry: {value}");
                    None
                }
            })
            .collect(),
        Some(value) => {
            tracing::warn!("ignoring {STAC_EXTENSIONS} that is not a string or an array: {value}");
            IndexSet::new()
        }
    }
}
