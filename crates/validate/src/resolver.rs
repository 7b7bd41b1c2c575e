use crate::{Config, Document};
use indexmap::IndexSet;

/// Works out which schemas a document must be checked against.
#[derive(Debug, Clone)]
pub struct ExtensionResolver {
    card4l: String,
    required: Vec<String>,
}

impl ExtensionResolver {
    /// Creates a new resolver from a configuration.
    pub fn new(config: &Config) -> ExtensionResolver {
        ExtensionResolver {
            card4l: config.card4l.clone(),
            required: config.required_extensions.clone(),
        }
    }

    /// Returns the CARD4L schema url.
    pub fn card4l(&self) -> &str {
        &self.card4l
    }

    /// Returns the schema urls that `document` must satisfy.
    ///
    /// The document's own extensions come first, in declaration order,
    /// followed by any configured required extensions, followed by CARD4L.
    /// Every url appears once, and CARD4L is always present.
    ///
    /// # Examples
    ///
    /// ```
    /// use ceos_ard_validate::{Config, Document, ExtensionResolver};
    /// use serde_json::json;
    ///
    /// let config = Config::default().with_card4l("https://ceos-ard.test/card4l.json");
    /// let resolver = ExtensionResolver::new(&config);
    /// let document = Document::from_value(json!({})).unwrap();
    /// assert_eq!(resolver.resolve(&document), vec!["https://ceos-ard.test/card4l.json"]);
    /// ```
    pub fn resolve(&self, document: &Document) -> Vec<String> {
        let mut urls: IndexSet<String> = document.extensions().clone();
        urls.extend(self.required.iter().cloned());
        let _ = urls.insert(self.card4l.clone());
        urls.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::ExtensionResolver;
    use crate::{Config, Document};
    use rstest::rstest;
    use serde_json::{Value, json};

    const CARD4L: &str = "https://ceos-ard.test/card4l.json";

    fn resolver() -> ExtensionResolver {
        ExtensionResolver::new(&Config::default().with_card4l(CARD4L))
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({"stac_extensions": null}))]
    #[case(json!({"stac_extensions": []}))]
    #[case(json!({"stac_extensions": CARD4L}))]
    #[case(json!({"stac_extensions": [CARD4L]}))]
    #[case(json!({"stac_extensions": [CARD4L, CARD4L]}))]
    #[case(json!({"stac_extensions": ["https://ceos-ard.test/a.json", CARD4L, "https://ceos-ard.test/b.json"]}))]
    fn card4l_exactly_once(#[case] value: Value) {
        let document = Document::from_value(value).unwrap();
        let urls = resolver().resolve(&document);
        assert_eq!(urls.iter().filter(|url| *url == CARD4L).count(), 1);
    }

    #[test]
    fn card4l_last() {
        let document = Document::from_value(json!({
            "stac_extensions": ["https://ceos-ard.test/b.json", "https://ceos-ard.test/a.json"]
        }))
        .unwrap();
        assert_eq!(
            resolver().resolve(&document),
            vec![
                "https://ceos-ard.test/b.json",
                "https://ceos-ard.test/a.json",
                CARD4L
            ]
        );
    }

    #[test]
    fn declared_card4l_keeps_position() {
        let document = Document::from_value(json!({
            "stac_extensions": [CARD4L, "https://ceos-ard.test/a.json"]
        }))
        .unwrap();
        assert_eq!(
            resolver().resolve(&document),
            vec![CARD4L, "https://ceos-ard.test/a.json"]
        );
    }

    #[test]
    fn required_extensions() {
        let resolver = ExtensionResolver::new(
            &Config::default()
                .with_card4l(CARD4L)
                .with_required_extension("https://ceos-ard.test/a.json")
                .with_required_extension("https://ceos-ard.test/b.json"),
        );
        let document = Document::from_value(json!({
            "stac_extensions": ["https://ceos-ard.test/b.json"]
        }))
        .unwrap();
        assert_eq!(
            resolver.resolve(&document),
            vec![
                "https://ceos-ard.test/b.json",
                "https://ceos-ard.test/a.json",
                CARD4L
            ]
        );
    }
}
