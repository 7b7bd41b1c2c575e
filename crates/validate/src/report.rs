//! Validation reports.

use crate::STAC_EXTENSIONS_PATH;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// How bad a violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// The document does not conform.
    Error,

    /// The document conforms, but something looks off.
    Warning,
}

/// Why a violation was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cause {
    /// A required extension isn't declared in `stac_extensions`.
    MissingExtension,

    /// The document does not pass a schema as a whole.
    NotConformant,

    /// A single schema constraint failed.
    Structural,

    /// The schema couldn't be fetched, resolved, or compiled.
    SchemaUnavailable,
}

/// A single problem with a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// A JSON pointer to the offending part of the document.
    pub path: String,

    /// The severity.
    pub severity: Severity,

    /// What went wrong.
    pub message: String,

    /// What to do about it, if we know.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Why this violation was raised.
    pub cause: Cause,
}

/// All violations for a document, grouped by path.
///
/// Paths appear in the order they were first found. An empty report means the
/// document is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report(IndexMap<String, Vec<Violation>>);

/// The result of checking a document against one schema.
#[derive(Debug, Clone)]
pub struct SchemaOutcome {
    /// The schema url.
    pub url: String,

    /// Was this schema declared in the document's `stac_extensions`?
    pub declared: bool,

    /// Violations found by the structural validator.
    pub violations: Vec<Violation>,
}

/// Options for [build].
#[derive(Debug, Clone, Default)]
pub struct BuildOptions<'a> {
    /// Report schemas that the document doesn't declare, and summarize
    /// schemas the document doesn't pass.
    pub check_declared: bool,

    /// Where the document came from, used in suggestions.
    pub href: Option<&'a str>,
}

impl Violation {
    /// Creates a new error.
    pub fn error(path: impl ToString, message: impl ToString, cause: Cause) -> Violation {
        Violation {
            path: path.to_string(),
            severity: Severity::Error,
            message: message.to_string(),
            suggestion: None,
            cause,
        }
    }

    /// Adds a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl ToString) -> Violation {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    /// Returns true if this is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Report {
    /// Creates a new, empty report.
    pub fn new() -> Report {
        Report::default()
    }

    /// Adds a violation at its path.
    pub fn push(&mut self, violation: Violation) {
        self.0
            .entry(violation.path.clone())
            .or_default()
            .push(violation);
    }

    /// Returns true if there's nothing in this report, i.e. the document is
    /// valid.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of paths with at least one violation.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if any violation is an error.
    pub fn has_errors(&self) -> bool {
        self.violations().any(|violation| violation.is_error())
    }

    /// Returns the violations at a path.
    pub fn get(&self, path: &str) -> Option<&[Violation]> {
        self.0.get(path).map(|violations| violations.as_slice())
    }

    /// Iterates over paths and their violations.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Violation])> {
        self.0
            .iter()
            .map(|(path, violations)| (path.as_str(), violations.as_slice()))
    }

    /// Iterates over every violation, path by path.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.0.values().flatten()
    }

    /// Converts this report into a [serde_json::Value].
    pub fn into_json(self) -> serde_json::Value {
        serde_json::to_value(self.0).unwrap_or_default()
    }
}

/// Builds a report from per-schema outcomes.
///
/// Outcomes must be in the order the schemas were resolved; the report keeps
/// that order.
///
/// # Examples
///
/// ```
/// use ceos_ard_validate::{BuildOptions, SchemaOutcome, build};
///
/// let outcome = SchemaOutcome {
///     url: "https://ceos-ard.test/card4l.json".to_string(),
///     declared: false,
///     violations: Vec::new(),
/// };
/// let options = BuildOptions { check_declared: true, href: None };
/// let report = build(vec![outcome], &options);
/// assert_eq!(report.get("/stac_extensions").unwrap().len(), 1);
/// ```
pub fn build(outcomes: Vec<SchemaOutcome>, options: &BuildOptions<'_>) -> Report {
    let mut report = Report::new();
    for outcome in outcomes {
        if options.check_declared {
            if !outcome.declared {
                report.push(Violation::error(
                    STAC_EXTENSIONS_PATH,
                    format!("missing required extension: {}", outcome.url),
                    Cause::MissingExtension,
                ));
            }
            if outcome
                .violations
                .iter()
                .any(|violation| violation.cause == Cause::Structural)
            {
                let mut violation = Violation::error(
                    STAC_EXTENSIONS_PATH,
                    format!("object does not pass validation against {}", outcome.url),
                    Cause::NotConformant,
                );
                if is_network_hosted(&outcome.url) {
                    violation = violation.with_suggestion(format!(
                        "Run `ceos-ard validate-jsonschema {}` to see the validation error",
                        options.href.unwrap_or("<href>")
                    ));
                }
                report.push(violation);
            }
        }
        for violation in outcome.violations {
            report.push(violation);
        }
    }
    report
}

fn is_network_hosted(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => f.write_str("ERROR"),
            Severity::Warning => f.write_str("WARNING"),
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (path, violations) in self.iter() {
            writeln!(f, "At '{path}':")?;
            for violation in violations {
                writeln!(f, "  - {violation}")?;
                if let Some(suggestion) = violation.suggestion.as_ref() {
                    writeln!(f, "    SUGGESTION: {suggestion}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BuildOptions, Cause, Report, SchemaOutcome, Violation, build};
    use serde_json::json;

    const CARD4L: &str = "https://ceos-ard.test/card4l.json";

    fn structural(path: &str) -> Violation {
        Violation::error(path, "\"a\" is a required property", Cause::Structural)
    }

    fn outcome(url: &str, declared: bool, violations: Vec<Violation>) -> SchemaOutcome {
        SchemaOutcome {
            url: url.to_string(),
            declared,
            violations,
        }
    }

    #[test]
    fn empty() {
        let report = build(
            vec![outcome(CARD4L, true, Vec::new())],
            &BuildOptions {
                check_declared: true,
                href: None,
            },
        );
        assert!(report.is_empty());
        assert!(!report.has_errors());
        assert_eq!(report.to_string(), "");
    }

    #[test]
    fn missing_extension() {
        let report = build(
            vec![outcome(CARD4L, false, Vec::new())],
            &BuildOptions {
                check_declared: true,
                href: None,
            },
        );
        let violations = report.get("/stac_extensions").unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "missing required extension: https://ceos-ard.test/card4l.json"
        );
        assert_eq!(violations[0].cause, Cause::MissingExtension);
        assert!(violations[0].suggestion.is_none());
    }

    #[test]
    fn not_conformant_with_suggestion() {
        let report = build(
            vec![outcome(CARD4L, true, vec![structural("/properties")])],
            &BuildOptions {
                check_declared: true,
                href: Some("item.json"),
            },
        );
        let violations = report.get("/stac_extensions").unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "object does not pass validation against https://ceos-ard.test/card4l.json"
        );
        assert_eq!(
            violations[0].suggestion.as_deref(),
            Some("Run `ceos-ard validate-jsonschema item.json` to see the validation error")
        );
        assert_eq!(report.get("/properties").unwrap().len(), 1);
    }

    #[test]
    fn local_schema_gets_no_suggestion() {
        let report = build(
            vec![outcome("schemas/card4l.json", true, vec![structural("")])],
            &BuildOptions {
                check_declared: true,
                href: Some("item.json"),
            },
        );
        assert!(report.get("/stac_extensions").unwrap()[0].suggestion.is_none());
    }

    #[test]
    fn unavailable_schema_is_not_summarized() {
        let unavailable = Violation::error(
            "",
            "could not fetch schema",
            Cause::SchemaUnavailable,
        );
        let report = build(
            vec![outcome(CARD4L, true, vec![unavailable])],
            &BuildOptions {
                check_declared: true,
                href: None,
            },
        );
        assert!(report.get("/stac_extensions").is_none());
        assert_eq!(report.get("").unwrap().len(), 1);
    }

    #[test]
    fn without_declared_checks() {
        let report = build(
            vec![outcome(CARD4L, false, vec![structural("/properties")])],
            &BuildOptions::default(),
        );
        assert!(report.get("/stac_extensions").is_none());
        assert_eq!(report.iter().count(), 1);
    }

    #[test]
    fn order() {
        let report = build(
            vec![
                outcome(
                    "https://ceos-ard.test/a.json",
                    false,
                    vec![structural("/properties/b")],
                ),
                outcome(CARD4L, true, vec![structural("/properties/a")]),
            ],
            &BuildOptions {
                check_declared: true,
                href: None,
            },
        );
        assert_eq!(
            report.iter().map(|(path, _)| path).collect::<Vec<_>>(),
            vec!["/stac_extensions", "/properties/b", "/properties/a"]
        );
        let messages: Vec<_> = report
            .get("/stac_extensions")
            .unwrap()
            .iter()
            .map(|violation| violation.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec![
                "missing required extension: https://ceos-ard.test/a.json",
                "object does not pass validation against https://ceos-ard.test/a.json",
                "object does not pass validation against https://ceos-ard.test/card4l.json",
            ]
        );
    }

    #[test]
    fn display() {
        let report = build(
            vec![outcome(CARD4L, false, vec![structural("/properties")])],
            &BuildOptions {
                check_declared: true,
                href: Some("item.json"),
            },
        );
        assert_eq!(
            report.to_string(),
            "At '/stac_extensions':
  - ERROR: missing required extension: https://ceos-ard.test/card4l.json
  - ERROR: object does not pass validation against https://ceos-ard.test/card4l.json
    SUGGESTION: Run `ceos-ard validate-jsonschema item.json` to see the validation error
At '/properties':
  - ERROR: \"a\" is a required property
"
        );
    }

    #[test]
    fn json() {
        let mut report = Report::new();
        report.push(structural("/properties"));
        assert_eq!(
            report.into_json(),
            json!({
                "/properties": [{
                    "path": "/properties",
                    "severity": "ERROR",
                    "message": "\"a\" is a required property",
                    "cause": "structural",
                }]
            })
        );
    }
}
