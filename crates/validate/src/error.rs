use thiserror::Error;

/// Crate-specific error enum.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The document could not be parsed as JSON.
    #[error("document is not valid json: {0}")]
    DocumentParse(#[source] serde_json::Error),

    /// An error occurred when getting an href.
    #[error("error when getting href={href}: {message}")]
    Get {
        /// The href that we were trying to get.
        href: String,

        /// The underlying error message.
        message: String,
    },

    /// [std::io::Error]
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The document is valid JSON, but not an object.
    #[error("json value is not an object")]
    NotAnObject(serde_json::Value),

    #[error(transparent)]
    /// [reqwest::Error]
    Reqwest(#[from] reqwest::Error),

    /// A chain of `$ref`s between schema documents loops back on itself.
    #[error("schema reference cycle: {}", .chain.join(" -> "))]
    SchemaCycle {
        /// Every url on the chain, ending with the revisited one.
        chain: Vec<String>,
    },

    /// A schema could not be fetched or parsed.
    #[error("could not fetch schema {url}: {cause}")]
    SchemaFetch {
        /// The schema url.
        url: String,

        /// Why the fetch failed.
        cause: String,
    },
}

