use thiserror::Error;

/// Problems with the action inputs, detected before any query is sent.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("{name} input must be a list, got: {raw:?}")]
    NotAList { name: String, raw: String },
    #[error("{name} input must be a list of strings, got: {raw:?}")]
    NotAStringList { name: String, raw: String },
    #[error("You must supply an input for PROJECT_NAME")]
    MissingProject,
    #[error(
        "You must supply an input for either FILTER_GITHUB_SHA or RUN_ID. Both of these inputs are not specified."
    )]
    MissingSelector,
    #[error(
        "If input FILTER_SECONDARY_SHA is supplied you must also supply an input for FILTER_GITHUB_SHA"
    )]
    SecondaryShaWithoutPrimary,
}

/// Failures talking to the W&B run store.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GraphQL query returned errors: {}", messages.join("; "))]
    GraphQl { messages: Vec<String> },
    #[error("Project not found: {entity}/{project}")]
    MissingProject { entity: String, project: String },
    #[error("No entity given for project {project:?} and the API key has no default entity")]
    NoEntity { project: String },
    #[error("Could not decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
