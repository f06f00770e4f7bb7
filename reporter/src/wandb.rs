use crate::error::QueryError;
use crate::filter::Filter;
use crate::store::{ProjectPath, RunStore};
use anyhow::Context;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::borrow::Cow;
use wandb_run_model::{Run, RunState};

pub const DEFAULT_BASE_URL: &str = "https://api.wandb.ai";
const PAGE_SIZE: usize = 50;

const RUNS_QUERY: &str = r#"
query Runs($project: String!, $entity: String!, $cursor: String, $perPage: Int, $order: String, $filters: JSONString) {
    project(name: $project, entityName: $entity) {
        runs(filters: $filters, after: $cursor, first: $perPage, order: $order) {
            edges {
                node {
                    name
                    displayName
                    state
                    tags
                    config
                    summaryMetrics
                }
            }
            pageInfo {
                endCursor
                hasNextPage
            }
        }
    }
}
"#;

const VIEWER_QUERY: &str = "query Viewer { viewer { entity } }";

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProjectData {
    project: Option<ProjectRuns>,
}

#[derive(Debug, Deserialize)]
struct ProjectRuns {
    runs: RunConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunConnection {
    edges: Vec<RunEdge>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct RunEdge {
    node: RunNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunNode {
    name: String,
    display_name: Option<String>,
    state: String,
    #[serde(default)]
    tags: Vec<String>,
    config: Option<String>,
    summary_metrics: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: Option<Viewer>,
}

#[derive(Debug, Deserialize)]
struct Viewer {
    entity: Option<String>,
}

/// Client for the W&B GraphQL API.
#[derive(Debug, Clone)]
pub struct WandbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    default_entity: Option<String>,
}

impl WandbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            default_entity: None,
        }
    }

    /// Entity to use for projects given without one.
    ///
    /// Without this, the entity of the API key's user is looked up.
    pub fn with_default_entity(mut self, entity: Option<String>) -> Self {
        self.default_entity = entity;
        self
    }

    /// Base URL of the web UI that run links point at
    pub fn app_url(&self) -> String {
        app_url(&self.base_url)
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, QueryError> {
        let url = format!("{}/graphql", self.base_url);
        let http_error = |source: reqwest::Error| QueryError::Http {
            url: url.clone(),
            source,
        };

        let body = self
            .http
            .post(&url)
            .basic_auth("api", Some(&self.api_key))
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(http_error)?
            .text()
            .await
            .map_err(http_error)?;

        decode_response(&body)
    }

    async fn resolve_entity(&self, path: &ProjectPath) -> Result<String, QueryError> {
        if let Some(entity) = path.entity.as_ref().or(self.default_entity.as_ref()) {
            return Ok(entity.clone());
        }

        log::debug!("Looking up default entity for project {}", path.project);
        let data: ViewerData = self.graphql(VIEWER_QUERY, json!({})).await?;
        data.viewer
            .and_then(|viewer| viewer.entity)
            .ok_or_else(|| QueryError::NoEntity {
                project: path.project.clone(),
            })
    }

    async fn query_runs(&self, project: &str, filter: &Filter) -> anyhow::Result<Vec<Run>> {
        let path = ProjectPath::parse(project);
        let entity = self.resolve_entity(&path).await?;
        let app_url = self.app_url();
        let filters = filter.to_json().to_string();
        log::debug!("Querying runs in {entity}/{}: {filters}", path.project);

        let mut runs = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let data: ProjectData = self
                .graphql(
                    RUNS_QUERY,
                    json!({
                        "project": path.project,
                        "entity": entity,
                        "cursor": cursor,
                        "perPage": PAGE_SIZE,
                        "order": "-created_at",
                        "filters": filters,
                    }),
                )
                .await
                .with_context(|| format!("Query runs in {entity}/{}", path.project))?;

            let connection = data
                .project
                .ok_or_else(|| QueryError::MissingProject {
                    entity: entity.clone(),
                    project: path.project.clone(),
                })?
                .runs;

            for edge in connection.edges {
                runs.push(run_from_node(edge.node, &entity, &path.project, &app_url)?);
            }
            log::trace!("Loaded {} runs so far", runs.len());

            match connection.page_info {
                PageInfo {
                    has_next_page: true,
                    end_cursor: Some(next),
                } => cursor = Some(next),
                _ => break,
            }
        }

        Ok(runs)
    }
}

impl RunStore for WandbClient {
    fn runs<'a>(
        &'a self,
        project: &'a str,
        filter: &'a Filter,
    ) -> BoxFuture<'a, anyhow::Result<Vec<Run>>> {
        self.query_runs(project, filter).boxed()
    }
}

fn decode_response<T: DeserializeOwned>(body: &str) -> Result<T, QueryError> {
    let response: GraphQlResponse<T> =
        serde_json::from_str(body).map_err(|source| QueryError::Decode {
            what: "GraphQL response",
            source,
        })?;

    if !response.errors.is_empty() {
        return Err(QueryError::GraphQl {
            messages: response.errors.into_iter().map(|e| e.message).collect(),
        });
    }

    response.data.ok_or_else(|| QueryError::GraphQl {
        messages: vec!["Response contained no data".to_string()],
    })
}

/// The public API lives on `api.` of the web UI host.
fn app_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').replacen("//api.", "//", 1)
}

fn run_from_node(
    node: RunNode,
    entity: &str,
    project: &str,
    app_url: &str,
) -> Result<Run, QueryError> {
    let config = decode_json_map(node.config.as_deref(), "run config")?
        .into_iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .map(|(key, value)| (key, unwrap_config_value(value)))
        .collect();
    let summary_metrics = decode_json_map(node.summary_metrics.as_deref(), "summary metrics")?
        .into_iter()
        .collect();

    Ok(Run {
        url: format!("{app_url}/{entity}/{project}/runs/{}", node.name),
        name: node.display_name.unwrap_or_else(|| node.name.clone()),
        id: node.name,
        entity: entity.to_string(),
        project: project.to_string(),
        state: RunState::from(node.state),
        tags: node.tags,
        config,
        summary_metrics,
    })
}

fn decode_json_map(raw: Option<&str>, what: &'static str) -> Result<Map<String, Value>, QueryError> {
    match raw.map(str::trim) {
        None | Some("") | Some("null") => Ok(Map::new()),
        Some(raw) => serde_json::from_str(&null_non_finite(raw))
            .map_err(|source| QueryError::Decode { what, source }),
    }
}

/// Replace the bare `NaN`, `Infinity` and `-Infinity` tokens that runs log for diverged metrics
/// with `null`, leaving string contents untouched.
fn null_non_finite(raw: &str) -> Cow<'_, str> {
    if !raw.contains("NaN") && !raw.contains("Infinity") {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    let mut in_string = false;
    while let Some(c) = rest.chars().next() {
        if in_string {
            match c {
                '\\' => {
                    let escaped = rest.chars().nth(1).map_or(0, char::len_utf8);
                    out.push_str(&rest[..1 + escaped]);
                    rest = &rest[1 + escaped..];
                    continue;
                }
                '"' => in_string = false,
                _ => {}
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = ["NaN", "Infinity", "-Infinity"]
            .into_iter()
            .find(|token| rest.starts_with(token))
        {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}

/// Config entries are stored as `{"value": ..., "desc": ...}`.
fn unwrap_config_value(value: Value) -> Value {
    match value {
        Value::Object(mut entry) if entry.contains_key("value") => {
            entry.remove("value").unwrap_or(Value::Null)
        }
        other => other,
    }
}
