use crate::error::InputError;
use serde_json::Value;
use std::path::PathBuf;

/// How the candidate runs are identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A single run, looked up by its id.
    ///
    /// `ignored_sha` holds a commit SHA that was also supplied and is not used.
    RunId {
        run_id: String,
        ignored_sha: Option<String>,
    },
    /// All runs logged for a commit, optionally narrowed by a secondary commit.
    Sha {
        github_sha: String,
        secondary_sha: Option<String>,
    },
}

/// Validated inputs for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub project: String,
    pub selection: Selection,
    pub baseline_tags: Vec<String>,
    pub metrics: Vec<String>,
    pub config_vars: Vec<String>,
    pub debug: bool,
    pub output_dir: PathBuf,
}

/// Decide how candidate runs are selected from the optional identifiers.
///
/// A run id takes precedence over a commit SHA.
pub fn select_runs(
    run_id: Option<&str>,
    github_sha: Option<&str>,
    secondary_sha: Option<&str>,
) -> Result<Selection, InputError> {
    match (run_id, github_sha, secondary_sha) {
        (None, None, _) => Err(InputError::MissingSelector),
        (_, None, Some(_)) => Err(InputError::SecondaryShaWithoutPrimary),
        (Some(run_id), ignored_sha, _) => Ok(Selection::RunId {
            run_id: run_id.to_string(),
            ignored_sha: ignored_sha.map(str::to_string),
        }),
        (None, Some(github_sha), secondary_sha) => Ok(Selection::Sha {
            github_sha: github_sha.to_string(),
            secondary_sha: secondary_sha.map(str::to_string),
        }),
    }
}

/// Parse a list input into its strings.
///
/// Accepts a JSON array (`["a", "b"]`) or a bracketed list of quoted strings as written in
/// workflow files (`['a', 'b']`). Blank input is the empty list.
pub fn parse_string_list(name: &str, raw: &str) -> Result<Vec<String>, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let not_a_list = || InputError::NotAList {
        name: name.to_string(),
        raw: raw.to_string(),
    };
    let not_strings = || InputError::NotAStringList {
        name: name.to_string(),
        raw: raw.to_string(),
    };

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(not_strings()),
            })
            .collect(),
        Ok(_) => Err(not_a_list()),
        Err(_) => {
            let inner = trimmed
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .ok_or_else(not_a_list)?;
            parse_quoted_items(inner).ok_or_else(not_strings)
        }
    }
}

/// Split the inside of a `[...]` list into quoted string items.
///
/// Returns `None` if any item is not a quoted string.
fn parse_quoted_items(inner: &str) -> Option<Vec<String>> {
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let quote = match chars.next() {
            None => return Some(items),
            Some(q @ ('\'' | '"')) => q,
            Some(_) => return None,
        };

        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => item.push(chars.next()?),
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => return Some(items),
            Some(',') => {}
            Some(_) => return None,
        }
    }
}

/// Treat empty values as absent, the pipeline passes unset inputs as empty strings.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
