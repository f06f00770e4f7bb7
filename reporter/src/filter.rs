use serde_json::{json, Map, Value};
use std::borrow::Cow;
use wandb_run_model::Run;

/// A predicate over runs, sent to the run store as a MongoDB style filter document.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Eq(String, Value),
    Ne(String, Value),
    Exists(String, bool),
    In(String, Vec<Value>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Filter::Ne(field.to_string(), value.into())
    }

    pub fn exists(field: &str, exists: bool) -> Self {
        Filter::Exists(field.to_string(), exists)
    }

    pub fn any_of<V: Into<Value>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(
            field.to_string(),
            values.into_iter().map(Into::into).collect(),
        )
    }

    /// `field` is not `value`, or the run doesn't have `field` at all.
    pub fn differs_or_absent(field: &str, value: impl Into<Value>) -> Vec<Self> {
        vec![Filter::ne(field, value), Filter::exists(field, false)]
    }

    /// Render the filter document understood by the W&B `runs` query.
    pub fn to_json(&self) -> Value {
        match self {
            Filter::And(filters) => {
                json!({ "$and": filters.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
            Filter::Or(filters) => {
                json!({ "$or": filters.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
            Filter::Eq(field, value) => field_document(field, value.clone()),
            Filter::Ne(field, value) => field_document(field, json!({ "$ne": value })),
            Filter::Exists(field, exists) => field_document(field, json!({ "$exists": exists })),
            Filter::In(field, values) => field_document(field, json!({ "$in": values })),
        }
    }

    /// Evaluate the filter against a run the way the run store would.
    ///
    /// Comparisons against a missing field follow MongoDB: `$eq` fails, `$ne` passes. An array
    /// field matches `$eq`/`$in` if any element does.
    pub fn matches(&self, run: &Run) -> bool {
        match self {
            Filter::And(filters) => filters.iter().all(|f| f.matches(run)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(run)),
            Filter::Eq(field, value) => {
                field_value(run, field).is_some_and(|found| value_matches(&found, value))
            }
            Filter::Ne(field, value) => {
                !field_value(run, field).is_some_and(|found| value_matches(&found, value))
            }
            Filter::Exists(field, exists) => field_value(run, field).is_some() == *exists,
            Filter::In(field, values) => field_value(run, field)
                .is_some_and(|found| values.iter().any(|v| value_matches(&found, v))),
        }
    }
}

fn field_document(field: &str, condition: Value) -> Value {
    let mut document = Map::new();
    document.insert(field.to_string(), condition);
    Value::Object(document)
}

/// Resolve a filter field path on a run.
///
/// `name` is the run id, which is what the run store calls a run's name.
fn field_value<'a>(run: &'a Run, field: &str) -> Option<Cow<'a, Value>> {
    match field {
        "name" => Some(Cow::Owned(Value::String(run.id.clone()))),
        "display_name" => Some(Cow::Owned(Value::String(run.name.clone()))),
        "state" => Some(Cow::Owned(Value::String(run.state.to_string()))),
        "tags" => Some(Cow::Owned(Value::from(run.tags.clone()))),
        _ => {
            let key = field.strip_prefix("config.")?;
            match run.config_value(key)? {
                Value::Null => None,
                value => Some(Cow::Borrowed(value)),
            }
        }
    }
}

fn value_matches(found: &Value, expected: &Value) -> bool {
    match found {
        Value::Array(items) if !expected.is_array() => items.iter().any(|item| item == expected),
        _ => found == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use wandb_run_model::RunState;

    fn run_with(id: &str, tags: &[&str], config: &[(&str, Value)]) -> Run {
        Run {
            id: id.to_string(),
            name: id.to_string(),
            url: String::new(),
            entity: "team".to_string(),
            project: "proj".to_string(),
            state: RunState::Finished,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            config: config
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
            summary_metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn renders_mongo_documents() {
        let filter = Filter::And(vec![
            Filter::any_of("tags", ["baseline"]),
            Filter::Or(Filter::differs_or_absent("config.github_sha", "abc123")),
        ]);

        assert_eq!(
            filter.to_json(),
            json!({"$and": [
                {"tags": {"$in": ["baseline"]}},
                {"$or": [
                    {"config.github_sha": {"$ne": "abc123"}},
                    {"config.github_sha": {"$exists": false}},
                ]},
            ]})
        );
        assert_eq!(Filter::eq("name", "run42").to_json(), json!({"name": "run42"}));
    }

    #[test]
    fn missing_fields_follow_mongo_semantics() {
        let run = run_with("a", &[], &[]);

        assert!(!Filter::eq("config.github_sha", "abc").matches(&run));
        assert!(Filter::ne("config.github_sha", "abc").matches(&run));
        assert!(Filter::exists("config.github_sha", false).matches(&run));
        assert!(!Filter::exists("config.github_sha", true).matches(&run));
        assert!(!Filter::any_of("config.github_sha", ["abc"]).matches(&run));
    }

    #[test]
    fn null_config_counts_as_absent() {
        let run = run_with("a", &[], &[("github_sha", Value::Null)]);
        assert!(Filter::exists("config.github_sha", false).matches(&run));
    }

    #[test]
    fn tags_match_by_intersection() {
        let run = run_with("a", &["nightly", "baseline"], &[]);

        assert!(Filter::any_of("tags", ["baseline", "other"]).matches(&run));
        assert!(Filter::eq("tags", "nightly").matches(&run));
        assert!(!Filter::any_of("tags", ["other"]).matches(&run));
        assert!(!Filter::any_of("tags", Vec::<String>::new()).matches(&run));
    }

    #[test]
    fn name_is_the_run_id() {
        let mut run = run_with("run42", &[], &[]);
        run.name = "pretty-name".to_string();

        assert!(Filter::eq("name", "run42").matches(&run));
        assert!(!Filter::eq("name", "pretty-name").matches(&run));
        assert!(Filter::eq("display_name", "pretty-name").matches(&run));
    }
}
