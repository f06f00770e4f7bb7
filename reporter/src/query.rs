use crate::filter::Filter;
use crate::input::Selection;

const GITHUB_SHA_FIELD: &str = "config.github_sha";
const SECONDARY_SHA_FIELD: &str = "config.secondary_sha";

/// The pair of filters used for one report.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Selects the runs under evaluation
    pub candidates: Filter,
    /// Selects tagged comparison runs, never overlapping with [QueryPlan::candidates]
    pub baselines: Filter,
}

/// Build the candidate and baseline filters for a selection.
///
/// Baselines are any run carrying one of `baseline_tags` that is not a candidate. Baseline runs
/// may have been logged without SHA config values at all, so exclusion is expressed as "differs
/// or is absent".
pub fn build_query_plan(selection: &Selection, baseline_tags: &[String]) -> QueryPlan {
    let tagged = Filter::any_of("tags", baseline_tags.iter().cloned());

    match selection {
        Selection::RunId {
            run_id,
            ignored_sha,
        } => {
            if ignored_sha.is_some() {
                log::warn!(
                    "You have supplied both inputs FILTER_GITHUB_SHA and RUN_ID. Runs matching FILTER_GITHUB_SHA will be ignored and only the run corresponding to RUN_ID will be returned."
                );
            }

            QueryPlan {
                candidates: Filter::eq("name", run_id.as_str()),
                baselines: Filter::And(vec![tagged, Filter::ne("name", run_id.as_str())]),
            }
        }
        Selection::Sha {
            github_sha,
            secondary_sha: None,
        } => QueryPlan {
            candidates: Filter::eq(GITHUB_SHA_FIELD, github_sha.as_str()),
            baselines: Filter::And(vec![
                tagged,
                Filter::Or(Filter::differs_or_absent(
                    GITHUB_SHA_FIELD,
                    github_sha.as_str(),
                )),
            ]),
        },
        Selection::Sha {
            github_sha,
            secondary_sha: Some(secondary_sha),
        } => {
            let mut not_candidate =
                Filter::differs_or_absent(GITHUB_SHA_FIELD, github_sha.as_str());
            not_candidate.extend(Filter::differs_or_absent(
                SECONDARY_SHA_FIELD,
                secondary_sha.as_str(),
            ));

            QueryPlan {
                candidates: Filter::And(vec![
                    Filter::eq(GITHUB_SHA_FIELD, github_sha.as_str()),
                    Filter::eq(SECONDARY_SHA_FIELD, secondary_sha.as_str()),
                ]),
                baselines: Filter::And(vec![tagged, Filter::Or(not_candidate)]),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use wandb_run_model::{Run, RunState};

    fn tags() -> Vec<String> {
        vec!["baseline".to_string()]
    }

    fn run(id: &str, tags: &[&str], config: &[(&str, &str)]) -> Run {
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
                .map(|(k, v)| (k.to_string(), Value::from(*v)))
                .collect::<BTreeMap<_, _>>(),
            summary_metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn run_id_plan() {
        let selection = Selection::RunId {
            run_id: "run42".to_string(),
            ignored_sha: None,
        };
        let plan = build_query_plan(&selection, &tags());

        assert!(plan.candidates.matches(&run("run42", &[], &[])));
        assert!(!plan.candidates.matches(&run("run43", &["baseline"], &[])));

        assert!(plan.baselines.matches(&run("run43", &["baseline"], &[])));
        assert!(!plan.baselines.matches(&run("run42", &["baseline"], &[])));
        assert!(!plan.baselines.matches(&run("run44", &["nightly"], &[])));

        assert_eq!(
            plan.baselines.to_json(),
            json!({"$and": [{"tags": {"$in": ["baseline"]}}, {"name": {"$ne": "run42"}}]})
        );
    }

    #[test]
    fn run_id_wins_over_sha() {
        let selection = Selection::RunId {
            run_id: "run42".to_string(),
            ignored_sha: Some("abc123".to_string()),
        };
        let plan = build_query_plan(&selection, &tags());

        assert_eq!(plan.candidates, Filter::eq("name", "run42"));
        assert!(!plan
            .candidates
            .matches(&run("other", &[], &[("github_sha", "abc123")])));
    }

    #[test]
    fn sha_plan() {
        let selection = Selection::Sha {
            github_sha: "abc123".to_string(),
            secondary_sha: None,
        };
        let plan = build_query_plan(&selection, &tags());

        let candidate = run("c", &[], &[("github_sha", "abc123")]);
        let tagged_without_sha = run("b1", &["baseline"], &[]);
        let tagged_same_sha = run("b2", &["baseline"], &[("github_sha", "abc123")]);
        let tagged_other_sha = run("b3", &["baseline"], &[("github_sha", "fff000")]);

        assert!(plan.candidates.matches(&candidate));
        assert!(!plan.candidates.matches(&tagged_without_sha));

        assert!(plan.baselines.matches(&tagged_without_sha));
        assert!(plan.baselines.matches(&tagged_other_sha));
        assert!(!plan.baselines.matches(&tagged_same_sha));
        assert!(!plan.baselines.matches(&candidate));
    }

    #[test]
    fn sha_and_secondary_plan() {
        let selection = Selection::Sha {
            github_sha: "abc123".to_string(),
            secondary_sha: Some("def456".to_string()),
        };
        let plan = build_query_plan(&selection, &tags());

        let both = run(
            "c",
            &["baseline"],
            &[("github_sha", "abc123"), ("secondary_sha", "def456")],
        );
        let only_primary = run("b1", &["baseline"], &[("github_sha", "abc123")]);
        let only_secondary = run(
            "b2",
            &["baseline"],
            &[("github_sha", "fff000"), ("secondary_sha", "def456")],
        );

        assert!(plan.candidates.matches(&both));
        assert!(!plan.candidates.matches(&only_primary));

        assert!(!plan.baselines.matches(&both));
        assert!(plan.baselines.matches(&only_primary));
        assert!(plan.baselines.matches(&only_secondary));

        assert_eq!(
            plan.candidates.to_json(),
            json!({"$and": [
                {"config.github_sha": "abc123"},
                {"config.secondary_sha": "def456"},
            ]})
        );
    }
}
