use crate::domain::model::{DepResult, DepResults, UnifiedReport};

/// Folds per-dependency results into one report bucketed by environment
/// and severity. Never fails.
pub fn unify(results: &DepResults) -> UnifiedReport {
    let mut report = UnifiedReport::default();

    for (dep, result) in results {
        let audit = match result {
            DepResult::Failure(message) => {
                report.errors.insert(dep.clone(), message.clone());
                continue;
            }
            DepResult::Success(audit) => audit,
        };

        // No actions means nothing the user can fix for this dependency.
        if audit.actions.is_empty() {
            continue;
        }

        for advisory in audit.advisories.values() {
            for finding in &advisory.findings {
                let environment = if finding.dev {
                    &mut report.dev
                } else {
                    &mut report.prod
                };

                let entry = environment
                    .entry(advisory.severity)
                    .or_default()
                    .entry(format!("{}@{}", advisory.module_name, finding.version))
                    .or_default();

                entry
                    .paths
                    .extend(finding.paths.iter().map(|path| readable_path(path)));
                entry.overview = advisory.overview.clone();
            }
        }
    }

    report
}

/// `a>b>c` becomes `a > b > c`.
fn readable_path(path: &str) -> String {
    path.split('>').collect::<Vec<_>>().join(" > ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Advisory, AuditReport, Finding, Severity};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn advisory(module: &str, severity: Severity, findings: Vec<Finding>) -> Advisory {
        Advisory {
            module_name: module.to_string(),
            severity,
            overview: format!("{module} is vulnerable"),
            findings,
        }
    }

    fn finding(version: &str, dev: bool, paths: &[&str]) -> Finding {
        Finding {
            version: version.to_string(),
            dev,
            paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn report_with(advisories: Vec<(&str, Advisory)>) -> AuditReport {
        AuditReport {
            actions: vec![json!({"action": "update"})],
            advisories: advisories
                .into_iter()
                .map(|(id, a)| (id.to_string(), a))
                .collect(),
        }
    }

    #[test]
    fn test_paths_accumulate_across_dependencies() {
        let mut results = BTreeMap::new();
        results.insert(
            "a".to_string(),
            DepResult::Success(report_with(vec![(
                "1",
                advisory("left-pad", Severity::High, vec![finding("1.0.0", false, &["a>b"])]),
            )])),
        );
        results.insert(
            "c".to_string(),
            DepResult::Success(report_with(vec![(
                "1",
                advisory("left-pad", Severity::High, vec![finding("1.0.0", false, &["c>d"])]),
            )])),
        );

        let report = unify(&results);

        let entry = &report.prod[&Severity::High]["left-pad@1.0.0"];
        assert_eq!(entry.paths, vec!["a > b", "c > d"]);
        assert_eq!(entry.overview, "left-pad is vulnerable");
        assert!(report.dev.is_empty());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_paths_accumulate_within_one_advisory() {
        let mut results = BTreeMap::new();
        results.insert(
            "a".to_string(),
            DepResult::Success(report_with(vec![(
                "1",
                advisory(
                    "left-pad",
                    Severity::High,
                    vec![
                        finding("1.0.0", false, &["a>b"]),
                        finding("1.0.0", false, &["c>d"]),
                    ],
                ),
            )])),
        );

        let report = unify(&results);
        assert_eq!(
            report.prod[&Severity::High]["left-pad@1.0.0"].paths,
            vec!["a > b", "c > d"]
        );
    }

    #[test]
    fn test_dev_findings_land_in_dev() {
        let mut results = BTreeMap::new();
        results.insert(
            "mocha".to_string(),
            DepResult::Success(report_with(vec![(
                "118",
                advisory(
                    "growl",
                    Severity::Critical,
                    vec![
                        finding("1.9.2", true, &["mocha>growl"]),
                        finding("1.10.0", false, &["mocha>growl"]),
                    ],
                ),
            )])),
        );

        let report = unify(&results);

        assert_eq!(
            report.dev[&Severity::Critical]["growl@1.9.2"].paths,
            vec!["mocha > growl"]
        );
        assert!(report.prod[&Severity::Critical].contains_key("growl@1.10.0"));
        assert_eq!(report.finding_count(), 2);
    }

    #[test]
    fn test_zero_actions_contribute_nothing() {
        let mut audit = report_with(vec![(
            "1",
            advisory("minimist", Severity::Low, vec![finding("0.0.8", false, &["x>minimist"])]),
        )]);
        audit.actions.clear();

        let mut results = BTreeMap::new();
        results.insert("x".to_string(), DepResult::Success(audit));

        let report = unify(&results);
        assert_eq!(report, UnifiedReport::default());
    }

    #[test]
    fn test_failure_passes_through_to_errors() {
        let mut results = BTreeMap::new();
        results.insert(
            "lodash".to_string(),
            DepResult::Failure("ETIMEDOUT".to_string()),
        );

        let report = unify(&results);

        assert_eq!(report.errors["lodash"], "ETIMEDOUT");
        assert!(report.prod.is_empty());
        assert!(report.dev.is_empty());
    }

    #[test]
    fn test_overview_is_last_write() {
        let mut first = advisory("qs", Severity::Moderate, vec![finding("6.0.0", false, &["a>qs"])]);
        first.overview = "first".to_string();
        let mut second = advisory("qs", Severity::Moderate, vec![finding("6.0.0", false, &["b>qs"])]);
        second.overview = "second".to_string();

        let mut results = BTreeMap::new();
        results.insert("a".to_string(), DepResult::Success(report_with(vec![("1", first)])));
        results.insert("b".to_string(), DepResult::Success(report_with(vec![("1", second)])));

        let report = unify(&results);
        let entry = &report.prod[&Severity::Moderate]["qs@6.0.0"];
        assert_eq!(entry.overview, "second");
        assert_eq!(entry.paths, vec!["a > qs", "b > qs"]);
    }

    #[test]
    fn test_readable_path() {
        assert_eq!(readable_path("a>b>c"), "a > b > c");
        assert_eq!(readable_path("single"), "single");
        assert_eq!(readable_path(""), "");
    }
}
