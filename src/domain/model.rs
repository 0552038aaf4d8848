use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Body of one audit submission.
///
/// Only `requires` is interpreted. Everything else the lockfile contributed
/// (dependency tree, install/remove lists, metadata) is carried in `other`
/// untouched and serialised back at the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRequest {
    #[serde(default)]
    pub requires: BTreeMap<String, String>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

/// Raw registry response. Fields not consumed by the unifier are dropped.
///
/// Registries disagree on which advisory fields may be `null`, so the
/// descriptive fields fall back to empty values instead of failing the
/// whole report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub advisories: BTreeMap<String, Advisory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub module_name: String,
    #[serde(default, deserialize_with = "lenient_severity")]
    pub severity: Severity,
    #[serde(default, deserialize_with = "lenient_string")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dev: bool,
    #[serde(default, deserialize_with = "lenient_paths")]
    pub paths: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Anything that is not a known severity string becomes `Unknown`.
fn lenient_severity<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Keeps the string entries of a path list; anything else yields no paths.
fn lenient_paths<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(path) => Some(path),
                _ => None,
            })
            .collect()),
        _ => Ok(Vec::new()),
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Moderate,
    High,
    Critical,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of auditing one top-level dependency.
#[derive(Debug, Clone, PartialEq)]
pub enum DepResult {
    Success(AuditReport),
    Failure(String),
}

impl From<std::result::Result<AuditReport, String>> for DepResult {
    fn from(result: std::result::Result<AuditReport, String>) -> Self {
        match result {
            Ok(report) => DepResult::Success(report),
            Err(message) => DepResult::Failure(message),
        }
    }
}

/// Per-dependency results keyed by top-level dependency name.
pub type DepResults = BTreeMap<String, DepResult>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFinding {
    pub paths: Vec<String>,
    pub overview: String,
}

/// `severity -> "pkg@version" -> finding`
pub type SeverityBuckets = BTreeMap<Severity, BTreeMap<String, PackageFinding>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedReport {
    pub prod: SeverityBuckets,
    pub dev: SeverityBuckets,
    pub errors: BTreeMap<String, String>,
}

impl UnifiedReport {
    /// Number of distinct vulnerable `pkg@version` entries across both environments.
    pub fn finding_count(&self) -> usize {
        self.prod
            .values()
            .chain(self.dev.values())
            .map(|bucket| bucket.len())
            .sum()
    }
}

/// Parsed project files handed from the reader to the rest of the run.
#[derive(Debug, Clone)]
pub struct ProjectFiles {
    pub manifest: Value,
    pub lockfile: Value,
    pub lockfile_kind: LockfileKind,
}

impl ProjectFiles {
    /// `dependencies` overlaid with `devDependencies`; dev specs win on collision.
    pub fn requires(&self) -> BTreeMap<String, String> {
        let mut requires = BTreeMap::new();
        for section in ["dependencies", "devDependencies"] {
            if let Some(deps) = self.manifest.get(section).and_then(|v| v.as_object()) {
                for (name, spec) in deps {
                    let spec = match spec {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    requires.insert(name.clone(), spec);
                }
            }
        }
        requires
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockfileKind {
    Shrinkwrap,
    PackageLock,
}

impl LockfileKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            LockfileKind::Shrinkwrap => "npm-shrinkwrap.json",
            LockfileKind::PackageLock => "package-lock.json",
        }
    }
}

/// Outcome of checking the lockfile against the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockVerification {
    pub status: bool,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_keeps_unknown_fields() {
        let raw = json!({
            "name": "app",
            "requires": {"a": "^1.0.0"},
            "dependencies": {"a": {"version": "1.0.3"}},
            "metadata": {"platform": "linux"}
        });

        let request: AuditRequest = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(request.requires.get("a").unwrap(), "^1.0.0");
        assert!(request.other.contains_key("dependencies"));
        assert_eq!(serde_json::to_value(&request).unwrap(), raw);
    }

    #[test]
    fn test_unexpected_severity_falls_back_to_unknown() {
        let advisory: Advisory = serde_json::from_value(json!({
            "module_name": "x",
            "severity": "catastrophic",
            "overview": "",
            "findings": []
        }))
        .unwrap();
        assert_eq!(advisory.severity, Severity::Unknown);

        let severity: Severity = serde_json::from_value(json!("moderate")).unwrap();
        assert_eq!(severity, Severity::Moderate);
    }

    #[test]
    fn test_null_advisory_fields_do_not_fail_the_report() {
        let report: AuditReport = serde_json::from_value(json!({
            "actions": [{"action": "update", "module": "x"}],
            "advisories": {
                "1": {
                    "module_name": "x",
                    "severity": null,
                    "overview": null,
                    "findings": [
                        {"version": "1.0.0", "dev": null, "paths": null},
                        {"version": "1.0.1", "paths": ["a>x", null, 3, "b>x"]}
                    ]
                },
                "2": {
                    "module_name": "y",
                    "severity": 5,
                    "overview": {"text": "nested"},
                    "findings": null
                }
            }
        }))
        .unwrap();

        let x = &report.advisories["1"];
        assert_eq!(x.severity, Severity::Unknown);
        assert_eq!(x.overview, "");
        assert!(x.findings[0].paths.is_empty());
        assert!(!x.findings[0].dev);
        assert_eq!(x.findings[1].paths, vec!["a>x", "b>x"]);

        let y = &report.advisories["2"];
        assert_eq!(y.severity, Severity::Unknown);
        assert_eq!(y.overview, "");
        assert!(y.findings.is_empty());
    }

    #[test]
    fn test_report_tolerates_missing_sections() {
        let report: AuditReport = serde_json::from_value(json!({"muted": []})).unwrap();
        assert!(report.actions.is_empty());
        assert!(report.advisories.is_empty());

        let report: AuditReport =
            serde_json::from_value(json!({"actions": null, "advisories": null})).unwrap();
        assert!(report.actions.is_empty());
        assert!(report.advisories.is_empty());
    }

    #[test]
    fn test_requires_prefers_dev_dependencies() {
        let project = ProjectFiles {
            manifest: json!({
                "dependencies": {"a": "^1.0.0", "b": "2.0.0"},
                "devDependencies": {"b": "^2.1.0", "c": "*"}
            }),
            lockfile: json!({}),
            lockfile_kind: LockfileKind::PackageLock,
        };

        let requires = project.requires();
        assert_eq!(requires.len(), 3);
        assert_eq!(requires["b"], "^2.1.0");
        assert_eq!(requires["c"], "*");
    }

    #[test]
    fn test_severity_serializes_as_map_key() {
        let mut report = UnifiedReport::default();
        report
            .prod
            .entry(Severity::High)
            .or_default()
            .insert("left-pad@1.0.0".to_string(), PackageFinding::default());

        let value = serde_json::to_value(&report).unwrap();
        assert!(value["prod"]["high"]["left-pad@1.0.0"].is_object());
        assert_eq!(value["dev"], json!({}));
        assert_eq!(report.finding_count(), 1);
    }
}
