use crate::domain::model::AuditRequest;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Client identity reported in the request metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    pub npm_version: String,
    pub node_version: String,
    pub platform: String,
    pub node_env: Option<String>,
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self {
            npm_version: concat!("split-audit/", env!("CARGO_PKG_VERSION")).to_string(),
            node_version: String::new(),
            platform: std::env::consts::OS.to_string(),
            node_env: std::env::var("NODE_ENV").ok(),
        }
    }
}

/// Builds the full audit request from a parsed lockfile and the merged
/// requires map of the manifest.
///
/// The lockfile is copied, `lockfileVersion` is dropped and `resolved`
/// URLs are scrubbed from the dependency tree before submission.
pub fn generate(
    lockfile: &Value,
    requires: BTreeMap<String, String>,
    metadata: &RequestMetadata,
) -> AuditRequest {
    let mut other: Map<String, Value> = match lockfile {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    other.remove("lockfileVersion");
    other.remove("requires");
    // v2/v3 lockfiles duplicate the tree under `packages`; the audit endpoint reads `dependencies`.
    other.remove("packages");

    if let Some(Value::Object(deps)) = other.get_mut("dependencies") {
        scrub_deps(deps);
    }

    other.insert("install".to_string(), json!([]));
    other.insert("remove".to_string(), json!([]));
    other.insert(
        "metadata".to_string(),
        json!({
            "npm_version": metadata.npm_version,
            "node_version": metadata.node_version,
            "platform": metadata.platform,
            "node_env": metadata.node_env,
        }),
    );

    AuditRequest { requires, other }
}

fn scrub_deps(deps: &mut Map<String, Value>) {
    for dep in deps.values_mut() {
        if let Value::Object(entry) = dep {
            entry.remove("resolved");
            if let Some(Value::Object(nested)) = entry.get_mut("dependencies") {
                scrub_deps(nested);
            }
        }
    }
}
