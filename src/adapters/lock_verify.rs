//! Checks a lockfile against the dependencies declared in `package.json`.

use crate::core::{LockVerification, LockVerifier, ProjectFiles};
use semver::{Version, VersionReq};
use serde_json::Value;

#[derive(Debug, Default, Clone, Copy)]
pub struct LockfileVerifier;

impl LockVerifier for LockfileVerifier {
    fn verify(&self, project: &ProjectFiles) -> LockVerification {
        let mut errors = Vec::new();

        for (name, spec) in project.requires() {
            let Some(locked) = locked_version(&project.lockfile, &name) else {
                errors.push(format!("Missing: {}@{}", name, spec));
                continue;
            };

            match range_satisfied(&spec, &locked) {
                Some(false) => errors.push(format!(
                    "Invalid: lock file's {}@{} does not satisfy {}@{}",
                    name, locked, name, spec
                )),
                Some(true) => {}
                None => tracing::debug!("{}@{} is not a semver range, skipping", name, spec),
            }
        }

        LockVerification {
            status: errors.is_empty(),
            errors,
        }
    }
}

/// Version of a top-level package in a v1 (`dependencies`) or v2/v3
/// (`packages`) lockfile.
fn locked_version(lockfile: &Value, name: &str) -> Option<String> {
    lockfile
        .get("dependencies")
        .and_then(|deps| deps.get(name))
        .and_then(|entry| entry.get("version"))
        .or_else(|| {
            lockfile
                .get("packages")
                .and_then(|packages| packages.get(format!("node_modules/{}", name)))
                .and_then(|entry| entry.get("version"))
        })
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// `None` when either side is not plain semver (git urls, dist-tags,
/// `file:` specs, aliased or tarball versions).
fn range_satisfied(spec: &str, locked: &str) -> Option<bool> {
    let version = Version::parse(locked.trim().trim_start_matches('v')).ok()?;

    let mut any_parsed = false;
    for alternative in spec.split("||") {
        let req = match to_version_req(alternative) {
            Some(req) => req,
            None => continue,
        };
        any_parsed = true;
        if req.matches(&version) {
            return Some(true);
        }
    }

    any_parsed.then_some(false)
}

/// Rewrites one npm range (no `||`) into `semver` crate syntax.
fn to_version_req(range: &str) -> Option<VersionReq> {
    let range = range.trim();
    if range.is_empty() || range == "*" || range.eq_ignore_ascii_case("x") {
        return Some(VersionReq::STAR);
    }

    let comparators: Vec<String> = if let Some((low, high)) = range.split_once(" - ") {
        vec![
            format!(">={}", low.trim().trim_start_matches('v')),
            format!("<={}", high.trim().trim_start_matches('v')),
        ]
    } else {
        join_operators(range)
            .into_iter()
            .map(|comparator| {
                let bare = comparator.trim_start_matches('v');
                let is_wildcard = bare
                    .split('.')
                    .any(|part| part == "*" || part.eq_ignore_ascii_case("x"));
                if is_wildcard {
                    bare.split('.')
                        .map(|part| if part.eq_ignore_ascii_case("x") { "*" } else { part })
                        .collect::<Vec<_>>()
                        .join(".")
                } else if bare.starts_with(|c: char| c.is_ascii_digit()) {
                    // npm treats a bare version as an exact match
                    format!("={}", bare)
                } else {
                    comparator
                }
            })
            .collect()
    };

    VersionReq::parse(&comparators.join(", ")).ok()
}

/// Splits on whitespace, keeping `>= 1.2.3` together as one comparator.
fn join_operators(range: &str) -> Vec<String> {
    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;

    for token in range.split_whitespace() {
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^')) {
            pending_op = Some(token);
            continue;
        }
        match pending_op.take() {
            Some(op) => comparators.push(format!("{}{}", op, token)),
            None => comparators.push(token.to_string()),
        }
    }

    comparators
}
