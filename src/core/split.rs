use crate::domain::model::AuditRequest;
use std::collections::BTreeMap;

/// Splits a full audit request into one request per top-level dependency.
///
/// Every output owns its own deep copy of the non-`requires` payload, so
/// mutating one entry never reaches a sibling or the input.
pub fn split(request: &AuditRequest) -> BTreeMap<String, AuditRequest> {
    request
        .requires
        .keys()
        .map(|name| (name.clone(), narrow(request, name)))
        .collect()
}

/// Deep copy of `request` whose `requires` holds only `dep`.
///
/// `requires` comes out empty when `dep` is not a top-level dependency.
pub fn narrow(request: &AuditRequest, dep: &str) -> AuditRequest {
    AuditRequest {
        requires: request
            .requires
            .get_key_value(dep)
            .map(|(name, spec)| BTreeMap::from([(name.clone(), spec.clone())]))
            .unwrap_or_default(),
        other: request.other.clone(),
    }
}
