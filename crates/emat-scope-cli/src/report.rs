//! JSON reports emitted by the CLI.

use std::collections::BTreeMap;

use serde::Serialize;

use emat_scope::{ScalarValue, Scope};

/// Machine-readable result of `validate --json`.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeSummaryV1 {
    pub version: &'static str,
    pub name: String,
    pub desc: String,
    pub random_seed: u64,
    pub constants: Vec<String>,
    pub uncertainties: Vec<String>,
    pub levers: Vec<String>,
    pub measures: Vec<String>,
    pub digest: String,
}

impl ScopeSummaryV1 {
    pub fn new(scope: &Scope, digest: String) -> Self {
        let owned = |names: Vec<&str>| names.into_iter().map(str::to_string).collect();
        Self {
            version: "scope_summary_v1",
            name: scope.name().to_string(),
            desc: scope.desc().to_string(),
            random_seed: scope.random_seed(),
            constants: owned(scope.constant_names()),
            uncertainties: owned(scope.uncertainty_names()),
            levers: owned(scope.lever_names()),
            measures: owned(scope.measure_names()),
            digest,
        }
    }
}

/// Default value for every parameter, falling back to the domain-derived
/// default when the file leaves it out.
pub fn effective_defaults(scope: &Scope) -> BTreeMap<String, ScalarValue> {
    scope
        .parameters()
        .into_iter()
        .filter_map(|p| p.effective_default().map(|v| (p.name.clone(), v)))
        .collect()
}
