//! Canonical YAML dump of a `Scope`.
//!
//! Keys are emitted in a fixed order and variables keep their document
//! order, so `parse(dump(scope)) == scope` and re-dumping is idempotent.
//! Comments and blank lines of the source document are not preserved.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::ScopeError;
use crate::measure::Measure;
use crate::parameter::{Distribution, Domain, Parameter, Peak};
use crate::scope::{Scope, DEFAULT_RANDOM_SEED};

#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    /// Drop `transform` from every measure.
    pub strip_measure_transforms: bool,
    /// When set, only measures named here are written.
    pub include_measures: Option<BTreeSet<String>>,
    /// When set, measures named here are skipped.
    pub exclude_measures: Option<BTreeSet<String>>,
}

impl DumpOptions {
    fn keeps(&self, measure: &str) -> bool {
        let included = self
            .include_measures
            .as_ref()
            .map(|set| set.contains(measure))
            .unwrap_or(true);
        let excluded = self
            .exclude_measures
            .as_ref()
            .map(|set| set.contains(measure))
            .unwrap_or(false);
        included && !excluded
    }
}

pub fn dump_scope(scope: &Scope, options: &DumpOptions) -> Result<String, ScopeError> {
    serde_yaml::to_string(&scope_to_yaml(scope, options)).map_err(ScopeError::Serialize)
}

/// Write the dump to a new file; an existing file is never overwritten.
pub fn dump_scope_to_file(
    scope: &Scope,
    path: impl AsRef<Path>,
    options: &DumpOptions,
) -> Result<(), ScopeError> {
    let path = path.as_ref();
    let text = dump_scope(scope, options)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| {
            if source.kind() == std::io::ErrorKind::AlreadyExists {
                ScopeError::FileExists(path.to_path_buf())
            } else {
                ScopeError::Write {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
    file.write_all(text.as_bytes())
        .map_err(|source| ScopeError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), scope = %scope.name(), "wrote scope dump");
    Ok(())
}

fn scope_to_yaml(scope: &Scope, options: &DumpOptions) -> Value {
    let mut header = Mapping::new();
    header.insert("name".into(), scope.name().into());
    header.insert("desc".into(), scope.desc().into());

    let mut root = Mapping::new();
    root.insert("scope".into(), Value::Mapping(header));
    if scope.random_seed() != DEFAULT_RANDOM_SEED {
        root.insert("random_seed".into(), scope.random_seed().into());
    }

    let mut inputs = Mapping::new();
    for p in scope.inputs() {
        inputs.insert(p.name.as_str().into(), parameter_to_yaml(p));
    }
    root.insert("inputs".into(), Value::Mapping(inputs));

    let mut outputs = Mapping::new();
    for m in scope.measures().iter().filter(|m| options.keeps(&m.name)) {
        outputs.insert(m.name.as_str().into(), measure_to_yaml(m, options));
    }
    root.insert("outputs".into(), Value::Mapping(outputs));

    Value::Mapping(root)
}

fn parameter_to_yaml(p: &Parameter) -> Value {
    let mut map = Mapping::new();
    map.insert("ptype".into(), p.kind.as_str().into());
    if let Some(desc) = &p.desc {
        map.insert("desc".into(), desc.as_str().into());
    }
    map.insert("dtype".into(), p.dtype().as_str().into());
    if let Some(default) = &p.default {
        map.insert("default".into(), default.to_yaml());
    }
    match &p.domain {
        Domain::Float { min, max } => {
            if let Some(lo) = min {
                map.insert("min".into(), (*lo).into());
            }
            if let Some(hi) = max {
                map.insert("max".into(), (*hi).into());
            }
        }
        Domain::Int { min, max } => {
            if let Some(lo) = min {
                map.insert("min".into(), (*lo).into());
            }
            if let Some(hi) = max {
                map.insert("max".into(), (*hi).into());
            }
        }
        Domain::Bool | Domain::Cat { .. } => {}
    }
    if let Some(dist) = &p.dist {
        map.insert("dist".into(), distribution_to_yaml(dist));
    }
    if let Some(corr) = &p.corr {
        let partners = corr.iter().map(|c| Value::from(c.as_str())).collect();
        map.insert("corr".into(), Value::Sequence(partners));
    }
    if let Domain::Cat { values } = &p.domain {
        if !values.is_empty() {
            let items = values.iter().map(|v| v.to_yaml()).collect();
            map.insert("values".into(), Value::Sequence(items));
        }
    }
    Value::Mapping(map)
}

/// Parameterless distributions collapse to their bare name.
fn distribution_to_yaml(dist: &Distribution) -> Value {
    let (peak, gamma) = match dist {
        Distribution::Constant | Distribution::Uniform => return dist.name().into(),
        Distribution::Triangle { peak } => (*peak, None),
        Distribution::Pert { peak, gamma } => (*peak, Some(*gamma)),
    };
    let mut map = Mapping::new();
    map.insert("name".into(), dist.name().into());
    match peak {
        Peak::Absolute(x) => map.insert("peak".into(), x.into()),
        Peak::Relative(r) => map.insert("rel_peak".into(), r.into()),
    };
    if let Some(gamma) = gamma {
        map.insert("gamma".into(), gamma.into());
    }
    Value::Mapping(map)
}

fn measure_to_yaml(m: &Measure, options: &DumpOptions) -> Value {
    let mut map = Mapping::new();
    map.insert("kind".into(), m.kind.as_str().into());
    if let Some(desc) = &m.desc {
        map.insert("desc".into(), desc.as_str().into());
    }
    if let Some(transform) = m.transform.filter(|_| !options.strip_measure_transforms) {
        map.insert("transform".into(), transform.as_str().into());
    }
    if let Some(metamodel_type) = &m.metamodel_type {
        map.insert("metamodeltype".into(), metamodel_type.as_str().into());
    }
    if let Some(lo) = m.min {
        map.insert("min".into(), lo.into());
    }
    if let Some(hi) = m.max {
        map.insert("max".into(), hi.into());
    }
    Value::Mapping(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WITH_TRANSFORMS: &str = r#"
scope:
  name: Scaled
  desc: measures with log scaling
inputs:
  x:
    ptype: uncertainty
    dtype: float
    min: 0
    max: 1
    dist:
      name: triangle
      peak: 0.25
outputs:
  cost:
    kind: minimize
    transform: ln
    metamodeltype: log-linear
  benefit:
    kind: maximize
"#;

    #[test]
    fn keys_are_emitted_in_canonical_order() {
        let scope = Scope::from_yaml_str(WITH_TRANSFORMS).expect("parse");
        let text = dump_scope(&scope, &DumpOptions::default()).expect("dump");
        let scope_pos = text.find("scope:").expect("scope");
        let inputs_pos = text.find("inputs:").expect("inputs");
        let outputs_pos = text.find("outputs:").expect("outputs");
        assert!(scope_pos < inputs_pos && inputs_pos < outputs_pos, "{text}");

        let ptype_pos = text.find("ptype:").expect("ptype");
        let dtype_pos = text.find("dtype:").expect("dtype");
        let min_pos = text.find("min:").expect("min");
        let dist_pos = text.find("dist:").expect("dist");
        assert!(ptype_pos < dtype_pos && dtype_pos < min_pos && min_pos < dist_pos, "{text}");
        assert!(text.contains("peak: 0.25"), "{text}");
        assert!(!text.contains("random_seed"), "{text}");
    }

    #[test]
    fn strip_transforms_and_filter_measures() {
        let scope = Scope::from_yaml_str(WITH_TRANSFORMS).expect("parse");

        let stripped = dump_scope(
            &scope,
            &DumpOptions {
                strip_measure_transforms: true,
                ..Default::default()
            },
        )
        .expect("dump");
        assert!(!stripped.contains("transform"), "{stripped}");
        assert!(stripped.contains("metamodeltype: log-linear"), "{stripped}");

        let excluded = dump_scope(
            &scope,
            &DumpOptions {
                exclude_measures: Some(["cost".to_string()].into_iter().collect()),
                ..Default::default()
            },
        )
        .expect("dump");
        let reparsed = Scope::from_yaml_str(&excluded).expect("reparse");
        assert_eq!(reparsed.measure_names(), vec!["benefit"]);
    }

    #[test]
    fn dump_is_idempotent() {
        let scope = Scope::from_yaml_str(WITH_TRANSFORMS).expect("parse");
        let once = dump_scope(&scope, &DumpOptions::default()).expect("dump");
        let twice = dump_scope(
            &Scope::from_yaml_str(&once).expect("reparse"),
            &DumpOptions::default(),
        )
        .expect("dump");
        assert_eq!(once, twice);
    }

    #[test]
    fn dump_to_file_refuses_to_overwrite() {
        let scope = Scope::from_yaml_str(WITH_TRANSFORMS).expect("parse");
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scope.yaml");

        dump_scope_to_file(&scope, &path, &DumpOptions::default()).expect("first write");
        let reread = Scope::from_yaml_file(&path).expect("reread");
        assert_eq!(reread, scope);

        let err = dump_scope_to_file(&scope, &path, &DumpOptions::default())
            .expect_err("second write should fail");
        assert!(matches!(err, ScopeError::FileExists(_)), "err={err}");
    }
}
