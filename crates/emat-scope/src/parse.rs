//! Scope document loader.
//!
//! The document is first read into an ordered `serde_yaml::Value` tree and
//! then converted record by record, so that:
//! - variable ordering within `inputs`/`outputs` is preserved, and
//! - every error names the exact field that is malformed.
//!
//! Duplicate keys inside a mapping are rejected by the YAML layer itself.

use serde_yaml::{Mapping, Value};

use crate::error::ScopeFormatError;
use crate::measure::{Measure, MeasureKind, Transform};
use crate::parameter::{DType, Distribution, Domain, Parameter, ParameterKind, Peak, DEFAULT_PERT_GAMMA};
use crate::scope::Scope;
use crate::value::ScalarValue;

const INPUT_KEYS: &[&str] = &[
    "ptype", "desc", "dtype", "default", "min", "max", "dist", "corr", "values",
];
const OUTPUT_KEYS: &[&str] = &["kind", "desc", "transform", "metamodeltype", "min", "max"];

pub fn parse_scope(text: &str) -> Result<Scope, ScopeFormatError> {
    let doc: Value = serde_yaml::from_str(text)?;
    let root = doc
        .as_mapping()
        .ok_or_else(|| ScopeFormatError::wrong_type("<document>", "a mapping at the top level"))?;

    for key in ["scope", "inputs", "outputs"] {
        if !root.contains_key(key) {
            return Err(ScopeFormatError::missing("<document>", key));
        }
    }

    let header = root
        .get("scope")
        .and_then(Value::as_mapping)
        .ok_or_else(|| ScopeFormatError::wrong_type("scope", "a mapping with `name` and `desc`"))?;
    let name = match field(header, "name") {
        Some(v) => scalar_text(v).ok_or_else(|| ScopeFormatError::wrong_type("scope.name", "a string"))?,
        None => return Err(ScopeFormatError::missing("scope", "name")),
    };
    let desc = match field(header, "desc") {
        Some(v) => scalar_text(v).ok_or_else(|| ScopeFormatError::wrong_type("scope.desc", "a string"))?,
        None => String::new(),
    };

    let inputs = root.get("inputs").and_then(Value::as_mapping).ok_or_else(|| {
        ScopeFormatError::wrong_type(
            "inputs",
            "a mapping with (name: attributes) key:value pairs",
        )
    })?;
    let outputs = root.get("outputs").and_then(Value::as_mapping).ok_or_else(|| {
        ScopeFormatError::wrong_type(
            "outputs",
            "a mapping with (name: attributes) key:value pairs",
        )
    })?;

    let mut parameters = Vec::with_capacity(inputs.len());
    for (key, attrs) in inputs {
        let name = key_name(key, "inputs")?;
        parameters.push(parse_parameter(&name, attrs)?);
    }

    let mut measures = Vec::with_capacity(outputs.len());
    for (key, attrs) in outputs {
        let name = key_name(key, "outputs")?;
        measures.push(parse_measure(&name, attrs)?);
    }

    let mut scope = Scope::new(name, desc, parameters, measures)?;
    if let Some(seed) = root.get("random_seed") {
        let seed = seed
            .as_u64()
            .ok_or_else(|| ScopeFormatError::wrong_type("random_seed", "a non-negative integer"))?;
        scope = scope.with_random_seed(seed);
    }
    Ok(scope)
}

// ============================================================================
// Inputs
// ============================================================================

fn parse_parameter(name: &str, attrs: &Value) -> Result<Parameter, ScopeFormatError> {
    let path = format!("inputs.{name}");
    let map = attrs
        .as_mapping()
        .ok_or_else(|| ScopeFormatError::wrong_type(&path, "a mapping of input attributes"))?;
    warn_unknown_keys(&path, map, INPUT_KEYS);

    let kind = match field(map, "ptype") {
        None => {
            return Err(ScopeFormatError::invalid(
                &path,
                "missing ptype, must be uncertainty, policy lever, or constant",
            ))
        }
        Some(Value::String(s)) => ParameterKind::parse(s).ok_or_else(|| {
            ScopeFormatError::invalid(format!("{path}.ptype"), format!("invalid ptype `{s}`"))
        })?,
        Some(_) => return Err(ScopeFormatError::wrong_type(format!("{path}.ptype"), "a string")),
    };

    let desc = optional_text(map, "desc", &path)?;
    let default = optional_scalar(map, "default", &path)?;
    let min = optional_scalar(map, "min", &path)?;
    let max = optional_scalar(map, "max", &path)?;

    let values = match field(map, "values") {
        None => None,
        Some(Value::Sequence(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(ScalarValue::from_yaml(item).ok_or_else(|| {
                    ScopeFormatError::wrong_type(format!("{path}.values[{i}]"), "a scalar")
                })?);
            }
            Some(out)
        }
        Some(_) => return Err(ScopeFormatError::wrong_type(format!("{path}.values"), "a list")),
    };

    let dtype = match field(map, "dtype") {
        None => infer_dtype(default.as_ref(), min.as_ref(), max.as_ref(), values.is_some()),
        Some(Value::String(s)) => DType::parse(s).ok_or_else(|| {
            ScopeFormatError::invalid(format!("{path}.dtype"), format!("invalid dtype `{s}`"))
        })?,
        Some(_) => return Err(ScopeFormatError::wrong_type(format!("{path}.dtype"), "a string")),
    };

    if values.is_some() && dtype != DType::Cat {
        return Err(ScopeFormatError::invalid(
            format!("{path}.values"),
            "values is only allowed for cat inputs",
        ));
    }

    let domain = match dtype {
        DType::Float => Domain::Float {
            min: float_bound(min.as_ref(), &path, "min")?,
            max: float_bound(max.as_ref(), &path, "max")?,
        },
        DType::Int => Domain::Int {
            min: int_bound(min.as_ref(), &path, "min")?,
            max: int_bound(max.as_ref(), &path, "max")?,
        },
        DType::Bool | DType::Cat => {
            if min.is_some() || max.is_some() {
                return Err(ScopeFormatError::invalid(
                    &path,
                    format!("min/max are not allowed for {dtype} inputs"),
                ));
            }
            if dtype == DType::Bool {
                Domain::Bool
            } else {
                Domain::Cat {
                    values: values.unwrap_or_default(),
                }
            }
        }
    };

    let default = match (default, dtype) {
        (Some(v), DType::Float) => Some(ScalarValue::Float(v.as_f64().ok_or_else(|| {
            ScopeFormatError::wrong_type(format!("{path}.default"), "a number")
        })?)),
        (Some(v), DType::Int) => Some(ScalarValue::Int(v.as_i64().ok_or_else(|| {
            ScopeFormatError::wrong_type(format!("{path}.default"), "an integer")
        })?)),
        (other, _) => other,
    };

    let dist = match field(map, "dist") {
        None => None,
        Some(v) => Some(parse_distribution(v, &format!("{path}.dist"))?),
    };

    let corr = match field(map, "corr") {
        None => None,
        Some(Value::Sequence(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let partner = item.as_str().ok_or_else(|| {
                    ScopeFormatError::wrong_type(format!("{path}.corr[{i}]"), "an input name")
                })?;
                out.push(partner.to_string());
            }
            Some(out)
        }
        Some(_) => {
            return Err(ScopeFormatError::wrong_type(
                format!("{path}.corr"),
                "a list of input names",
            ))
        }
    };

    Ok(Parameter {
        name: name.to_string(),
        kind,
        desc,
        domain,
        default,
        dist,
        corr,
    })
}

fn infer_dtype(
    default: Option<&ScalarValue>,
    min: Option<&ScalarValue>,
    max: Option<&ScalarValue>,
    has_values: bool,
) -> DType {
    if has_values {
        return DType::Cat;
    }
    match default {
        Some(ScalarValue::Bool(_)) => return DType::Bool,
        Some(ScalarValue::Str(_)) => return DType::Cat,
        _ => {}
    }
    let all_int = [default, min, max]
        .into_iter()
        .flatten()
        .all(|v| matches!(v, ScalarValue::Int(_)));
    let any = default.is_some() || min.is_some() || max.is_some();
    if any && all_int {
        DType::Int
    } else {
        DType::Float
    }
}

fn float_bound(
    value: Option<&ScalarValue>,
    path: &str,
    key: &str,
) -> Result<Option<f64>, ScopeFormatError> {
    value
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| ScopeFormatError::wrong_type(format!("{path}.{key}"), "a number"))
        })
        .transpose()
}

fn int_bound(
    value: Option<&ScalarValue>,
    path: &str,
    key: &str,
) -> Result<Option<i64>, ScopeFormatError> {
    value
        .map(|v| {
            v.as_i64()
                .ok_or_else(|| ScopeFormatError::wrong_type(format!("{path}.{key}"), "an integer"))
        })
        .transpose()
}

/// `dist` is either a bare name or a mapping with `name` and parameters.
fn parse_distribution(value: &Value, path: &str) -> Result<Distribution, ScopeFormatError> {
    let (name, params) = match value {
        Value::String(s) => (s.as_str(), None),
        Value::Mapping(map) => {
            let name = field(map, "name")
                .and_then(Value::as_str)
                .ok_or_else(|| ScopeFormatError::missing(path, "name"))?;
            (name, Some(map))
        }
        _ => {
            return Err(ScopeFormatError::wrong_type(
                path,
                "a distribution name or a mapping with `name`",
            ))
        }
    };

    let number = |key: &str| -> Result<Option<f64>, ScopeFormatError> {
        match params.and_then(|m| field(m, key)) {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| ScopeFormatError::wrong_type(format!("{path}.{key}"), "a number")),
        }
    };
    let peak = || -> Result<Peak, ScopeFormatError> {
        match (number("peak")?, number("rel_peak")?) {
            (Some(_), Some(_)) => Err(ScopeFormatError::invalid(
                path,
                "give either `peak` or `rel_peak`, not both",
            )),
            (Some(x), None) => Ok(Peak::Absolute(x)),
            (None, Some(r)) => Ok(Peak::Relative(r)),
            (None, None) => Ok(Peak::Relative(0.5)),
        }
    };

    match name.trim().to_ascii_lowercase().as_str() {
        "constant" => Ok(Distribution::Constant),
        "uniform" => Ok(Distribution::Uniform),
        "triangle" | "triangular" => Ok(Distribution::Triangle { peak: peak()? }),
        "pert" => Ok(Distribution::Pert {
            peak: peak()?,
            gamma: number("gamma")?.unwrap_or(DEFAULT_PERT_GAMMA),
        }),
        other => Err(ScopeFormatError::invalid(
            path,
            format!("unknown distribution `{other}`"),
        )),
    }
}

// ============================================================================
// Outputs
// ============================================================================

fn parse_measure(name: &str, attrs: &Value) -> Result<Measure, ScopeFormatError> {
    let path = format!("outputs.{name}");
    let map = match attrs {
        Value::Mapping(map) => map,
        Value::Null => {
            tracing::warn!(output = %name, "output has no attributes; treating as an info measure");
            return Ok(Measure::new(name));
        }
        _ => return Err(ScopeFormatError::wrong_type(&path, "a mapping of output attributes")),
    };
    warn_unknown_keys(&path, map, OUTPUT_KEYS);

    let kind = match field(map, "kind") {
        None => MeasureKind::Info,
        Some(Value::String(s)) => MeasureKind::parse(s).ok_or_else(|| {
            ScopeFormatError::invalid(format!("{path}.kind"), format!("invalid kind `{s}`"))
        })?,
        Some(Value::Number(n)) => n.as_i64().and_then(MeasureKind::from_sign).ok_or_else(|| {
            ScopeFormatError::invalid(format!("{path}.kind"), format!("invalid kind `{n}`"))
        })?,
        Some(_) => return Err(ScopeFormatError::wrong_type(format!("{path}.kind"), "a string")),
    };

    let transform = match field(map, "transform") {
        None => None,
        Some(Value::String(s)) => Some(Transform::parse(s).ok_or_else(|| {
            ScopeFormatError::invalid(
                format!("{path}.transform"),
                format!("invalid transform `{s}`"),
            )
        })?),
        Some(_) => {
            return Err(ScopeFormatError::wrong_type(
                format!("{path}.transform"),
                "a string",
            ))
        }
    };

    let bound = |key: &str| -> Result<Option<f64>, ScopeFormatError> {
        field(map, key)
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| ScopeFormatError::wrong_type(format!("{path}.{key}"), "a number"))
            })
            .transpose()
    };

    Ok(Measure {
        name: name.to_string(),
        kind,
        desc: optional_text(map, "desc", &path)?,
        transform,
        metamodel_type: optional_text(map, "metamodeltype", &path)?,
        min: bound("min")?,
        max: bound("max")?,
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// A present, non-null field.
fn field<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn key_name(key: &Value, section: &str) -> Result<String, ScopeFormatError> {
    scalar_text(key).ok_or_else(|| ScopeFormatError::wrong_type(section, "scalar variable names"))
}

/// Strings as-is; numbers and booleans in their plain spelling.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn optional_text(map: &Mapping, key: &str, path: &str) -> Result<Option<String>, ScopeFormatError> {
    field(map, key)
        .map(|v| scalar_text(v).ok_or_else(|| ScopeFormatError::wrong_type(format!("{path}.{key}"), "a string")))
        .transpose()
}

fn optional_scalar(
    map: &Mapping,
    key: &str,
    path: &str,
) -> Result<Option<ScalarValue>, ScopeFormatError> {
    field(map, key)
        .map(|v| {
            ScalarValue::from_yaml(v)
                .ok_or_else(|| ScopeFormatError::wrong_type(format!("{path}.{key}"), "a scalar"))
        })
        .transpose()
}

fn warn_unknown_keys(path: &str, map: &Mapping, known: &[&str]) {
    for key in map.keys() {
        let known_key = key.as_str().map(|k| known.contains(&k)).unwrap_or(false);
        if !known_key {
            tracing::warn!(record = %path, key = ?key, "ignoring unknown attribute");
        }
    }
}
