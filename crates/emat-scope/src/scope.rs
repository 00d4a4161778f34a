//! The `Scope`: a validated catalog of inputs and outputs.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::dump::{dump_scope, DumpOptions};
use crate::error::{ScopeError, ScopeFormatError};
use crate::measure::Measure;
use crate::parameter::{DType, Domain, Parameter, ParameterKind};
use crate::value::ScalarValue;

pub const DEFAULT_RANDOM_SEED: u64 = 1234;

#[derive(Debug, Clone)]
pub struct Scope {
    name: String,
    desc: String,
    random_seed: u64,
    /// Inputs in document order.
    inputs: Vec<Parameter>,
    /// Outputs in document order.
    outputs: Vec<Measure>,
}

impl Scope {
    /// Build a scope from already-typed records, enforcing every structural
    /// constraint of the scope format.
    pub fn new(
        name: impl Into<String>,
        desc: impl Into<String>,
        inputs: Vec<Parameter>,
        outputs: Vec<Measure>,
    ) -> Result<Self, ScopeFormatError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ScopeFormatError::invalid("scope.name", "scope name cannot be empty"));
        }

        let mut input_names = HashSet::new();
        for p in &inputs {
            if !input_names.insert(p.name.as_str()) {
                return Err(ScopeFormatError::DuplicateName {
                    section: "inputs".to_string(),
                    name: p.name.clone(),
                });
            }
            p.validate()?;
        }

        let mut output_names = HashSet::new();
        for m in &outputs {
            if !output_names.insert(m.name.as_str()) {
                return Err(ScopeFormatError::DuplicateName {
                    section: "outputs".to_string(),
                    name: m.name.clone(),
                });
            }
            if input_names.contains(m.name.as_str()) {
                return Err(ScopeFormatError::DuplicateName {
                    section: "inputs and outputs".to_string(),
                    name: m.name.clone(),
                });
            }
            m.validate()?;
        }

        for p in &inputs {
            for partner in p.corr.iter().flatten() {
                if !input_names.contains(partner.as_str()) {
                    return Err(ScopeFormatError::invalid(
                        format!("inputs.{}.corr", p.name),
                        format!("`{partner}` is not an input of this scope"),
                    ));
                }
            }
        }

        Ok(Self {
            name,
            desc: desc.into(),
            random_seed: DEFAULT_RANDOM_SEED,
            inputs,
            outputs,
        })
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Parse and validate a scope document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ScopeFormatError> {
        crate::parse::parse_scope(text)
    }

    /// Read, parse and validate a scope file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ScopeError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ScopeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let scope = Self::from_yaml_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            scope = %scope.name,
            inputs = scope.inputs.len(),
            outputs = scope.outputs.len(),
            "loaded scope file"
        );
        Ok(scope)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn random_seed(&self) -> u64 {
        self.random_seed
    }

    /// All inputs in document order.
    pub fn inputs(&self) -> &[Parameter] {
        &self.inputs
    }

    fn of_kind(&self, kind: ParameterKind) -> impl Iterator<Item = &Parameter> {
        self.inputs.iter().filter(move |p| p.kind == kind)
    }

    pub fn uncertainties(&self) -> Vec<&Parameter> {
        self.of_kind(ParameterKind::Uncertainty).collect()
    }

    pub fn levers(&self) -> Vec<&Parameter> {
        self.of_kind(ParameterKind::Lever).collect()
    }

    pub fn constants(&self) -> Vec<&Parameter> {
        self.of_kind(ParameterKind::Constant).collect()
    }

    /// Constants, then uncertainties, then levers.
    pub fn parameters(&self) -> Vec<&Parameter> {
        self.of_kind(ParameterKind::Constant)
            .chain(self.of_kind(ParameterKind::Uncertainty))
            .chain(self.of_kind(ParameterKind::Lever))
            .collect()
    }

    pub fn measures(&self) -> &[Measure] {
        &self.outputs
    }

    pub fn uncertainty_names(&self) -> Vec<&str> {
        names(self.uncertainties())
    }

    pub fn lever_names(&self) -> Vec<&str> {
        names(self.levers())
    }

    pub fn constant_names(&self) -> Vec<&str> {
        names(self.constants())
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        names(self.parameters())
    }

    pub fn measure_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|m| m.name.as_str()).collect()
    }

    /// Parameter names followed by measure names.
    pub fn all_names(&self) -> Vec<&str> {
        let mut out = self.parameter_names();
        out.extend(self.measure_names());
        out
    }

    pub fn n_factors(&self) -> usize {
        self.inputs.len()
    }

    pub fn n_sample_factors(&self) -> usize {
        self.inputs.iter().filter(|p| p.kind.is_sampled()).count()
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn measure(&self, name: &str) -> Option<&Measure> {
        self.outputs.iter().find(|m| m.name == name)
    }

    /// The dtype of a parameter or measure. Measures are always `float`.
    pub fn dtype(&self, name: &str) -> Result<DType, ScopeError> {
        if let Some(p) = self.parameter(name) {
            return Ok(p.dtype());
        }
        if self.measure(name).is_some() {
            return Ok(DType::Float);
        }
        Err(ScopeError::UnknownName(name.to_string()))
    }

    /// Category values of a parameter (`None` for numeric inputs and measures).
    pub fn cat_values(&self, name: &str) -> Result<Option<Vec<ScalarValue>>, ScopeError> {
        if let Some(p) = self.parameter(name) {
            return Ok(p.values());
        }
        if self.measure(name).is_some() {
            return Ok(None);
        }
        Err(ScopeError::UnknownName(name.to_string()))
    }

    /// Coerce a raw value to the declared dtype of `name`.
    pub fn ensure_value(&self, name: &str, raw: &ScalarValue) -> Result<ScalarValue, ScopeError> {
        let dtype = self.dtype(name)?;
        let fail = || ScopeError::Coerce {
            name: name.to_string(),
            value: raw.to_string(),
            dtype,
        };
        match dtype {
            DType::Float => match raw {
                ScalarValue::Float(x) => Ok(ScalarValue::Float(*x)),
                ScalarValue::Int(i) => Ok(ScalarValue::Float(*i as f64)),
                ScalarValue::Bool(b) => Ok(ScalarValue::Float(if *b { 1.0 } else { 0.0 })),
                ScalarValue::Str(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(ScalarValue::Float)
                    .map_err(|_| fail()),
            },
            DType::Int => match raw {
                ScalarValue::Int(i) => Ok(ScalarValue::Int(*i)),
                ScalarValue::Float(x) => ScalarValue::Float(x.trunc())
                    .as_i64()
                    .map(ScalarValue::Int)
                    .ok_or_else(fail),
                ScalarValue::Bool(b) => Ok(ScalarValue::Int(i64::from(*b))),
                ScalarValue::Str(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(ScalarValue::Int)
                    .map_err(|_| fail()),
            },
            DType::Bool => match raw {
                ScalarValue::Bool(b) => Ok(ScalarValue::Bool(*b)),
                ScalarValue::Int(i) => Ok(ScalarValue::Bool(*i != 0)),
                ScalarValue::Float(x) => Ok(ScalarValue::Bool(*x != 0.0)),
                ScalarValue::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Ok(ScalarValue::Bool(true)),
                    "false" => Ok(ScalarValue::Bool(false)),
                    _ => Err(fail()),
                },
            },
            DType::Cat => {
                let values = self.cat_values(name)?.unwrap_or_default();
                if values.contains(raw) {
                    return Ok(raw.clone());
                }
                let text = raw.to_string();
                values
                    .into_iter()
                    .find(|v| v.to_string() == text)
                    .ok_or_else(fail)
            }
        }
    }

    /// A new scope produced by dumping this one with `options` and parsing
    /// the result back.
    pub fn duplicate(&self, options: &DumpOptions) -> Result<Self, ScopeError> {
        let text = dump_scope(self, options)?;
        Ok(Self::from_yaml_str(&text)?)
    }

    /// Multi-line human-readable summary.
    pub fn info(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "name: {}", self.name);
        let _ = writeln!(out, "desc: {}", self.desc);

        let constants = self.constants();
        if !constants.is_empty() {
            out.push_str("constants:\n");
            for p in constants {
                let value = p
                    .default
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                let _ = writeln!(out, "  {} = {}", p.name, value);
            }
        }
        for (label, group) in [("uncertainties", self.uncertainties()), ("levers", self.levers())] {
            if group.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{label}:");
            for p in group {
                let _ = writeln!(out, "  {} = {}", p.name, describe_range(p));
            }
        }
        if !self.outputs.is_empty() {
            out.push_str("measures:\n");
            for m in &self.outputs {
                let _ = writeln!(out, "  {}", m.name);
            }
        }
        out
    }
}

fn names(params: Vec<&Parameter>) -> Vec<&str> {
    params.into_iter().map(|p| p.name.as_str()).collect()
}

fn describe_range(p: &Parameter) -> String {
    match &p.domain {
        Domain::Float {
            min: Some(lo),
            max: Some(hi),
        } => format!("{lo} to {hi}"),
        Domain::Int {
            min: Some(lo),
            max: Some(hi),
        } => format!("{lo} to {hi}"),
        Domain::Bool => "boolean".to_string(),
        Domain::Cat { .. } => "categorical".to_string(),
        Domain::Float { .. } | Domain::Int { .. } => "unbounded".to_string(),
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.desc == other.desc
            && self.uncertainties() == other.uncertainties()
            && self.levers() == other.levers()
            && self.constants() == other.constants()
            && self.outputs == other.outputs
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        for (n, label) in [
            (self.constants().len(), "constants"),
            (self.uncertainties().len(), "uncertainties"),
            (self.levers().len(), "levers"),
            (self.outputs.len(), "measures"),
        ] {
            if n > 0 {
                parts.push(format!("{n} {label}"));
            }
        }
        write!(f, "{}: {}", self.name, parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::MeasureKind;

    const SMALL: &str = r#"
scope:
  name: Small
  desc: two inputs, two outputs
inputs:
  capacity:
    ptype: constant
    dtype: float
    default: 100
  lock:
    ptype: policy lever
    dtype: bool
    default: false
  bond:
    ptype: lever
    dtype: cat
    default: Paygo
    values: [GO Bond, Paygo]
  alpha:
    ptype: uncertainty
    dtype: float
    min: 0.1
    max: 0.2
outputs:
  net_benefits:
    kind: maximize
  travel_time:
    kind: minimize
"#;

    fn small() -> Scope {
        Scope::from_yaml_str(SMALL).expect("parse small scope")
    }

    #[test]
    fn groups_inputs_by_kind() {
        let s = small();
        assert_eq!(s.constant_names(), vec!["capacity"]);
        assert_eq!(s.uncertainty_names(), vec!["alpha"]);
        assert_eq!(s.lever_names(), vec!["lock", "bond"]);
        assert_eq!(s.parameter_names(), vec!["capacity", "alpha", "lock", "bond"]);
        assert_eq!(s.n_factors(), 4);
        assert_eq!(s.n_sample_factors(), 3);
        assert_eq!(
            s.all_names(),
            vec!["capacity", "alpha", "lock", "bond", "net_benefits", "travel_time"]
        );
    }

    #[test]
    fn dtype_and_cat_values_lookup() {
        let s = small();
        assert_eq!(s.dtype("bond").expect("dtype"), DType::Cat);
        assert_eq!(s.dtype("net_benefits").expect("dtype"), DType::Float);
        assert!(matches!(s.dtype("nope"), Err(ScopeError::UnknownName(_))));
        assert_eq!(
            s.cat_values("lock").expect("values"),
            Some(vec![ScalarValue::Bool(false), ScalarValue::Bool(true)])
        );
        assert_eq!(s.cat_values("alpha").expect("values"), None);
    }

    #[test]
    fn ensure_value_coerces_to_declared_dtype() {
        let s = small();
        assert_eq!(
            s.ensure_value("capacity", &ScalarValue::Int(90)).expect("coerce"),
            ScalarValue::Float(90.0)
        );
        assert_eq!(
            s.ensure_value("lock", &ScalarValue::from("True")).expect("coerce"),
            ScalarValue::Bool(true)
        );
        assert_eq!(
            s.ensure_value("bond", &ScalarValue::from("Paygo")).expect("coerce"),
            ScalarValue::from("Paygo")
        );
        assert!(s.ensure_value("bond", &ScalarValue::from("Lease")).is_err());
    }

    #[test]
    fn int_coercion_rejects_floats_outside_i64() {
        let s = Scope::from_yaml_str(
            "scope:\n  name: I\n  desc: int lever\ninputs:\n  period:\n    ptype: lever\n    dtype: int\n    default: 30\n    min: 15\n    max: 50\noutputs:\n  y:\n    kind: info\n",
        )
        .expect("parse");
        assert_eq!(
            s.ensure_value("period", &ScalarValue::Float(20.7)).expect("coerce"),
            ScalarValue::Int(20)
        );
        for raw in [1e300, -1e300, 9.223372036854775807e18, f64::NAN, f64::INFINITY] {
            let err = s
                .ensure_value("period", &ScalarValue::Float(raw))
                .expect_err("out of i64 range");
            assert!(matches!(err, ScopeError::Coerce { .. }), "err={err}");
        }
    }

    #[test]
    fn display_and_info_summaries() {
        let s = small();
        assert_eq!(
            s.to_string(),
            "Small: 1 constants, 1 uncertainties, 2 levers, 2 measures"
        );
        let info = s.info();
        assert!(info.contains("name: Small"));
        assert!(info.contains("  capacity = 100"));
        assert!(info.contains("  alpha = 0.1 to 0.2"));
        assert!(info.contains("  lock = boolean"));
        assert!(info.contains("  bond = categorical"));
        assert!(info.contains("measures:\n  net_benefits\n  travel_time\n"));
    }

    #[test]
    fn output_name_may_not_shadow_an_input() {
        let inputs = small().inputs().to_vec();
        let outputs = vec![Measure::new("alpha").with_kind(MeasureKind::Info)];
        let err = Scope::new("Bad", "", inputs, outputs).expect_err("should fail");
        assert!(matches!(err, ScopeFormatError::DuplicateName { .. }), "err={err}");
    }

    #[test]
    fn duplicate_with_measure_filter() {
        let s = small();
        let options = DumpOptions {
            include_measures: Some(["net_benefits".to_string()].into_iter().collect()),
            ..Default::default()
        };
        let d = s.duplicate(&options).expect("duplicate");
        assert_eq!(d.measure_names(), vec!["net_benefits"]);
        assert_eq!(d.parameter_names(), s.parameter_names());
        assert_ne!(d, s);
    }
}
