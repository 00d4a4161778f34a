//! Input parameters: constants, exogenous uncertainties and policy levers.

use serde::{Deserialize, Serialize};

use crate::error::ScopeFormatError;
use crate::value::ScalarValue;

// ============================================================================
// Kinds and dtypes
// ============================================================================

/// The `ptype` of an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Held fixed at its default across all experiments.
    Constant,
    /// Exogenous; sampled during scenario generation.
    Uncertainty,
    /// Controlled by the decision maker; varied during policy search.
    Lever,
}

impl ParameterKind {
    /// Accepts the canonical names and the common aliases, case-insensitively.
    pub fn parse(text: &str) -> Option<Self> {
        let normalized = text.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "constant" | "fixed" => Some(Self::Constant),
            "uncertainty" | "exogenous uncertainty" | "unc" => Some(Self::Uncertainty),
            "policy lever" | "lever" | "policy" => Some(Self::Lever),
            _ => None,
        }
    }

    /// Canonical spelling used in scope files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Uncertainty => "uncertainty",
            Self::Lever => "policy lever",
        }
    }

    /// Whether inputs of this kind are varied during experimentation.
    pub fn is_sampled(self) -> bool {
        !matches!(self, Self::Constant)
    }
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Float,
    Int,
    Bool,
    Cat,
}

impl DType {
    pub fn parse(text: &str) -> Option<Self> {
        let normalized = text.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "float" | "real" => Some(Self::Float),
            "int" | "integer" => Some(Self::Int),
            "bool" | "boolean" => Some(Self::Bool),
            "cat" | "categorical" => Some(Self::Cat),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Cat => "cat",
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Domains and distributions
// ============================================================================

/// The typed value space of an input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", rename_all = "snake_case")]
pub enum Domain {
    Float { min: Option<f64>, max: Option<f64> },
    Int { min: Option<i64>, max: Option<i64> },
    Bool,
    Cat { values: Vec<ScalarValue> },
}

impl Domain {
    pub fn dtype(&self) -> DType {
        match self {
            Self::Float { .. } => DType::Float,
            Self::Int { .. } => DType::Int,
            Self::Bool => DType::Bool,
            Self::Cat { .. } => DType::Cat,
        }
    }

    /// Numeric bounds as `f64`, when both are declared.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            Self::Float {
                min: Some(lo),
                max: Some(hi),
            } => Some((*lo, *hi)),
            Self::Int {
                min: Some(lo),
                max: Some(hi),
            } => Some((*lo as f64, *hi as f64)),
            _ => None,
        }
    }

    fn has_any_bound(&self) -> bool {
        match self {
            Self::Float { min, max } => min.is_some() || max.is_some(),
            Self::Int { min, max } => min.is_some() || max.is_some(),
            Self::Bool | Self::Cat { .. } => false,
        }
    }
}

/// Location of the mode of a peaked distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Peak {
    /// In the units of the input.
    Absolute(f64),
    /// As a fraction of the way from `min` to `max`.
    Relative(f64),
}

impl Peak {
    pub fn resolve(self, min: f64, max: f64) -> f64 {
        match self {
            Self::Absolute(x) => x,
            Self::Relative(r) => min + r * (max - min),
        }
    }
}

pub const DEFAULT_PERT_GAMMA: f64 = 4.0;

/// Sampling distribution of an input (`dist`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Distribution {
    Constant,
    Uniform,
    Triangle { peak: Peak },
    Pert { peak: Peak, gamma: f64 },
}

impl Distribution {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Uniform => "uniform",
            Self::Triangle { .. } => "triangle",
            Self::Pert { .. } => "pert",
        }
    }

    pub fn peak(&self) -> Option<Peak> {
        match self {
            Self::Triangle { peak } | Self::Pert { peak, .. } => Some(*peak),
            Self::Constant | Self::Uniform => None,
        }
    }
}

// ============================================================================
// Parameter
// ============================================================================

/// One entry of the scope's `inputs` mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub domain: Domain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<Distribution>,
    /// Names of correlated inputs, as written in the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corr: Option<Vec<String>>,
}

impl Parameter {
    pub fn dtype(&self) -> DType {
        self.domain.dtype()
    }

    /// Category values; bool inputs report `[false, true]`.
    pub fn values(&self) -> Option<Vec<ScalarValue>> {
        match &self.domain {
            Domain::Cat { values } => Some(values.clone()),
            Domain::Bool => Some(vec![ScalarValue::Bool(false), ScalarValue::Bool(true)]),
            Domain::Float { .. } | Domain::Int { .. } => None,
        }
    }

    /// The declared sampling distribution; sampled inputs default to uniform.
    pub fn distribution(&self) -> Option<&Distribution> {
        match (&self.dist, self.kind.is_sampled()) {
            (Some(d), _) => Some(d),
            (None, true) => Some(&Distribution::Uniform),
            (None, false) => None,
        }
    }

    /// The declared default, or a value derived from the domain when absent.
    pub fn effective_default(&self) -> Option<ScalarValue> {
        if let Some(default) = &self.default {
            return Some(default.clone());
        }
        match &self.domain {
            Domain::Float {
                min: Some(lo),
                max: Some(hi),
            } => Some(ScalarValue::Float(lo / 2.0 + hi / 2.0)),
            Domain::Int {
                min: Some(lo),
                max: Some(hi),
            } => {
                let mid = (i128::from(*lo) + i128::from(*hi)).div_euclid(2);
                i64::try_from(mid).ok().map(ScalarValue::Int)
            }
            Domain::Bool => Some(ScalarValue::Bool(false)),
            Domain::Cat { values } => values.first().cloned(),
            Domain::Float { .. } | Domain::Int { .. } => None,
        }
    }

    /// Check the record's internal consistency.
    ///
    /// Cross-record constraints (name uniqueness, `corr` partners) are
    /// checked by `Scope::new`.
    pub fn validate(&self) -> Result<(), ScopeFormatError> {
        let path = format!("inputs.{}", self.name);

        if self.name.trim().is_empty() {
            return Err(ScopeFormatError::invalid("inputs", "input name cannot be empty"));
        }

        if self.kind == ParameterKind::Constant && self.default.is_none() {
            return Err(ScopeFormatError::missing(&path, "default"));
        }

        match &self.domain {
            Domain::Float { min, max } => {
                for (key, bound) in [("min", min), ("max", max)] {
                    if let Some(x) = bound {
                        if !x.is_finite() {
                            return Err(ScopeFormatError::invalid(
                                format!("{path}.{key}"),
                                "bound must be finite",
                            ));
                        }
                    }
                }
                self.check_bounds_present(&path, min.is_some(), max.is_some())?;
                if let (Some(lo), Some(hi)) = (min, max) {
                    check_ordered(&path, *lo, *hi)?;
                }
                if let Some(default) = &self.default {
                    let x = default.as_f64().ok_or_else(|| {
                        ScopeFormatError::wrong_type(format!("{path}.default"), "a number")
                    })?;
                    if !x.is_finite() {
                        return Err(ScopeFormatError::invalid(
                            format!("{path}.default"),
                            "default must be finite",
                        ));
                    }
                    check_in_range(&path, x, min.as_ref().copied(), max.as_ref().copied())?;
                }
            }
            Domain::Int { min, max } => {
                self.check_bounds_present(&path, min.is_some(), max.is_some())?;
                if let (Some(lo), Some(hi)) = (min, max) {
                    check_ordered(&path, *lo, *hi)?;
                }
                if let Some(default) = &self.default {
                    let x = default.as_i64().ok_or_else(|| {
                        ScopeFormatError::wrong_type(format!("{path}.default"), "an integer")
                    })?;
                    check_in_range(&path, x, *min, *max)?;
                }
            }
            Domain::Bool => {
                if let Some(default) = &self.default {
                    if default.as_bool().is_none() {
                        return Err(ScopeFormatError::wrong_type(
                            format!("{path}.default"),
                            "a boolean",
                        ));
                    }
                }
            }
            Domain::Cat { values } => {
                if values.is_empty() && self.kind.is_sampled() {
                    return Err(ScopeFormatError::invalid(
                        format!("{path}.values"),
                        "categorical inputs must list at least one value",
                    ));
                }
                for (i, value) in values.iter().enumerate() {
                    if values[..i].contains(value) {
                        return Err(ScopeFormatError::DuplicateName {
                            section: format!("{path}.values"),
                            name: value.to_string(),
                        });
                    }
                }
                if let Some(default) = &self.default {
                    if !values.is_empty() && !values.contains(default) {
                        return Err(ScopeFormatError::invalid(
                            format!("{path}.default"),
                            format!("default `{default}` is not one of the listed values"),
                        ));
                    }
                }
            }
        }

        if let Some(dist) = &self.dist {
            self.validate_distribution(&path, dist)?;
        }

        if let Some(partners) = &self.corr {
            if partners.iter().any(|p| p == &self.name) {
                return Err(ScopeFormatError::invalid(
                    format!("{path}.corr"),
                    "an input cannot be correlated with itself",
                ));
            }
        }

        Ok(())
    }

    fn check_bounds_present(
        &self,
        path: &str,
        has_min: bool,
        has_max: bool,
    ) -> Result<(), ScopeFormatError> {
        if !self.kind.is_sampled() {
            return Ok(());
        }
        if !has_min {
            return Err(ScopeFormatError::missing(path, "min"));
        }
        if !has_max {
            return Err(ScopeFormatError::missing(path, "max"));
        }
        Ok(())
    }

    fn validate_distribution(&self, path: &str, dist: &Distribution) -> Result<(), ScopeFormatError> {
        let dist_path = format!("{path}.dist");
        let Some(peak) = dist.peak() else {
            return Ok(());
        };
        let Some((lo, hi)) = self.domain.bounds() else {
            return Err(ScopeFormatError::invalid(
                dist_path,
                format!("`{}` requires numeric min and max", dist.name()),
            ));
        };
        match peak {
            Peak::Relative(r) => {
                if !(0.0..=1.0).contains(&r) {
                    return Err(ScopeFormatError::OutOfRange {
                        path: format!("{dist_path}.rel_peak"),
                        value: r.to_string(),
                        min: "0".to_string(),
                        max: "1".to_string(),
                    });
                }
            }
            Peak::Absolute(x) => {
                if !(lo..=hi).contains(&x) {
                    return Err(ScopeFormatError::OutOfRange {
                        path: format!("{dist_path}.peak"),
                        value: x.to_string(),
                        min: lo.to_string(),
                        max: hi.to_string(),
                    });
                }
            }
        }
        if let Distribution::Pert { gamma, .. } = dist {
            if !gamma.is_finite() || *gamma <= 0.0 {
                return Err(ScopeFormatError::invalid(
                    format!("{dist_path}.gamma"),
                    "gamma must be a positive number",
                ));
            }
        }
        Ok(())
    }

    /// Whether the domain carries numeric bounds at all.
    pub fn is_bounded(&self) -> bool {
        self.domain.has_any_bound()
    }
}

fn check_ordered<T: PartialOrd + std::fmt::Display>(
    path: &str,
    lo: T,
    hi: T,
) -> Result<(), ScopeFormatError> {
    if lo > hi {
        return Err(ScopeFormatError::invalid(
            path,
            format!("min ({lo}) is greater than max ({hi})"),
        ));
    }
    Ok(())
}

fn check_in_range<T: PartialOrd + std::fmt::Display + Copy>(
    path: &str,
    value: T,
    min: Option<T>,
    max: Option<T>,
) -> Result<(), ScopeFormatError> {
    let below = min.map(|lo| value < lo).unwrap_or(false);
    let above = max.map(|hi| value > hi).unwrap_or(false);
    if below || above {
        let show = |b: Option<T>| b.map(|x| x.to_string()).unwrap_or_else(|| "..".to_string());
        return Err(ScopeFormatError::OutOfRange {
            path: format!("{path}.default"),
            value: value.to_string(),
            min: show(min),
            max: show(max),
        });
    }
    Ok(())
}
