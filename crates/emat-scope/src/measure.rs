//! Performance measures (the scope's `outputs`).

use serde::{Deserialize, Serialize};

use crate::error::ScopeFormatError;

/// How downstream optimization should treat a measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    #[default]
    Info,
    Minimize,
    Maximize,
}

impl MeasureKind {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "info" => Some(Self::Info),
            "minimize" | "min" => Some(Self::Minimize),
            "maximize" | "max" => Some(Self::Maximize),
            _ => None,
        }
    }

    /// Numeric encoding: -1 minimize, 0 info, 1 maximize.
    pub fn from_sign(sign: i64) -> Option<Self> {
        match sign {
            -1 => Some(Self::Minimize),
            0 => Some(Self::Info),
            1 => Some(Self::Maximize),
            _ => None,
        }
    }

    pub fn sign(self) -> i8 {
        match self {
            Self::Minimize => -1,
            Self::Info => 0,
            Self::Maximize => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Minimize => "minimize",
            Self::Maximize => "maximize",
        }
    }
}

impl std::fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transform applied to a measure before meta-model estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Explicitly untransformed.
    None,
    Ln,
    Log1p,
}

impl Transform {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "ln" | "log" => Some(Self::Ln),
            "log1p" => Some(Self::Log1p),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Ln => "ln",
            Self::Log1p => "log1p",
        }
    }
}

pub const DEFAULT_METAMODEL_TYPE: &str = "linear";

/// One entry of the scope's `outputs` mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,
    #[serde(default)]
    pub kind: MeasureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metamodel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Measure {
    /// A bare `info` measure.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MeasureKind::Info,
            desc: None,
            transform: None,
            metamodel_type: None,
            min: None,
            max: None,
        }
    }

    pub fn with_kind(mut self, kind: MeasureKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn metamodel_type(&self) -> &str {
        self.metamodel_type
            .as_deref()
            .unwrap_or(DEFAULT_METAMODEL_TYPE)
    }

    pub fn validate(&self) -> Result<(), ScopeFormatError> {
        let path = format!("outputs.{}", self.name);
        if self.name.trim().is_empty() {
            return Err(ScopeFormatError::invalid("outputs", "output name cannot be empty"));
        }
        for (key, bound) in [("min", self.min), ("max", self.max)] {
            if let Some(x) = bound {
                if !x.is_finite() {
                    return Err(ScopeFormatError::invalid(
                        format!("{path}.{key}"),
                        format!("{key} must be finite, got {x}"),
                    ));
                }
            }
        }
        if let (Some(lo), Some(hi)) = (self.min, self.max) {
            if lo > hi {
                return Err(ScopeFormatError::invalid(
                    path,
                    format!("min ({lo}) is greater than max ({hi})"),
                ));
            }
        }
        Ok(())
    }
}
