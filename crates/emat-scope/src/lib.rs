//! EMAT scope definitions
//!
//! A *scope* is the declarative catalog of a model's inputs (constants,
//! exogenous uncertainties, policy levers) and outputs (performance
//! measures) used to configure exploratory-modeling experiments.
//!
//! This crate provides:
//! - a typed model of the scope (`Scope`, `Parameter`, `Measure`),
//! - a YAML loader that validates the document structurally
//!   (`parse::parse_scope`, `Scope::from_yaml_file`),
//! - a canonical YAML dump that preserves variable ordering (`dump`),
//! - a stable content digest for identifying scopes (`digest`).
//!
//! Loading a scope never mutates it afterwards: a `Scope` is immutable
//! configuration. Derived scopes (e.g. with measure transforms stripped) are
//! produced with `Scope::duplicate`.

pub mod digest;
pub mod dump;
pub mod error;
pub mod measure;
pub mod parameter;
pub mod parse;
pub mod scope;
pub mod value;

pub use dump::{dump_scope, dump_scope_to_file, DumpOptions};
pub use error::{ScopeError, ScopeFormatError};
pub use measure::{Measure, MeasureKind, Transform};
pub use parameter::{DType, Distribution, Domain, Parameter, ParameterKind, Peak};
pub use parse::parse_scope;
pub use scope::{Scope, DEFAULT_RANDOM_SEED};
pub use value::ScalarValue;
