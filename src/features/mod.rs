pub mod builtin;
pub mod registry;

use std::fmt;

use crate::blob::Blob;
use crate::error::{BlobError, Result};

pub use builtin::BuiltinFeature;
pub use registry::{FeatureRegistry, ResolvedFeature};

/// A scalar shape descriptor that can be looked up by name when filtering.
///
/// Custom features are registered with a [`FeatureRegistry`]; built-in ones
/// live in [`BuiltinFeature`].
pub trait Feature: Send + Sync {
    /// Name used to look the feature up
    fn name(&self) -> &str;

    /// Parameters expected by `evaluate`, checked before every call
    fn signature(&self) -> Signature {
        Signature::empty()
    }

    /// Compute the feature for one blob
    fn evaluate(&self, blob: &Blob, params: &[ParamValue]) -> anyhow::Result<f64>;
}

/// Parameter value passed to a feature
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Float(f64),
    String(String),
    Int(i64),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::String(_) => ParamKind::String,
            ParamValue::Int(_) => ParamKind::Int,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Float,
    String,
    Int,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::Bool => "bool",
            ParamKind::Float => "float",
            ParamKind::String => "string",
            ParamKind::Int => "int",
        };
        f.write_str(name)
    }
}

/// Declared parameter list of a feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    /// Exactly these kinds, in order
    Fixed(Vec<ParamKind>),
    /// Any number of values of one kind
    Repeated(ParamKind),
}

impl Signature {
    pub fn empty() -> Self {
        Signature::Fixed(Vec::new())
    }

    pub fn fixed(kinds: &[ParamKind]) -> Self {
        Signature::Fixed(kinds.to_vec())
    }

    pub fn repeated(kind: ParamKind) -> Self {
        Signature::Repeated(kind)
    }

    pub fn accepts(&self, params: &[ParamValue]) -> bool {
        match self {
            Signature::Fixed(kinds) => {
                kinds.len() == params.len() && kinds.iter().zip(params).all(|(k, p)| *k == p.kind())
            }
            Signature::Repeated(kind) => params.iter().all(|p| p.kind() == *kind),
        }
    }

    /// Reject parameters that do not match, naming the feature in the error
    pub fn check(&self, feature: &str, params: &[ParamValue]) -> Result<()> {
        if self.accepts(params) {
            return Ok(());
        }
        let found: Vec<String> = params.iter().map(|p| p.kind().to_string()).collect();
        Err(BlobError::ArgumentMismatch {
            feature: feature.to_string(),
            expected: self.to_string(),
            found: format!("({})", found.join(", ")),
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Fixed(kinds) => {
                let names: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
                write!(f, "({})", names.join(", "))
            }
            Signature::Repeated(kind) => write!(f, "({kind}...)"),
        }
    }
}
