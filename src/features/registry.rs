use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::{BuiltinFeature, Feature, ParamValue, Signature};
use crate::blob::Blob;
use crate::error::{BlobError, Result};

/// Name-keyed collection of custom features, shared between blob sets.
///
/// Built-in names always resolve to [`BuiltinFeature`] and cannot be
/// registered again.
#[derive(Default)]
pub struct FeatureRegistry {
    custom: RwLock<HashMap<String, Arc<dyn Feature>>>,
}

impl fmt::Debug for FeatureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureRegistry")
            .field("custom", &self.names())
            .finish()
    }
}

/// A feature found by name
#[derive(Clone)]
pub enum ResolvedFeature {
    Builtin(BuiltinFeature),
    Custom(Arc<dyn Feature>),
}

impl fmt::Debug for ResolvedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedFeature::Builtin(b) => f.debug_tuple("Builtin").field(b).finish(),
            ResolvedFeature::Custom(c) => f.debug_tuple("Custom").field(&c.name()).finish(),
        }
    }
}

impl ResolvedFeature {
    pub fn name(&self) -> &str {
        match self {
            ResolvedFeature::Builtin(b) => b.name(),
            ResolvedFeature::Custom(c) => c.name(),
        }
    }

    pub fn signature(&self) -> Signature {
        match self {
            ResolvedFeature::Builtin(b) => b.signature(),
            ResolvedFeature::Custom(c) => c.signature(),
        }
    }

    /// Evaluate after checking the parameters against the signature
    pub fn evaluate(&self, blob: &Blob, params: &[ParamValue]) -> Result<f64> {
        match self {
            ResolvedFeature::Builtin(b) => b.evaluate(blob, params),
            ResolvedFeature::Custom(c) => {
                c.signature().check(c.name(), params)?;
                c.evaluate(blob, params)
                    .map_err(|e| BlobError::FeatureFailed {
                        feature: c.name().to_string(),
                        message: format!("{e:#}"),
                    })
            }
        }
    }
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom feature; duplicate and built-in names are rejected
    pub fn register(&self, feature: Arc<dyn Feature>) -> Result<()> {
        let name = feature.name().to_string();
        if BuiltinFeature::from_name(&name).is_some() {
            return Err(BlobError::DuplicateFeature(name));
        }
        let mut custom = self.custom.write().unwrap_or_else(PoisonError::into_inner);
        if custom.contains_key(&name) {
            return Err(BlobError::DuplicateFeature(name));
        }
        debug!(feature = %name, "registered custom feature");
        custom.insert(name, feature);
        Ok(())
    }

    /// Helper to register a boxed feature
    pub fn register_boxed(&self, feature: Box<dyn Feature>) -> Result<()> {
        self.register(Arc::from(feature))
    }

    pub fn contains(&self, name: &str) -> bool {
        BuiltinFeature::from_name(name).is_some()
            || self
                .custom
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(name)
    }

    /// Names of the registered custom features, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .custom
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Look a name up, built-in features first
    pub fn resolve(&self, name: &str) -> Result<ResolvedFeature> {
        if let Some(builtin) = BuiltinFeature::from_name(name) {
            return Ok(ResolvedFeature::Builtin(builtin));
        }
        self.custom
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .map(ResolvedFeature::Custom)
            .ok_or_else(|| BlobError::UnknownFeature(name.to_string()))
    }

    pub fn evaluate(&self, blob: &Blob, name: &str, params: &[ParamValue]) -> Result<f64> {
        self.resolve(name)?.evaluate(blob, params)
    }
}
