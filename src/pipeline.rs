use std::str::FromStr;

use tracing::info;

use crate::blob_set::BlobSet;
use crate::error::Result;
use crate::features::ParamValue;

/// One feature filter: keep blobs whose `feature` lies in `[lower, upper]`
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStep {
    pub feature: String,
    pub lower: f64,
    pub upper: f64,
    pub params: Vec<ParamValue>,
}

impl FilterStep {
    pub fn new(feature: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            feature: feature.into(),
            lower,
            upper,
            params: Vec::new(),
        }
    }

    /// Filter without an upper bound
    pub fn at_least(feature: impl Into<String>, lower: f64) -> Self {
        Self::new(feature, lower, f64::INFINITY)
    }

    pub fn with_param(mut self, param: impl Into<ParamValue>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn apply(&self, blobs: &BlobSet) -> Result<BlobSet> {
        blobs.filter(self.lower, self.upper, &self.feature, &self.params)
    }
}

/// Parses `NAME:LOWER[:UPPER][:PARAM...]`; integer parameters only
impl FromStr for FilterStep {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let feature = parts
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| format!("missing feature name in '{s}'"))?;
        let lower = parts
            .next()
            .ok_or_else(|| format!("missing lower bound in '{s}'"))?
            .parse::<f64>()
            .map_err(|e| format!("invalid lower bound in '{s}': {e}"))?;
        let upper = match parts.next() {
            None | Some("") => f64::INFINITY,
            Some(upper) => upper
                .parse::<f64>()
                .map_err(|e| format!("invalid upper bound in '{s}': {e}"))?,
        };

        let mut step = FilterStep::new(feature, lower, upper);
        for param in parts {
            let value = param
                .parse::<i64>()
                .map_err(|e| format!("invalid parameter '{param}' in '{s}': {e}"))?;
            step = step.with_param(value);
        }
        Ok(step)
    }
}

/// Ordered chain of filters applied to a traced blob set
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    steps: Vec<FilterStep>,
    verbose: bool,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log the surviving blobs after every step
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn add_step(mut self, step: FilterStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[FilterStep] {
        &self.steps
    }

    /// Run every step in order; no steps returns the set unchanged
    pub fn run(&self, blobs: &BlobSet) -> Result<BlobSet> {
        let mut current = blobs.clone();
        for (index, step) in self.steps.iter().enumerate() {
            let before = current.len();
            current = step.apply(&current)?;
            info!(
                step = index + 1,
                feature = %step.feature,
                before,
                after = current.len(),
                "filter step"
            );
            if self.verbose {
                let labels: Vec<i32> = current.iter().map(|b| b.label()).collect();
                info!(?labels, "kept blobs");
            }
        }
        Ok(current)
    }
}
