// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Synapse count distributions and compartment sampling.

A distribution is written either as a bare number (a constant) or as a
table tagged by `distribution`:

```toml
synapses = 2
synapses = { distribution = "normal", mean = 3.0, std_dev = 1.0 }
synapses = { distribution = "uniform", low = 1.0, high = 4.0 }
synapses = { distribution = "poisson", lambda = 2.5 }
```
*/

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::{Normal, Poisson};
use serde::Deserialize;

use crate::types::{ConnectivityError, ConnectivityResult};

/// Distribution of the number of synapses per touching cell pair
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "DistributionConfig")]
pub enum SynapseDistribution {
    Constant(f64),
    Uniform { low: f64, high: f64 },
    Normal { mean: f64, std_dev: f64 },
    Poisson { lambda: f64 },
}

impl Default for SynapseDistribution {
    fn default() -> Self {
        Self::Constant(1.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DistributionConfig {
    Value(f64),
    Tagged(TaggedDistribution),
}

#[derive(Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case", deny_unknown_fields)]
enum TaggedDistribution {
    Constant { value: f64 },
    Uniform { low: f64, high: f64 },
    Normal { mean: f64, std_dev: f64 },
    Poisson { lambda: f64 },
}

impl TryFrom<DistributionConfig> for SynapseDistribution {
    type Error = ConnectivityError;

    fn try_from(config: DistributionConfig) -> Result<Self, Self::Error> {
        let distribution = match config {
            DistributionConfig::Value(value) => Self::Constant(value),
            DistributionConfig::Tagged(TaggedDistribution::Constant { value }) => Self::Constant(value),
            DistributionConfig::Tagged(TaggedDistribution::Uniform { low, high }) => Self::Uniform { low, high },
            DistributionConfig::Tagged(TaggedDistribution::Normal { mean, std_dev }) => Self::Normal { mean, std_dev },
            DistributionConfig::Tagged(TaggedDistribution::Poisson { lambda }) => Self::Poisson { lambda },
        };
        distribution.validate()?;
        Ok(distribution)
    }
}

impl SynapseDistribution {
    pub fn validate(&self) -> ConnectivityResult<()> {
        let invalid = |msg: String| Err(ConnectivityError::InvalidDistribution(msg));
        match *self {
            Self::Constant(value) if !value.is_finite() => invalid(format!("constant {} is not finite", value)),
            Self::Uniform { low, high } if !(low.is_finite() && high.is_finite() && low <= high) => {
                invalid(format!("uniform bounds [{}, {}] are not an interval", low, high))
            }
            Self::Normal { mean, std_dev } if !(mean.is_finite() && std_dev.is_finite() && std_dev >= 0.0) => {
                invalid(format!("normal(mean={}, std_dev={}) is not valid", mean, std_dev))
            }
            Self::Poisson { lambda } if !(lambda.is_finite() && lambda > 0.0) => {
                invalid(format!("poisson lambda {} must be positive", lambda))
            }
            _ => Ok(()),
        }
    }
}

enum Sampler {
    Constant(f64),
    Uniform(Uniform<f64>),
    Normal(Normal<f64>),
    Poisson(Poisson<f64>),
}

impl Sampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Constant(value) => *value,
            Self::Uniform(d) => d.sample(rng),
            Self::Normal(d) => d.sample(rng),
            Self::Poisson(d) => d.sample(rng),
        }
    }
}

/// Draws synapse counts and picks which touching compartment pairs to use
pub struct SynapseSampler {
    sampler: Sampler,
    allow_zero: bool,
}

impl SynapseSampler {
    pub fn new(distribution: &SynapseDistribution, allow_zero: bool) -> ConnectivityResult<Self> {
        distribution.validate()?;
        let sampler = match *distribution {
            SynapseDistribution::Constant(value) => Sampler::Constant(value),
            SynapseDistribution::Uniform { low, high } => Sampler::Uniform(Uniform::new_inclusive(low, high)),
            SynapseDistribution::Normal { mean, std_dev } => Sampler::Normal(
                Normal::new(mean, std_dev).map_err(|e| ConnectivityError::InvalidDistribution(e.to_string()))?,
            ),
            SynapseDistribution::Poisson { lambda } => Sampler::Poisson(
                Poisson::new(lambda).map_err(|e| ConnectivityError::InvalidDistribution(e.to_string()))?,
            ),
        };
        Ok(Self { sampler, allow_zero })
    }

    /// Smallest count for a pair with a non-empty pool
    pub fn lower_bound(&self) -> usize {
        if self.allow_zero {
            0
        } else {
            1
        }
    }

    /// Number of synapses for a pool of `pool` touching compartment pairs
    pub fn count<R: Rng + ?Sized>(&self, rng: &mut R, pool: usize) -> usize {
        if pool == 0 {
            return 0;
        }
        let sample = self.sampler.sample(rng).round();
        let drawn = if sample.is_finite() && sample > 0.0 {
            sample as usize
        } else {
            0
        };
        drawn.min(pool).max(self.lower_bound())
    }

    /// Distinct pairs drawn uniformly without replacement from `pool`
    pub fn select<R: Rng + ?Sized, T: Copy>(&self, rng: &mut R, pool: &[T]) -> Vec<T> {
        let n = self.count(rng, pool.len());
        rand::seq::index::sample(rng, pool.len(), n)
            .into_iter()
            .map(|i| pool[i])
            .collect()
    }
}
