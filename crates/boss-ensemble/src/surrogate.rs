//! Surrogate models for parameter selection
//!
//! A [`Regressor`] maps parameter vectors to a predicted quantity (accuracy,
//! build time or model size). Random strategies use it to pick the most
//! promising untried candidate and to drop candidates that are predicted to
//! blow the remaining budget.
//!
//! All regressors standardize features first; window sizes run into the
//! hundreds while the normalize flag is 0 or 1.

use boss_core::{Error, Result};
use boss_sfa::SfaParams;
use nalgebra::{DMatrix, DVector};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::config::RegressorKind;
use crate::params::ParameterPool;

/// Minimal regression contract
pub trait Regressor: Send {
    /// Fit on rows of `features` against `targets`
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<()>;

    /// Predict a single row
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// Predict many rows
    fn predict_many(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|r| self.predict(r)).collect()
    }
}

/// Build the regressor selected in the configuration
pub fn regressor_for(kind: RegressorKind) -> Box<dyn Regressor> {
    match kind {
        RegressorKind::GaussianProcess => Box::new(GaussianProcess::default()),
        RegressorKind::NearestNeighbour { k } => Box::new(NearestNeighbourRegressor::new(k)),
        RegressorKind::Linear { ridge } => Box::new(LinearRegressor::new(ridge)),
    }
}

fn check_training_set(features: &[Vec<f64>], targets: &[f64]) -> Result<usize> {
    if features.is_empty() {
        return Err(Error::empty_input("surrogate fit"));
    }
    if features.len() != targets.len() {
        return Err(Error::size_mismatch(features.len(), targets.len(), "surrogate targets"));
    }
    let dim = features[0].len();
    if let Some(row) = features.iter().find(|r| r.len() != dim) {
        return Err(Error::size_mismatch(dim, row.len(), "surrogate feature row"));
    }
    Ok(dim)
}

/// Per-column z-scoring; constant columns keep unit scale
#[derive(Debug, Clone, Default)]
struct Scaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl Scaler {
    fn fit(rows: &[Vec<f64>], dim: usize) -> Self {
        let n = rows.len() as f64;
        let mut means = vec![0.0; dim];
        let mut stds = vec![0.0; dim];
        for row in rows {
            for (m, &x) in means.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        for row in rows {
            for ((s, &m), &x) in stds.iter_mut().zip(&means).zip(row) {
                *s += (x - m) * (x - m) / n;
            }
        }
        for s in &mut stds {
            *s = if *s > 0.0 { s.sqrt() } else { 1.0 };
        }
        Self { means, stds }
    }

    fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.means.len() {
            return Err(Error::size_mismatch(self.means.len(), row.len(), "surrogate query"));
        }
        Ok(row
            .iter()
            .zip(&self.means)
            .zip(&self.stds)
            .map(|((&x, &m), &s)| (x - m) / s)
            .collect())
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn not_fitted() -> Error {
    Error::InvalidInput("surrogate used before fit".to_string())
}

/// Gaussian process regression with an RBF kernel
#[derive(Debug, Clone)]
pub struct GaussianProcess {
    pub length_scale: f64,
    pub signal_variance: f64,
    pub noise_variance: f64,
    scaler: Scaler,
    train: Vec<Vec<f64>>,
    alpha: Vec<f64>,
    target_mean: f64,
}

impl Default for GaussianProcess {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1e-2)
    }
}

impl GaussianProcess {
    pub fn new(length_scale: f64, signal_variance: f64, noise_variance: f64) -> Self {
        Self {
            length_scale,
            signal_variance,
            noise_variance,
            scaler: Scaler::default(),
            train: Vec::new(),
            alpha: Vec::new(),
            target_mean: 0.0,
        }
    }

    fn kernel(&self, a: &[f64], b: &[f64]) -> f64 {
        let z = squared_distance(a, b) / (self.length_scale * self.length_scale);
        self.signal_variance * (-0.5 * z).exp()
    }
}

impl Regressor for GaussianProcess {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        let dim = check_training_set(features, targets)?;
        if !(self.length_scale > 0.0 && self.noise_variance > 0.0) {
            return Err(Error::InvalidParameter(
                "GP length scale and noise variance must be positive".to_string(),
            ));
        }
        let scaler = Scaler::fit(features, dim);
        let train = features
            .iter()
            .map(|r| scaler.transform(r))
            .collect::<Result<Vec<_>>>()?;
        let n = train.len();

        let target_mean = targets.iter().sum::<f64>() / n as f64;
        let y = DVector::from_iterator(n, targets.iter().map(|t| t - target_mean));
        let mut k = DMatrix::from_fn(n, n, |i, j| self.kernel(&train[i], &train[j]));
        for i in 0..n {
            k[(i, i)] += self.noise_variance;
        }

        let chol = k
            .cholesky()
            .ok_or_else(|| Error::Computation("GP covariance is not positive definite".to_string()))?;
        let alpha = chol.solve(&y);

        self.scaler = scaler;
        self.train = train;
        self.alpha = alpha.iter().copied().collect();
        self.target_mean = target_mean;
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        if self.train.is_empty() {
            return Err(not_fitted());
        }
        let x = self.scaler.transform(features)?;
        let mean: f64 = self
            .train
            .iter()
            .zip(&self.alpha)
            .map(|(t, a)| self.kernel(&x, t) * a)
            .sum();
        Ok(self.target_mean + mean)
    }
}

/// Mean target of the `k` closest training rows
#[derive(Debug, Clone)]
pub struct NearestNeighbourRegressor {
    k: usize,
    scaler: Scaler,
    train: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

impl NearestNeighbourRegressor {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            scaler: Scaler::default(),
            train: Vec::new(),
            targets: Vec::new(),
        }
    }
}

impl Regressor for NearestNeighbourRegressor {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        let dim = check_training_set(features, targets)?;
        self.scaler = Scaler::fit(features, dim);
        self.train = features
            .iter()
            .map(|r| self.scaler.transform(r))
            .collect::<Result<Vec<_>>>()?;
        self.targets = targets.to_vec();
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        if self.train.is_empty() {
            return Err(not_fitted());
        }
        let x = self.scaler.transform(features)?;
        let mut order: Vec<(OrderedFloat<f64>, usize)> = self
            .train
            .iter()
            .enumerate()
            .map(|(i, t)| (OrderedFloat(squared_distance(&x, t)), i))
            .collect();
        order.sort_unstable();
        let k = self.k.min(order.len());
        Ok(order[..k].iter().map(|&(_, i)| self.targets[i]).sum::<f64>() / k as f64)
    }
}

/// Ridge-regularized least squares with an unpenalized intercept
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    ridge: f64,
    scaler: Scaler,
    coefficients: Vec<f64>,
}

impl LinearRegressor {
    pub fn new(ridge: f64) -> Self {
        Self {
            ridge: ridge.max(0.0),
            scaler: Scaler::default(),
            coefficients: Vec::new(),
        }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl Regressor for LinearRegressor {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        let dim = check_training_set(features, targets)?;
        let scaler = Scaler::fit(features, dim);
        let n = features.len();
        let p = dim + 1;

        let mut design = DMatrix::zeros(n, p);
        for (i, row) in features.iter().enumerate() {
            design[(i, 0)] = 1.0;
            for (j, x) in scaler.transform(row)?.into_iter().enumerate() {
                design[(i, j + 1)] = x;
            }
        }
        let y = DVector::from_column_slice(targets);

        let mut xtx = design.transpose() * &design;
        // a tiny floor keeps the system solvable when columns are collinear
        let penalty = self.ridge.max(1e-8);
        for j in 1..p {
            xtx[(j, j)] += penalty;
        }
        xtx[(0, 0)] += 1e-12;
        let xty = design.transpose() * y;

        let chol = xtx
            .cholesky()
            .ok_or_else(|| Error::Computation("ridge system is not positive definite".to_string()))?;
        self.coefficients = chol.solve(&xty).iter().copied().collect();
        self.scaler = scaler;
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        if self.coefficients.is_empty() {
            return Err(not_fitted());
        }
        let x = self.scaler.transform(features)?;
        Ok(self.coefficients[0]
            + x.iter()
                .zip(&self.coefficients[1..])
                .map(|(a, b)| a * b)
                .sum::<f64>())
    }
}

/// What a channel has tried so far and how it went
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub tried: Vec<SfaParams>,
    pub accuracy: Vec<f64>,
    pub build_nanos: Vec<f64>,
    pub footprint: Vec<f64>,
    /// Random draws made before the surrogate took over
    pub warmup_draws: usize,
}

impl History {
    pub fn features(&self) -> Vec<Vec<f64>> {
        self.tried.iter().map(|p| p.features().to_vec()).collect()
    }
}

/// Index of the pool candidate with the highest prediction; first wins ties
pub fn best_candidate(
    regressor: &mut dyn Regressor,
    history: &[Vec<f64>],
    targets: &[f64],
    pool: &ParameterPool,
) -> Result<Option<usize>> {
    if pool.is_empty() {
        return Ok(None);
    }
    regressor.fit(history, targets)?;
    let rows: Vec<Vec<f64>> = pool.candidates().iter().map(|p| p.features().to_vec()).collect();
    let predictions = regressor.predict_many(&rows)?;

    let mut best: Option<(usize, f64)> = None;
    for (i, &p) in predictions.iter().enumerate() {
        if best.map_or(true, |(_, b)| p > b) {
            best = Some((i, p));
        }
    }
    Ok(best.map(|(i, _)| i))
}

/// Drop pool candidates whose predicted cost exceeds `remaining`
///
/// Returns how many candidates were removed.
pub fn prune_over_budget(
    regressor: &mut dyn Regressor,
    history: &[Vec<f64>],
    costs: &[f64],
    pool: &mut ParameterPool,
    remaining: f64,
) -> Result<usize> {
    if history.is_empty() || pool.is_empty() {
        return Ok(0);
    }
    regressor.fit(history, costs)?;
    let rows: Vec<Vec<f64>> = pool.candidates().iter().map(|p| p.features().to_vec()).collect();
    let predictions = regressor.predict_many(&rows)?;

    let before = pool.len();
    let mut verdicts = predictions.iter().map(|&p| p <= remaining);
    pool.retain(|_| verdicts.next().unwrap_or(true));
    Ok(before - pool.len())
}
