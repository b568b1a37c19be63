//! Additive time-series forecaster.
//!
//! The model is `trend + yearly + weekly + regressors`, where the trend is a
//! straight line in scaled time, the seasonal terms are Fourier series and
//! extra regressors are standardized against their history. It is fitted
//! from scratch on every call by ridge-penalized least squares, with the
//! trend terms left unpenalized.

use chrono::{Datelike, Days, NaiveDate};
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use std::collections::BTreeMap;
use std::f64::consts::PI;
use tracing::debug;

use crate::error::{DashboardError, Result};
use crate::models::{Measure, UvObservation};
use crate::utils::constants::{
    DEFAULT_INTERVAL_WIDTH, SEASONALITY_RIDGE, WEEKLY_FOURIER_ORDER, WEEKLY_MIN_SPAN_DAYS,
    YEARLY_FOURIER_ORDER, YEARLY_MIN_SPAN_DAYS,
};

const YEAR_DAYS: f64 = 365.25;
const WEEK_DAYS: f64 = 7.0;

/// One training observation.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub regressors: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// History plus predictions over history and the requested horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub history: Vec<(NaiveDate, f64)>,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    pub fn at(&self, date: NaiveDate) -> Option<&ForecastPoint> {
        self.points.iter().find(|p| p.date == date)
    }

    /// The first `count` points on or after `start`.
    pub fn window(&self, start: NaiveDate, count: usize) -> Vec<ForecastPoint> {
        self.points
            .iter()
            .filter(|p| p.date >= start)
            .take(count)
            .copied()
            .collect()
    }

    /// Mean of `yhat` per calendar month (1-12), only months present.
    pub fn monthly_means(&self) -> Vec<(u32, f64)> {
        let mut sums: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
        for point in &self.points {
            let entry = sums.entry(point.date.month()).or_insert((0.0, 0));
            entry.0 += point.yhat;
            entry.1 += 1;
        }
        sums.into_iter()
            .map(|(month, (sum, count))| (month, sum / count as f64))
            .collect()
    }

    pub fn last_history_date(&self) -> Option<NaiveDate> {
        self.history.last().map(|(d, _)| *d)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Scaling {
    mean: f64,
    std: f64,
}

impl Scaling {
    fn of(values: impl Iterator<Item = f64> + Clone) -> Self {
        let n = values.clone().count().max(1) as f64;
        let mean = values.clone().sum::<f64>() / n;
        let var = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = if var > 0.0 { var.sqrt() } else { 1.0 };
        Self { mean, std }
    }

    fn apply(&self, v: f64) -> f64 {
        (v - self.mean) / self.std
    }
}

/// A fitted additive model.
#[derive(Debug, Clone)]
pub struct FittedModel {
    start: NaiveDate,
    span_days: f64,
    yearly_order: usize,
    weekly_order: usize,
    regressor_scales: Vec<Scaling>,
    y_scale: f64,
    beta: DVector<f64>,
    sigma: f64,
    z: f64,
    history_dates: Vec<NaiveDate>,
}

impl FittedModel {
    fn features(&self, date: NaiveDate, regressors: &[f64]) -> Vec<f64> {
        let offset = (date - self.start).num_days() as f64;
        let epoch_days = date.num_days_from_ce() as f64;

        let mut row = Vec::with_capacity(self.beta.len());
        row.push(1.0);
        row.push(offset / self.span_days);
        push_fourier(&mut row, epoch_days, YEAR_DAYS, self.yearly_order);
        push_fourier(&mut row, epoch_days, WEEK_DAYS, self.weekly_order);
        for (scale, value) in self.regressor_scales.iter().zip(regressors) {
            row.push(scale.apply(*value));
        }
        row
    }

    pub fn regressor_count(&self) -> usize {
        self.regressor_scales.len()
    }

    pub fn has_yearly(&self) -> bool {
        self.yearly_order > 0
    }

    pub fn has_weekly(&self) -> bool {
        self.weekly_order > 0
    }

    /// History dates followed by `periods` consecutive days.
    pub fn future_dates(&self, periods: u32) -> Vec<NaiveDate> {
        let mut dates = self.history_dates.clone();
        if let Some(last) = self.history_dates.last().copied() {
            dates.extend((1..=periods as u64).filter_map(|d| last.checked_add_days(Days::new(d))));
        }
        dates
    }

    /// Predict at `dates`; `regressors[i]` supplies the extra regressor
    /// values for `dates[i]`.
    pub fn predict(&self, dates: &[NaiveDate], regressors: &[Vec<f64>]) -> Vec<ForecastPoint> {
        let half_width = self.z * self.sigma;
        dates
            .iter()
            .zip(regressors)
            .map(|(date, regs)| {
                let row = self.features(*date, regs);
                let yhat = row.iter().zip(self.beta.iter()).map(|(x, b)| x * b).sum::<f64>()
                    * self.y_scale;
                ForecastPoint {
                    date: *date,
                    yhat,
                    yhat_lower: yhat - half_width,
                    yhat_upper: yhat + half_width,
                }
            })
            .collect()
    }
}

fn push_fourier(row: &mut Vec<f64>, t: f64, period: f64, order: usize) {
    for k in 1..=order {
        let angle = 2.0 * PI * k as f64 * t / period;
        row.push(angle.sin());
        row.push(angle.cos());
    }
}

pub struct Forecaster {
    interval_width: f64,
    ridge: f64,
}

impl Forecaster {
    pub fn new() -> Self {
        Self {
            interval_width: DEFAULT_INTERVAL_WIDTH,
            ridge: SEASONALITY_RIDGE,
        }
    }

    pub fn with_interval_width(mut self, interval_width: f64) -> Self {
        self.interval_width = interval_width;
        self
    }

    pub fn fit(&self, series: &[SeriesPoint]) -> Result<FittedModel> {
        let mut series: Vec<&SeriesPoint> = series
            .iter()
            .filter(|p| !p.value.is_nan() && p.regressors.iter().all(|r| !r.is_nan()))
            .collect();
        if series.len() < 2 {
            return Err(DashboardError::ModelFit(format!(
                "need at least 2 usable rows, got {}",
                series.len()
            )));
        }
        series.sort_by_key(|p| p.date);

        let regressor_count = series[0].regressors.len();
        if series.iter().any(|p| p.regressors.len() != regressor_count) {
            return Err(DashboardError::ModelFit(
                "regressor columns have differing lengths".to_string(),
            ));
        }

        let start = series[0].date;
        let end = series[series.len() - 1].date;
        let span = (end - start).num_days();
        let min_spacing = series
            .windows(2)
            .map(|w| (w[1].date - w[0].date).num_days())
            .filter(|d| *d > 0)
            .min()
            .unwrap_or(i64::MAX);

        let yearly_order = if span >= YEARLY_MIN_SPAN_DAYS { YEARLY_FOURIER_ORDER } else { 0 };
        let weekly_order = if span >= WEEKLY_MIN_SPAN_DAYS && min_spacing < 7 {
            WEEKLY_FOURIER_ORDER
        } else {
            0
        };

        let regressor_scales: Vec<Scaling> = (0..regressor_count)
            .map(|j| Scaling::of(series.iter().map(move |p| p.regressors[j])))
            .collect();

        let y_scale = series
            .iter()
            .map(|p| p.value.abs())
            .fold(0.0_f64, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let mut history_dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
        history_dates.dedup();

        let mut model = FittedModel {
            start,
            span_days: span.max(1) as f64,
            yearly_order,
            weekly_order,
            regressor_scales,
            y_scale,
            beta: DVector::zeros(0),
            sigma: 0.0,
            z: normal_quantile(0.5 + self.interval_width / 2.0),
            history_dates,
        };

        let n = series.len();
        let k = 2 + 2 * yearly_order + 2 * weekly_order + regressor_count;
        let rows: Vec<Vec<f64>> = series
            .iter()
            .map(|p| model.features(p.date, &p.regressors))
            .collect();
        let x = DMatrix::from_fn(n, k, |i, j| rows[i][j]);
        let y = DVector::from_iterator(n, series.iter().map(|p| p.value / y_scale));

        let mut penalty = DMatrix::<f64>::identity(k, k) * (self.ridge * n as f64);
        penalty[(0, 0)] = 0.0;
        penalty[(1, 1)] = 0.0;

        let xt = x.transpose();
        let lhs = &xt * &x + penalty;
        let rhs = &xt * &y;
        let beta = match lhs.clone().cholesky() {
            Some(chol) => chol.solve(&rhs),
            None => lhs
                .svd(true, true)
                .solve(&rhs, 1e-12)
                .map_err(|e| DashboardError::ModelFit(e.to_string()))?,
        };

        let residuals = &y - &x * &beta;
        model.sigma = (residuals.norm_squared() / n as f64).sqrt() * y_scale;
        model.beta = beta;

        debug!(
            rows = n,
            params = k,
            yearly = model.has_yearly(),
            weekly = model.has_weekly(),
            sigma = model.sigma,
            "Fitted forecast model"
        );
        Ok(model)
    }

    /// Fit `target` for one state's rows and predict over history plus
    /// `periods` days. Future regressor values are their historical means.
    pub fn forecast(
        &self,
        rows: &[&UvObservation],
        target: Measure,
        regressors: &[Measure],
        periods: u32,
    ) -> Result<Forecast> {
        let series: Vec<SeriesPoint> = rows
            .iter()
            .map(|o| SeriesPoint {
                date: o.date,
                value: o.value(target),
                regressors: regressors.iter().map(|m| o.value(*m)).collect(),
            })
            .collect();

        let model = self.fit(&series)?;

        let usable: Vec<&SeriesPoint> = series
            .iter()
            .filter(|p| !p.value.is_nan() && p.regressors.iter().all(|r| !r.is_nan()))
            .collect();
        let means: Vec<f64> = (0..regressors.len())
            .map(|j| usable.iter().map(|p| p.regressors[j]).sum::<f64>() / usable.len() as f64)
            .collect();

        let dates = model.future_dates(periods);
        let future_regressors = vec![means; dates.len()];
        let points = model.predict(&dates, &future_regressors);

        let mut history: Vec<(NaiveDate, f64)> = usable.iter().map(|p| (p.date, p.value)).collect();
        history.sort_by_key(|(d, _)| *d);

        Ok(Forecast { history, points })
    }
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Inverse of the standard normal CDF (Acklam's rational approximation).
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -normal_quantile(1.0 - p)
    }
}
