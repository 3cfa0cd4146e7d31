//! Running statistics over a numeric series.

/// Min, max, mean, and sample standard deviation of a series.
///
/// A plain value: [`with`](Self::with) returns the statistics of the series
/// extended by one value and leaves `self` untouched. Every statistic is NaN
/// for an empty series, and the standard deviation is NaN for a single value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    count: u64,
    min: f64,
    max: f64,
    mean: f64,
    /// Sum of squared deviations from the mean.
    m2: f64,
}

impl Default for SeriesStats {
    fn default() -> Self {
        Self {
            count: 0,
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            m2: 0.0,
        }
    }
}

impl SeriesStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics of `values`.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        values.iter().fold(Self::new(), |stats, &v| stats.with(v))
    }

    /// Statistics of this series with `value` appended.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn with(self, value: f64) -> Self {
        if self.count == 0 {
            return Self {
                count: 1,
                min: value,
                max: value,
                mean: value,
                m2: 0.0,
            };
        }

        let count = self.count + 1;
        let delta = value - self.mean;
        let mean = self.mean + delta / count as f64;
        Self {
            count,
            min: self.min.min(value),
            max: self.max.max(value),
            mean,
            m2: self.m2 + delta * (value - mean),
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation (divides by `n - 1`).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            return f64::NAN;
        }
        (self.m2 / (self.count - 1) as f64).sqrt()
    }
}

impl FromIterator<f64> for SeriesStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with)
    }
}
