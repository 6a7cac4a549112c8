//! Numeric building blocks shared by the analysis modules.
//!
//! Sorting helpers, linear-interpolation quantiles, Welford variance and the
//! moment estimators behind skewness and kurtosis. Moments use the population
//! (biased) convention throughout so that a Gaussian sample gives excess
//! kurtosis near zero and the Jarque-Bera statistic matches its textbook form.

/// Variance at or below this value is treated as zero.
pub const ZERO_VARIANCE_THRESHOLD: f64 = 1e-20;

/// Safe comparison for floating point values (NaN sorts last).
pub fn float_total_cmp(a: &f64, b: &f64) -> std::cmp::Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal),
    }
}

/// Returns a sorted copy of `values`.
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(float_total_cmp);
    sorted
}

/// Median of already-sorted data (averages the middle pair for even lengths).
pub fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

/// Median of unsorted data.
pub fn median(values: &[f64]) -> f64 {
    median_of_sorted(&sorted_copy(values))
}

/// Interpolated quantile using the Hyndman-Fan Type 7 method.
///
/// This is the linear-interpolation rule used by R's default `quantile` and
/// by most dataframe libraries, so thresholds computed here line up with
/// figures produced elsewhere.
///
/// Reference: Hyndman, R.J. and Fan, Y. (1996) Sample quantiles in statistical packages.
pub fn quantile_type7(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let p = p.clamp(0.0, 1.0);

    let h = p * (sorted.len() - 1) as f64;
    let h_floor = h.floor() as usize;
    let h_frac = h - h_floor as f64;

    if h_floor + 1 < sorted.len() {
        sorted[h_floor] + h_frac * (sorted[h_floor + 1] - sorted[h_floor])
    } else {
        sorted[sorted.len() - 1]
    }
}

/// Arithmetic mean; NaN for empty input.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Variance with `ddof` delta degrees of freedom (0 = population, 1 = sample).
///
/// Uses Welford's single-pass update for numerical stability. Returns NaN when
/// `data.len() <= ddof`.
pub fn calculate_variance(data: &[f64], ddof: usize) -> f64 {
    if data.len() <= ddof {
        return f64::NAN;
    }

    let mut mean = 0.0;
    let mut m2 = 0.0;
    for (i, &value) in data.iter().enumerate() {
        let count = (i + 1) as f64;
        let delta = value - mean;
        mean += delta / count;
        m2 += delta * (value - mean);
    }

    (m2 / (data.len() - ddof) as f64).max(0.0)
}

/// Population standard deviation (ddof = 0).
pub fn population_std(data: &[f64]) -> f64 {
    calculate_variance(data, 0).sqrt()
}

/// Sample standard deviation (ddof = 1).
pub fn sample_std(data: &[f64]) -> f64 {
    calculate_variance(data, 1).sqrt()
}

/// Second, third and fourth central moments (population convention).
fn central_moments(data: &[f64]) -> (f64, f64, f64) {
    let m = mean(data);
    let n = data.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for &x in data {
        let d = x - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Sample skewness `m3 / m2^1.5`; `None` for empty or zero-variance data.
pub fn calculate_skewness(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let (m2, m3, _) = central_moments(data);
    if m2 <= ZERO_VARIANCE_THRESHOLD {
        return None;
    }
    Some(m3 / m2.powf(1.5))
}

/// Sample kurtosis `m4 / m2^2` (a Gaussian gives about 3).
pub fn calculate_kurtosis(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let (m2, _, m4) = central_moments(data);
    if m2 <= ZERO_VARIANCE_THRESHOLD {
        return None;
    }
    Some(m4 / (m2 * m2))
}
