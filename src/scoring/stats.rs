//! Descriptive statistics over score collections.
//!
//! Every function is total: degenerate inputs (empty, single-element,
//! zero variance) return well-defined sentinels instead of NaN so that
//! downstream report rendering never has to special-case.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (n - 1 denominator). Zero for fewer than
/// two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Standard scores. A zero-variance input maps every value to 0.0.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let std = sample_std(values);
    if std == 0.0 {
        return vec![0.0; values.len()];
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) / std).collect()
}

/// Rescale to [0, 1]. A flat input maps every value to 0.5.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return vec![0.5; values.len()];
    }
    values.iter().map(|v| (v - min) / (max - min)).collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
}

/// Normal-approximation confidence interval around the mean. Supported
/// confidence levels are 0.90, 0.95, and 0.99; anything else gets the
/// 0.95 critical value. Degenerate inputs collapse to a zero-width
/// interval at the mean.
pub fn confidence_interval(values: &[f64], confidence: f64) -> ConfidenceInterval {
    let m = mean(values);
    let std = sample_std(values);
    if values.len() < 2 || std == 0.0 {
        return ConfidenceInterval {
            mean: m,
            lower: m,
            upper: m,
            confidence,
        };
    }

    let z = if confidence >= 0.99 {
        2.576
    } else if confidence >= 0.95 {
        1.96
    } else if confidence >= 0.90 {
        1.645
    } else {
        1.96
    };
    let margin = z * std / (values.len() as f64).sqrt();
    ConfidenceInterval {
        mean: m,
        lower: m - margin,
        upper: m + margin,
        confidence,
    }
}

/// Pearson correlation coefficient. Mismatched lengths, fewer than two
/// pairs, or zero variance on either side return 0.0.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }
    let mx = mean(xs);
    let my = mean(ys);

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        var_x += (x - mx).powi(2);
        var_y += (y - my).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Cohen's d effect size between two score groups, using the pooled
/// sample standard deviation. An empty group, fewer than three total
/// observations, or zero pooled variance returns 0.0.
pub fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() + b.len() < 3 {
        return 0.0;
    }
    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let s1 = sample_std(a);
    let s2 = sample_std(b);
    let pooled =
        (((n1 - 1.0) * s1.powi(2) + (n2 - 1.0) * s2.powi(2)) / (n1 + n2 - 2.0)).sqrt();
    if pooled == 0.0 {
        return 0.0;
    }
    (mean(a) - mean(b)).abs() / pooled
}

/// Qualitative band for a Cohen's d effect size.
pub fn interpret_effect_size(d: f64) -> &'static str {
    if d >= 0.8 {
        "large"
    } else if d >= 0.5 {
        "medium"
    } else if d >= 0.2 {
        "small"
    } else {
        "negligible"
    }
}

/// Linearly interpolated percentile, `q` in [0, 100]. Matches the
/// conventional "linear" method on a sorted sample.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (q / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Summary of one score distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Descriptive {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
    /// Coefficient of variation; 0.0 when the mean is zero.
    pub cv: f64,
    pub count: usize,
}

pub fn describe(values: &[f64]) -> Descriptive {
    let m = mean(values);
    let std = sample_std(values);
    Descriptive {
        mean: m,
        median: median(values),
        std,
        min: values.iter().copied().reduce(f64::min).unwrap_or(0.0),
        max: values.iter().copied().reduce(f64::max).unwrap_or(0.0),
        q25: percentile(values, 25.0),
        q75: percentile(values, 75.0),
        cv: if m != 0.0 { std / m } else { 0.0 },
        count: values.len(),
    }
}

/// Agreement between judges across a set of shared evaluations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityReport {
    /// Mean pairwise Pearson correlation of overall scores.
    pub mean_correlation: f64,
    /// Correlation per judge pair, keyed "a/b" with names sorted.
    pub pairwise: BTreeMap<String, f64>,
    pub assessment: String,
}

/// Inter-rater reliability over per-judge score series. Each entry maps
/// a judge name to its overall scores across the same ordered set of
/// tests; series shorter than two items are skipped.
pub fn inter_rater_reliability(series: &BTreeMap<String, Vec<f64>>) -> ReliabilityReport {
    let judges: Vec<&String> = series
        .iter()
        .filter(|(_, scores)| scores.len() >= 2)
        .map(|(name, _)| name)
        .collect();

    let mut pairwise = BTreeMap::new();
    let mut correlations = Vec::new();
    for (i, a) in judges.iter().enumerate() {
        for b in &judges[i + 1..] {
            let r = pearson(&series[*a], &series[*b]);
            pairwise.insert(format!("{a}/{b}"), r);
            correlations.push(r);
        }
    }

    let mean_correlation = mean(&correlations);
    let assessment = if correlations.is_empty() {
        "insufficient data"
    } else if mean_correlation >= 0.8 {
        "excellent agreement"
    } else if mean_correlation >= 0.6 {
        "good agreement"
    } else if mean_correlation >= 0.4 {
        "fair agreement"
    } else {
        "poor agreement"
    }
    .to_string();

    ReliabilityReport {
        mean_correlation,
        pairwise,
        assessment,
    }
}
