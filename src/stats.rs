//! Small numeric helpers shared by the predictor and the reports.

/// Scale factor that makes the MAD a consistent estimator of the standard
/// deviation under normality.
pub const MAD_SCALE: f64 = 1.4826;

/// Average ranks (1-based); ties share the mean of their positions.
pub fn rank_average(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    let mut indexed: Vec<(f64, usize)> = data.iter().copied().zip(0..n).collect();
    indexed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && indexed[j].0.total_cmp(&indexed[i].0).is_eq() {
            j += 1;
        }
        // positions i+1..=j share their mean
        let rank = (i + 1 + j) as f64 / 2.0;
        for item in &indexed[i..j] {
            ranks[item.1] = rank;
        }
        i = j;
    }
    ranks
}

/// Centers `values` and returns them with their Euclidean norm.
pub fn center(values: &[f64]) -> (Vec<f64>, f64) {
    if values.is_empty() {
        return (Vec::new(), 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let centered: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let norm = centered.iter().map(|v| v * v).sum::<f64>().sqrt();
    (centered, norm)
}

/// Pearson correlation of two pre-centered vectors. `None` when either is
/// constant.
pub fn centered_correlation(x: &[f64], x_norm: f64, y: &[f64], y_norm: f64) -> Option<f64> {
    if x_norm == 0.0 || y_norm == 0.0 {
        return None;
    }
    let dot: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    Some((dot / (x_norm * y_norm)).clamp(-1.0, 1.0))
}

/// Linear-interpolation quantile (R type 7) of unsorted data.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = pos - lo as f64;
    Some(sorted[lo] * (1.0 - frac) + sorted[hi] * frac)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Scaled median absolute deviation.
pub fn mad(values: &[f64]) -> Option<f64> {
    let med = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    median(&deviations).map(|d| d * MAD_SCALE)
}

#[cfg(test)]
#[path = "../tests/src_inline/stats.rs"]
mod tests;
