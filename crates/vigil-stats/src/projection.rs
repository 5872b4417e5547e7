//! Standardisation and principal-axis projection.
//!
//! `StandardScaler` mirrors the usual fit/transform contract: columns with
//! no spread scale by 1 instead of dividing by zero. `PrincipalAxes` fits
//! a fixed-rank orthogonal projection from the eigen-decomposition of the
//! covariance matrix (cyclic Jacobi, which is exact enough for the small
//! feature counts sensor data carries).

use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};

/// Row-major matrix: one inner `Vec` per observation.
pub type Rows = [Vec<f64>];

fn check_width(rows: &Rows, width: usize) -> StatsResult<()> {
    for row in rows {
        if row.len() != width {
            return Err(StatsError::DimensionMismatch {
                expected: width,
                actual: row.len(),
            });
        }
    }
    Ok(())
}

/// Column means of a row-major matrix.
pub fn centroid(rows: &Rows) -> StatsResult<Vec<f64>> {
    let first = rows.first().ok_or(StatsError::EmptyInput("centroid"))?;
    let width = first.len();
    check_width(rows, width)?;
    let mut sums = vec![0.0; width];
    for row in rows {
        for (s, v) in sums.iter_mut().zip(row) {
            *s += v;
        }
    }
    let n = rows.len() as f64;
    Ok(sums.into_iter().map(|s| s / n).collect())
}

/// Euclidean distance between two points of equal dimension.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> StatsResult<f64> {
    if a.len() != b.len() {
        return Err(StatsError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt())
}

// ── Standard scaler ─────────────────────────────────────────────────────

/// Per-column standardisation fitted on a reference matrix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit per-column mean and standard deviation.
    pub fn fit(rows: &Rows) -> StatsResult<Self> {
        let means = centroid(rows)?;
        let n = rows.len() as f64;
        let mut vars = vec![0.0; means.len()];
        for row in rows {
            for ((acc, v), m) in vars.iter_mut().zip(row).zip(&means) {
                *acc += (v - m).powi(2);
            }
        }
        let scales = vars
            .into_iter()
            .map(|v| {
                let sd = (v / n).sqrt();
                if sd > 0.0 {
                    sd
                } else {
                    1.0
                }
            })
            .collect();
        Ok(Self { means, scales })
    }

    /// Standardise `rows` with the fitted columns.
    pub fn transform(&self, rows: &Rows) -> StatsResult<Vec<Vec<f64>>> {
        check_width(rows, self.means.len())?;
        Ok(rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.means)
                    .zip(&self.scales)
                    .map(|((v, m), s)| (v - m) / s)
                    .collect()
            })
            .collect())
    }
}

// ── Principal axes ──────────────────────────────────────────────────────

/// Fixed-rank orthogonal projection onto the dominant variance axes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrincipalAxes {
    /// Column means of the fitted data (projection centre).
    pub mean: Vec<f64>,
    /// `rank` unit vectors of length `p`, strongest axis first.
    pub components: Vec<Vec<f64>>,
    /// Variance captured by each retained axis.
    pub explained_variance: Vec<f64>,
    /// Share of total variance captured by each retained axis.
    pub explained_variance_ratio: Vec<f64>,
}

impl PrincipalAxes {
    /// Fit `rank` axes. A rank above the feature count is clamped to it.
    pub fn fit(rows: &Rows, rank: usize) -> StatsResult<Self> {
        if rank == 0 {
            return Err(StatsError::InvalidParameter {
                name: "rank",
                detail: "projection rank must be at least 1".into(),
            });
        }
        if rows.len() < 2 {
            return Err(StatsError::InsufficientData {
                needed: 2,
                got: rows.len(),
            });
        }
        let mean = centroid(rows)?;
        let p = mean.len();
        if p == 0 {
            return Err(StatsError::EmptyInput("principal axes need at least one feature"));
        }

        let mut cov = vec![vec![0.0; p]; p];
        for row in rows {
            for i in 0..p {
                let di = row[i] - mean[i];
                for j in i..p {
                    cov[i][j] += di * (row[j] - mean[j]);
                }
            }
        }
        let denom = (rows.len() - 1) as f64;
        for i in 0..p {
            for j in i..p {
                cov[i][j] /= denom;
                cov[j][i] = cov[i][j];
            }
        }

        let (values, vectors) = jacobi_eigen(cov);
        let mut order: Vec<usize> = (0..p).collect();
        order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

        let total: f64 = values.iter().map(|v| v.max(0.0)).sum();
        let keep = rank.min(p);
        let mut components = Vec::with_capacity(keep);
        let mut explained_variance = Vec::with_capacity(keep);
        let mut explained_variance_ratio = Vec::with_capacity(keep);
        for &k in order.iter().take(keep) {
            let mut axis: Vec<f64> = (0..p).map(|r| vectors[r][k]).collect();
            // Deterministic orientation: largest-magnitude loading positive.
            let pivot = axis
                .iter()
                .copied()
                .fold(0.0_f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
            if pivot < 0.0 {
                axis.iter_mut().for_each(|v| *v = -*v);
            }
            let var = values[k].max(0.0);
            components.push(axis);
            explained_variance.push(var);
            explained_variance_ratio.push(if total > 0.0 { var / total } else { 0.0 });
        }

        Ok(Self {
            mean,
            components,
            explained_variance,
            explained_variance_ratio,
        })
    }

    /// Number of retained axes.
    pub fn rank(&self) -> usize {
        self.components.len()
    }

    /// Project rows onto the fitted axes.
    pub fn project(&self, rows: &Rows) -> StatsResult<Vec<Vec<f64>>> {
        check_width(rows, self.mean.len())?;
        Ok(rows.iter().map(|row| self.project_row(row)).collect())
    }

    fn project_row(&self, row: &[f64]) -> Vec<f64> {
        self.components
            .iter()
            .map(|axis| {
                axis.iter()
                    .zip(row)
                    .zip(&self.mean)
                    .map(|((w, v), m)| w * (v - m))
                    .sum()
            })
            .collect()
    }
}

/// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns eigenvalues and a matrix whose columns are the eigenvectors.
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let p = a.len();
    let mut v: Vec<Vec<f64>> = (0..p)
        .map(|i| (0..p).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    let scale: f64 = a.iter().flatten().map(|x| x * x).sum();
    for _sweep in 0..100 {
        let mut off = 0.0;
        for i in 0..p {
            for j in (i + 1)..p {
                off += a[i][j] * a[i][j];
            }
        }
        if off <= 1e-24 * scale || off == 0.0 {
            break;
        }
        for i in 0..p {
            for j in (i + 1)..p {
                if a[i][j] == 0.0 {
                    continue;
                }
                let theta = (a[j][j] - a[i][i]) / (2.0 * a[i][j]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                for row in a.iter_mut() {
                    let (aki, akj) = (row[i], row[j]);
                    row[i] = c * aki - s * akj;
                    row[j] = s * aki + c * akj;
                }
                for k in 0..p {
                    let (aik, ajk) = (a[i][k], a[j][k]);
                    a[i][k] = c * aik - s * ajk;
                    a[j][k] = s * aik + c * ajk;
                }
                for row in v.iter_mut() {
                    let (vki, vkj) = (row[i], row[j]);
                    row[i] = c * vki - s * vkj;
                    row[j] = s * vki + c * vkj;
                }
            }
        }
    }

    let values = (0..p).map(|i| a[i][i]).collect();
    (values, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_and_distance() {
        let rows = vec![vec![0.0, 0.0], vec![2.0, 4.0]];
        assert_eq!(centroid(&rows).unwrap(), vec![1.0, 2.0]);
        assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap() - 5.0).abs() < 1e-12);
        assert!(euclidean_distance(&[0.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn ragged_rows_rejected() {
        let rows = vec![vec![0.0, 0.0], vec![1.0]];
        assert_eq!(
            centroid(&rows),
            Err(StatsError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn scaler_leaves_constant_columns_unscaled() {
        let rows = vec![vec![1.0, 7.0], vec![3.0, 7.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.scales[1], 1.0);
        let t = scaler.transform(&rows).unwrap();
        assert_eq!(t[0], vec![-1.0, 0.0]);
        assert_eq!(t[1], vec![1.0, 0.0]);
    }

    #[test]
    fn jacobi_recovers_diagonal_eigenvalues() {
        let (values, _) = jacobi_eigen(vec![vec![2.0, 1.0], vec![1.0, 2.0]]);
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        assert!((sorted[0] - 1.0).abs() < 1e-10);
        assert!((sorted[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn principal_axis_follows_dominant_direction() {
        // Points along y = x with a little orthogonal noise.
        let rows: Vec<Vec<f64>> = (0..50)
            .map(|i| {
                let t = i as f64;
                let wiggle = if i % 2 == 0 { 0.1 } else { -0.1 };
                vec![t + wiggle, t - wiggle]
            })
            .collect();
        let axes = PrincipalAxes::fit(&rows, 2).unwrap();
        assert_eq!(axes.rank(), 2);
        let first = &axes.components[0];
        let inv_sqrt2 = 1.0 / 2f64.sqrt();
        assert!((first[0] - inv_sqrt2).abs() < 1e-6);
        assert!((first[1] - inv_sqrt2).abs() < 1e-6);
        assert!(axes.explained_variance_ratio[0] > 0.99);
        let ratio_sum: f64 = axes.explained_variance_ratio.iter().sum();
        assert!((ratio_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn components_are_orthonormal() {
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| {
                let t = i as f64;
                vec![t, (t * 0.7).sin() * 3.0, t * 0.5 + (t * 1.3).cos()]
            })
            .collect();
        let axes = PrincipalAxes::fit(&rows, 3).unwrap();
        for a in 0..3 {
            for b in 0..3 {
                let dot: f64 = axes.components[a]
                    .iter()
                    .zip(&axes.components[b])
                    .map(|(x, y)| x * y)
                    .sum();
                let expected = if a == b { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-8, "dot({a},{b}) = {dot}");
            }
        }
    }

    #[test]
    fn rank_is_clamped_to_feature_count() {
        let rows = vec![vec![1.0], vec![2.0], vec![4.0]];
        let axes = PrincipalAxes::fit(&rows, 2).unwrap();
        assert_eq!(axes.rank(), 1);
    }

    #[test]
    fn projecting_fitted_data_centres_it() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 1.0], vec![5.0, 6.0], vec![0.0, 3.0]];
        let axes = PrincipalAxes::fit(&rows, 2).unwrap();
        let projected = axes.project(&rows).unwrap();
        let c = centroid(&projected).unwrap();
        assert!(c.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn fit_rejects_zero_rank_and_tiny_input() {
        assert!(PrincipalAxes::fit(&[vec![1.0], vec![2.0]], 0).is_err());
        assert_eq!(
            PrincipalAxes::fit(&[vec![1.0]], 1),
            Err(StatsError::InsufficientData { needed: 2, got: 1 })
        );
    }
}
