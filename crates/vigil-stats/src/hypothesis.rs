//! Two-sample distribution-equality tests.
//!
//! - Kolmogorov–Smirnov: maximum distance between the empirical CDFs, with
//!   the asymptotic Kolmogorov distribution for the p-value.
//! - Student / Welch t-tests: difference in means, p-value from the
//!   regularised incomplete beta function.

use serde::{Deserialize, Serialize};

use crate::descriptive::mean;
use crate::error::{StatsError, StatsResult};

/// Statistic and two-sided p-value of a two-sample test.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

// ── Kolmogorov–Smirnov ──────────────────────────────────────────────────

/// Two-sample Kolmogorov–Smirnov test.
///
/// Ties are handled by advancing both samples past every value equal to
/// the current step before measuring the CDF gap.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> StatsResult<TestOutcome> {
    if a.is_empty() || b.is_empty() {
        return Err(StatsError::EmptyInput("ks_two_sample"));
    }
    let mut xs = a.to_vec();
    let mut ys = b.to_vec();
    xs.sort_by(|p, q| p.total_cmp(q));
    ys.sort_by(|p, q| p.total_cmp(q));

    let (n, m) = (xs.len(), ys.len());
    let (mut i, mut j) = (0usize, 0usize);
    let mut d: f64 = 0.0;
    while i < n && j < m {
        let step = xs[i].min(ys[j]);
        while i < n && xs[i] <= step {
            i += 1;
        }
        while j < m && ys[j] <= step {
            j += 1;
        }
        d = d.max((i as f64 / n as f64 - j as f64 / m as f64).abs());
    }

    let en = ((n * m) as f64 / (n + m) as f64).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * d;
    Ok(TestOutcome {
        statistic: d,
        p_value: kolmogorov_survival(lambda),
    })
}

/// Survival function of the Kolmogorov distribution,
/// `Q(λ) = 2 Σ (-1)^(k-1) exp(-2 k² λ²)`.
pub fn kolmogorov_survival(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let a2 = -2.0 * lambda * lambda;
    let mut sign = 2.0;
    let mut sum = 0.0;
    let mut previous = 0.0;
    for k in 1..=100 {
        let kf = k as f64;
        let term = sign * (a2 * kf * kf).exp();
        sum += term;
        if term.abs() <= 1e-10 * previous || term.abs() <= 1e-16 * sum.abs() {
            return sum.clamp(0.0, 1.0);
        }
        sign = -sign;
        previous = term.abs();
    }
    // Series fails to converge only for tiny λ, where Q is 1.
    1.0
}

// ── t-tests ─────────────────────────────────────────────────────────────

/// Two-sample t-test.
///
/// `equal_variance = true` pools the variances (Student);
/// `false` uses the Welch–Satterthwaite degrees of freedom.
pub fn t_test(a: &[f64], b: &[f64], equal_variance: bool) -> StatsResult<TestOutcome> {
    for len in [a.len(), b.len()] {
        if len < 2 {
            return Err(StatsError::InsufficientData { needed: 2, got: len });
        }
    }
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (m1, m2) = (mean(a)?, mean(b)?);
    let v1 = a.iter().map(|x| (x - m1).powi(2)).sum::<f64>() / (n1 - 1.0);
    let v2 = b.iter().map(|x| (x - m2).powi(2)).sum::<f64>() / (n2 - 1.0);

    let (se, df) = if equal_variance {
        let df = n1 + n2 - 2.0;
        let pooled = ((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / df;
        ((pooled * (1.0 / n1 + 1.0 / n2)).sqrt(), df)
    } else {
        let s1 = v1 / n1;
        let s2 = v2 / n2;
        let df = (s1 + s2).powi(2) / (s1 * s1 / (n1 - 1.0) + s2 * s2 / (n2 - 1.0));
        ((s1 + s2).sqrt(), df)
    };

    if se == 0.0 {
        // Both samples constant: identical means are indistinguishable,
        // different ones are separated with certainty.
        return Ok(if m1 == m2 {
            TestOutcome {
                statistic: 0.0,
                p_value: 1.0,
            }
        } else {
            TestOutcome {
                statistic: if m1 > m2 { f64::INFINITY } else { f64::NEG_INFINITY },
                p_value: 0.0,
            }
        });
    }

    let t = (m1 - m2) / se;
    Ok(TestOutcome {
        statistic: t,
        p_value: student_t_two_sided(t, df),
    })
}

/// Two-sided tail probability of Student's t with `df` degrees of freedom.
pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    regularized_incomplete_beta(df / 2.0, 0.5, df / (df + t * t)).clamp(0.0, 1.0)
}

// ── Special functions ───────────────────────────────────────────────────

/// Natural log of the gamma function (Lanczos approximation).
pub fn ln_gamma(x: f64) -> f64 {
    const COF: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_9e-2,
        -0.539_523_938_495_3e-5,
    ];
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000_000_000_190_015;
    for c in COF {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * ser / x).ln()
}

/// Regularised incomplete beta function `I_x(a, b)`.
pub fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let front =
        (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 3.0e-16;
    const FPMIN: f64 = 1.0e-300;

    let guard = |v: f64| if v.abs() < FPMIN { FPMIN } else { v };

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;
    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        h *= d * c;
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h
}
