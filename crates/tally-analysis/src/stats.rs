//! Numeric kernels and special functions.
//!
//! Everything here works on plain slices and returns `None` where the
//! statistic is undefined (too few values, zero variance), so callers never
//! see NaN or infinities.

use std::f64::consts::PI;

const EPS: f64 = 1e-14;
const FPMIN: f64 = 1e-300;
const MAX_ITER: usize = 500;

/// `Some(v)` for finite values.
pub fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (ddof = 1).
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    finite(ss / (values.len() - 1) as f64)
}

/// Sample standard deviation (ddof = 1).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Ascending copy of `values`.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Quantile of sorted values with linear interpolation between ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    finite(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Biased central moments of a sample.
#[derive(Debug, Clone, Copy)]
pub struct Moments {
    pub n: f64,
    pub m2: f64,
    pub m3: f64,
    pub m4: f64,
}

impl Moments {
    pub fn of(values: &[f64]) -> Option<Self> {
        let m = mean(values)?;
        let n = values.len() as f64;
        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for v in values {
            let d = v - m;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        Some(Self {
            n,
            m2: m2 / n,
            m3: m3 / n,
            m4: m4 / n,
        })
    }

    /// Fisher-Pearson coefficient `m3 / m2^1.5`.
    pub fn skewness(&self) -> Option<f64> {
        if self.m2 <= 0.0 {
            return None;
        }
        finite(self.m3 / self.m2.powf(1.5))
    }

    /// Pearson kurtosis `m4 / m2²`.
    pub fn kurtosis(&self) -> Option<f64> {
        if self.m2 <= 0.0 {
            return None;
        }
        finite(self.m4 / (self.m2 * self.m2))
    }

    /// Excess kurtosis `m4 / m2² - 3`.
    pub fn excess_kurtosis(&self) -> Option<f64> {
        self.kurtosis().map(|k| k - 3.0)
    }
}

pub fn skewness(values: &[f64]) -> Option<f64> {
    Moments::of(values)?.skewness()
}

pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    Moments::of(values)?.excess_kurtosis()
}

/// Pairs where both sides are present.
pub fn pairwise_complete(x: &[Option<f64>], y: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip()
}

/// Pearson correlation of aligned samples, clamped to [-1, 1].
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    finite(sxy / (sxx * syy).sqrt()).map(|r| r.clamp(-1.0, 1.0))
}

/// 1-based ranks, ties sharing their average rank.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1..=end
        let rank = (start + end + 1) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

/// Spearman rank correlation of aligned samples.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Shannon entropy (natural log) of a frequency distribution.
pub fn entropy(counts: &[usize]) -> Option<f64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return None;
    }
    let total = total as f64;
    let h: f64 = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.ln()
        })
        .sum();
    // -0.0 for a single category
    finite(h.abs())
}

/// Natural log of the gamma function (Lanczos approximation, g = 7).
pub fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEF: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // reflection
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut a = COEF[0];
    for (i, c) in COEF.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    let t = x + G + 0.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// Regularized upper incomplete gamma function `Q(a, x)`.
pub fn gamma_q(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if x < a + 1.0 {
        1.0 - gamma_p_series(a, x)
    } else {
        gamma_q_continued_fraction(a, x)
    }
}

fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut del = 1.0 / a;
    let mut sum = del;
    for _ in 0..MAX_ITER {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * EPS {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

fn gamma_q_continued_fraction(a: f64, x: f64) -> f64 {
    // modified Lentz
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..MAX_ITER {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = b + an / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// Survival function of the chi-square distribution.
pub fn chi2_sf(x: f64, df: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    gamma_q(df / 2.0, x / 2.0)
}

/// D'Agostino skewness test statistic.
fn skew_z(moments: &Moments) -> Option<f64> {
    let n = moments.n;
    let b2 = moments.skewness()?;
    let mut y = b2 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    if y == 0.0 {
        y = 1.0;
    }
    let ya = y / alpha;
    finite(delta * (ya + (ya * ya + 1.0).sqrt()).ln())
}

/// Anscombe-Glynn kurtosis test statistic.
fn kurtosis_z(moments: &Moments) -> Option<f64> {
    let n = moments.n;
    let b2 = moments.kurtosis()?;
    let e = 3.0 * (n - 1.0) / (n + 1.0);
    let var_b2 =
        24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let x = (b2 - e) / var_b2.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return None;
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();
    finite((term1 - term2) / (2.0 / (9.0 * a)).sqrt())
}

/// p-value of the D'Agostino-Pearson omnibus normality test.
///
/// Needs at least 8 values and non-zero variance.
pub fn normal_test(values: &[f64]) -> Option<f64> {
    if values.len() < 8 {
        return None;
    }
    let moments = Moments::of(values)?;
    let zs = skew_z(&moments)?;
    let zk = kurtosis_z(&moments)?;
    let k2 = zs * zs + zk * zk;
    // chi-square with 2 degrees of freedom
    finite((-k2 / 2.0).exp())
}

/// p-value of the chi-square goodness-of-fit test against a uniform
/// distribution over the observed categories.
pub fn chisquare_uniform(counts: &[usize]) -> Option<f64> {
    let k = counts.len();
    let total: usize = counts.iter().sum();
    if k < 2 || total == 0 {
        return None;
    }
    let expected = total as f64 / k as f64;
    let stat: f64 = counts
        .iter()
        .map(|&c| (c as f64 - expected).powi(2) / expected)
        .sum();
    finite(chi2_sf(stat, (k - 1) as f64))
}

/// Pearson chi-square statistic of a contingency table.
///
/// Applies Yates' continuity correction when the table has one degree of
/// freedom.
pub fn contingency_chi2(observed: &[Vec<f64>]) -> Option<f64> {
    let rows = observed.len();
    let cols = observed.first()?.len();
    let total: f64 = observed.iter().flatten().sum();
    if total <= 0.0 {
        return None;
    }
    let row_sums: Vec<f64> = observed.iter().map(|r| r.iter().sum()).collect();
    let col_sums: Vec<f64> = (0..cols)
        .map(|j| observed.iter().map(|r| r[j]).sum())
        .collect();
    let yates = (rows - 1) * (cols - 1) == 1;

    let mut chi2 = 0.0;
    for (i, row) in observed.iter().enumerate() {
        for (j, &o) in row.iter().enumerate() {
            let e = row_sums[i] * col_sums[j] / total;
            if e <= 0.0 {
                continue;
            }
            let mut o = o;
            if yates {
                let diff = e - o;
                o += diff.abs().min(0.5) * diff.signum();
            }
            chi2 += (o - e).powi(2) / e;
        }
    }
    finite(chi2)
}

/// Bias-corrected Cramér's V of a contingency table.
pub fn cramers_v(observed: &[Vec<f64>]) -> Option<f64> {
    let r = observed.len() as f64;
    let k = observed.first()?.len() as f64;
    let n: f64 = observed.iter().flatten().sum();
    if n <= 1.0 {
        return None;
    }
    let chi2 = contingency_chi2(observed)?;
    let phi2 = chi2 / n;
    let phi2_corr = (phi2 - (k - 1.0) * (r - 1.0) / (n - 1.0)).max(0.0);
    let r_corr = r - (r - 1.0).powi(2) / (n - 1.0);
    let k_corr = k - (k - 1.0).powi(2) / (n - 1.0);
    let denom = (k_corr - 1.0).min(r_corr - 1.0);
    if denom <= 0.0 {
        return None;
    }
    finite((phi2_corr / denom).sqrt())
}
