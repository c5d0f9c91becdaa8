//! Wilson-interval confidence estimation, ported from the reference
//! implementation's `Statistics.{h,cpp}` (`GabrielRStella/QORA`).

/// A two-sided confidence interval over a binomial proportion.
///
/// Ordering is a *strict separation* partial order (spec.md §4.C6): `a > b`
/// iff `a.lower > b.upper`, `a < b` iff `a.upper < b.lower`. Overlapping or
/// touching intervals are incomparable, and `PartialOrd::partial_cmp`
/// reflects that by returning `None` rather than guessing.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl Default for ConfidenceInterval {
    /// The "nothing observed yet" interval: the full `[0, 1]` range.
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
        }
    }
}

impl ConfidenceInterval {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Strict separation above a threshold: is `lower` greater than `d`?
    pub fn exceeds(&self, d: f64) -> bool {
        self.lower > d
    }

    /// Strict separation below a threshold: is `upper` less than `d`?
    pub fn under(&self, d: f64) -> bool {
        self.upper < d
    }

    /// `self` strictly above `other`: `self.lower > other.upper`.
    pub fn strictly_above(&self, other: &Self) -> bool {
        self.lower > other.upper
    }

    /// `self` strictly below `other`: `self.upper < other.lower`.
    pub fn strictly_below(&self, other: &Self) -> bool {
        self.upper < other.lower
    }
}

impl PartialOrd for ConfidenceInterval {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        if self.strictly_above(other) {
            Some(std::cmp::Ordering::Greater)
        } else if self.strictly_below(other) {
            Some(std::cmp::Ordering::Less)
        } else {
            None
        }
    }
}

const Z_MAX: f64 = 6.0;
const Z_EPSILON: f64 = 1e-7;

/// Hart-style rational approximation of the standard normal CDF `P(Z <= z)`.
///
/// Ported verbatim (structure preserved, renamed for clarity) from the
/// reference implementation's `poz` function, itself a classic Hart
/// approximation. Accurate well beyond the `1e-6` target named in spec.md
/// §4.C6 over `[-6, 6]`.
fn standard_normal_cdf(z: f64) -> f64 {
    if z == 0.0 {
        return 0.5;
    }
    let y = 0.5 * z.abs();
    let x = if y > Z_MAX * 0.5 {
        1.0
    } else if y < 1.0 {
        let w = y * y;
        ((((((((0.000_124_818_987 * w - 0.001_075_204_047) * w + 0.005_198_775_019) * w
            - 0.019_198_292_004)
            * w
            + 0.059_054_035_642)
            * w
            - 0.151_968_751_364)
            * w
            + 0.319_152_932_694)
            * w
            - 0.531_923_007_300)
            * w
            + 0.797_884_560_593)
            * y
            * 2.0
    } else {
        let y = y - 2.0;
        (((((((((((((-0.000_045_255_659 * y + 0.000_152_529_290) * y - 0.000_019_538_132) * y
            - 0.000_676_904_986)
            * y
            + 0.001_390_604_284)
            * y
            - 0.000_794_620_820)
            * y
            - 0.002_034_254_874)
            * y
            + 0.006_549_791_214)
            * y
            - 0.010_557_625_006)
            * y
            + 0.011_630_447_319)
            * y
            - 0.009_279_453_341)
            * y
            + 0.005_353_579_108)
            * y
            - 0.002_141_268_741)
            * y
            + 0.000_535_310_849)
            * y
            + 0.999_936_657_524
    };
    if z > 0.0 {
        (x + 1.0) * 0.5
    } else {
        (1.0 - x) * 0.5
    }
}

/// Inverse standard normal CDF, found by bisection against
/// [`standard_normal_cdf`] on `[-6, 6]`. Accurate to better than `1e-6`
/// (spec.md §4.C6), matching the reference implementation's
/// `normal_critical_value`.
pub fn normal_quantile(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return 0.0;
    }
    let mut lo = -Z_MAX;
    let mut hi = Z_MAX;
    let mut z = 0.0;
    while hi - lo > Z_EPSILON {
        let candidate = standard_normal_cdf(z);
        if candidate > p {
            hi = z;
        } else {
            lo = z;
        }
        z = (hi + lo) * 0.5;
    }
    z
}

/// Wilson score interval for a binomial proportion (spec.md §4.C6).
///
/// `n` total trials, `ns` successes (may be fractional — the learner feeds
/// in `prediction_score * count_total`), `alpha` confidence level (e.g.
/// `0.05` for a 95% interval). Returns the default `[0, 1]` interval for
/// `n == 0`.
pub fn wilson_interval(n: u64, ns: f64, alpha: f64) -> ConfidenceInterval {
    if n == 0 {
        return ConfidenceInterval::default();
    }
    let n = n as f64;
    let z = normal_quantile(1.0 - alpha / 2.0);
    let z2 = z * z;
    let nf = n - ns;
    let center = (ns + z2 / 2.0) / (n + z2);
    let root = (ns * nf / n) + (z2 / 4.0);
    let radius = (z / (n + z2)) * root.max(0.0).sqrt();
    ConfidenceInterval::new(center - radius, center + radius)
}
