// Studentized range distribution
//
// CDF by Gauss-Legendre quadrature over Hartley's form of the range integral
// (Copenhaver & Holland 1988, the algorithm behind most statistics packages),
// and its quantile by bisection.
//
// `nmeans` is the number of groups in the family, `df` the residual degrees
// of freedom of the fitted model.

use statrs::function::erf::erfc;
use statrs::function::gamma::ln_gamma;
use std::f64::consts::{LN_2, PI, SQRT_2};

/// Legendre nodes/weights (12-point, half set) for the range integral
const RANGE_NODES: [f64; 6] = [
    0.981_560_634_246_719_3,
    0.904_117_256_370_474_9,
    0.769_902_674_194_304_7,
    0.587_317_954_286_617_4,
    0.367_831_498_998_180_2,
    0.125_233_408_511_468_9,
];
const RANGE_WEIGHTS: [f64; 6] = [
    0.047_175_336_386_511_83,
    0.106_939_325_995_318_43,
    0.160_078_328_543_346_23,
    0.203_167_426_723_065_92,
    0.233_492_536_538_354_8,
    0.249_147_045_813_402_8,
];

/// Legendre nodes/weights (16-point, half set) for the chi integral over df
const DF_NODES: [f64; 8] = [
    0.989_400_934_991_649_9,
    0.944_575_023_073_232_6,
    0.865_631_202_387_831_7,
    0.755_404_408_355_003,
    0.617_876_244_402_643_7,
    0.458_016_777_657_227_4,
    0.281_603_550_779_258_9,
    0.095_012_509_837_637_44,
];
const DF_WEIGHTS: [f64; 8] = [
    0.027_152_459_411_754_095,
    0.062_253_523_938_647_89,
    0.095_158_511_682_492_78,
    0.124_628_971_255_533_87,
    0.149_595_988_816_576_73,
    0.169_156_519_395_002_54,
    0.182_603_415_044_923_6,
    0.189_450_610_455_068_5,
];

fn pnorm(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// P(range of `cc` standard normals < w)
fn range_prob(w: f64, cc: f64) -> f64 {
    const C1: f64 = -30.0;
    const C2: f64 = -50.0;
    const C3: f64 = 60.0;
    const UPPER: f64 = 8.0;
    const W_LARGE: f64 = 3.0;

    let qsqz = w * 0.5;
    if qsqz >= UPPER {
        return 1.0;
    }

    let mut pr_w = 2.0 * pnorm(qsqz) - 1.0;
    pr_w = if pr_w >= (C2 / cc).exp() {
        pr_w.powf(cc)
    } else {
        0.0
    };

    let intervals = if w > W_LARGE { 2 } else { 3 };
    let step = (UPPER - qsqz) / f64::from(intervals);
    let mut lower = qsqz;
    let mut upper = lower + step;
    let cc1 = cc - 1.0;
    let mut integral = 0.0;

    for _ in 0..intervals {
        let a = 0.5 * (upper + lower);
        let b = 0.5 * (upper - lower);
        let mut sum = 0.0;

        for jj in 1..=12usize {
            let (j, xx) = if jj > 6 {
                let j = 12 - jj;
                (j, RANGE_NODES[j])
            } else {
                let j = jj - 1;
                (j, -RANGE_NODES[j])
            };
            let ac = a + b * xx;
            let qexpo = ac * ac;
            if qexpo > C3 {
                break;
            }

            let inner = pnorm(ac) - pnorm(ac - w);
            if inner >= (C1 / cc1).exp() {
                sum += RANGE_WEIGHTS[j] * (-0.5 * qexpo).exp() * inner.powf(cc1);
            }
        }

        integral += sum * (2.0 * b * cc) / (2.0 * PI).sqrt();
        lower = upper;
        upper += step;
    }

    pr_w += integral;
    if pr_w <= C1.exp() {
        return 0.0;
    }
    pr_w.min(1.0)
}

/// CDF of the studentized range: P(Q < q) for `nmeans` groups and `df` degrees of freedom
///
/// Returns NaN when `nmeans < 2` or `df < 2`.
pub fn ptukey(q: f64, nmeans: usize, df: f64) -> f64 {
    const EPS1: f64 = -30.0;
    const EPS2: f64 = 1.0e-14;
    const DF_LARGE: f64 = 25_000.0;

    if nmeans < 2 || df.is_nan() || df < 2.0 {
        return f64::NAN;
    }
    if q <= 0.0 {
        return 0.0;
    }
    if !q.is_finite() {
        return 1.0;
    }

    let cc = nmeans as f64;
    if df > DF_LARGE {
        return range_prob(q, cc);
    }

    let f2 = df * 0.5;
    let f21 = f2 - 1.0;
    let ff4 = df * 0.25;
    let ulen = if df <= 100.0 {
        1.0
    } else if df <= 800.0 {
        0.5
    } else if df <= 5000.0 {
        0.25
    } else {
        0.125
    };
    let f2lf = f2 * df.ln() - df * LN_2 - ln_gamma(f2) + f64::ln(ulen);

    let mut ans = 0.0;
    for i in 1..=50u32 {
        let mut interval_sum = 0.0;
        let twa1 = f64::from(2 * i - 1) * ulen;

        for jj in 1..=16usize {
            let (j, offset) = if jj > 8 {
                let j = jj - 9;
                (j, DF_NODES[j] * ulen)
            } else {
                let j = jj - 1;
                (j, -DF_NODES[j] * ulen)
            };
            let t1 = f2lf + f21 * (twa1 + offset).ln() - (offset + twa1) * ff4;

            if t1 >= EPS1 {
                let qsqz = q * ((twa1 + offset) * 0.5).sqrt();
                interval_sum += range_prob(qsqz, cc) * DF_WEIGHTS[j] * t1.exp();
            }
        }

        if f64::from(i) * ulen >= 1.0 && interval_sum <= EPS2 {
            break;
        }
        ans += interval_sum;
    }

    ans.min(1.0)
}

/// Quantile of the studentized range: q such that `ptukey(q) = p`
///
/// Returns NaN for `p` outside (0, 1) or invalid `nmeans`/`df`.
pub fn qtukey(p: f64, nmeans: usize, df: f64) -> f64 {
    if !(p > 0.0 && p < 1.0) || nmeans < 2 || df.is_nan() || df < 2.0 {
        return f64::NAN;
    }

    let mut lo = 0.0;
    let mut hi = 1.0;
    while ptukey(hi, nmeans, df) < p {
        hi *= 2.0;
        if hi > 1.0e3 {
            return f64::NAN;
        }
    }

    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        if ptukey(mid, nmeans, df) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1.0e-10 {
            break;
        }
    }

    0.5 * (lo + hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use statrs::distribution::{ContinuousCDF, StudentsT};

    #[test]
    fn test_qtukey_table_values() {
        // Standard studentized-range table, alpha = 0.05
        assert!((qtukey(0.95, 3, 12.0) - 3.772_929).abs() < 1e-4);
        assert!((qtukey(0.95, 4, 20.0) - 3.958_293).abs() < 1e-4);
    }

    #[test]
    fn test_qtukey_large_df_uses_normal_range() {
        assert!((qtukey(0.95, 3, 1.0e6) - 3.314_493).abs() < 1e-4);
    }

    #[test]
    fn test_two_groups_match_students_t() {
        // With two means, Q / sqrt(2) is |t|
        for &(q, df) in &[(2.0, 10.0), (3.0, 25.0), (4.5, 60.0)] {
            let t = StudentsT::new(0.0, 1.0, df).unwrap();
            let expected = 1.0 - 2.0 * t.sf(q / SQRT_2);
            assert!(
                (ptukey(q, 2, df) - expected).abs() < 1e-5,
                "q={} df={}",
                q,
                df
            );
        }
    }

    #[test]
    fn test_ptukey_is_monotone_and_bounded() {
        let mut last = 0.0;
        for i in 1..40 {
            let p = ptukey(f64::from(i) * 0.25, 3, 30.0);
            assert!(p >= last - 1e-12);
            assert!((0.0..=1.0).contains(&p));
            last = p;
        }
        assert!(last > 0.999);
    }

    #[test]
    fn test_ptukey_edge_cases() {
        assert_eq!(ptukey(0.0, 3, 10.0), 0.0);
        assert_eq!(ptukey(f64::INFINITY, 3, 10.0), 1.0);
        assert!(ptukey(2.0, 1, 10.0).is_nan());
        assert!(ptukey(2.0, 3, 1.0).is_nan());
        assert!(qtukey(1.5, 3, 10.0).is_nan());
    }

    #[test]
    fn test_quantile_inverts_cdf() {
        let q = qtukey(0.9, 5, 40.0);
        assert!((ptukey(q, 5, 40.0) - 0.9).abs() < 1e-8);
    }
}
