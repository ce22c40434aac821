//! One-dimensional linear interpolation on tabulated data.

/// Linear interpolation of `(xp, fp)` at `x`.
///
/// `xp` must be strictly increasing. Returns `None` outside `[xp[0], xp[n-1]]`
/// and for empty or mismatched tables. An `x` equal to a tabulated abscissa
/// returns the tabulated ordinate exactly.
pub fn interp_linear(x: f64, xp: &[f64], fp: &[f64]) -> Option<f64> {
    if xp.is_empty() || xp.len() != fp.len() || !x.is_finite() {
        return None;
    }
    let last = xp.len() - 1;
    if x < xp[0] || x > xp[last] {
        return None;
    }

    // Bisection for the bracketing interval xp[lo] <= x <= xp[hi].
    let mut lo = 0;
    let mut hi = last;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if xp[mid] <= x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    if x == xp[lo] {
        return Some(fp[lo]);
    }
    if x == xp[hi] {
        return Some(fp[hi]);
    }
    let t = (x - xp[lo]) / (xp[hi] - xp[lo]);
    Some(fp[lo] + t * (fp[hi] - fp[lo]))
}

/// `n` evenly spaced samples over `[start, end]`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n)
            .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}
