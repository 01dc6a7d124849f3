//! Binomial draws from PRF-derived uniforms.

/// Largest trial count handled by the exact inverse-CDF walk; beyond it
/// the normal approximation takes over.
const EXACT_LIMIT: u64 = 100;

/// Draw from `Binomial(count, p)`.
///
/// `u1` and `u2` must be independent uniforms in the open interval
/// `(0, 1)`; the exact regime consumes only `u1`, the approximate regime
/// consumes both. The draw MUST be parameterized by the node's own ball
/// count, never the root total, or the tree degenerates.
pub(crate) fn sample(count: u64, p: f64, u1: f64, u2: f64) -> u64 {
    if count == 0 || p <= 0.0 {
        return 0;
    }
    if p >= 1.0 {
        return count;
    }
    if count > EXACT_LIMIT {
        normal_approx(count, p, u1, u2)
    } else {
        inverse_cdf(count, p, u1)
    }
}

/// Exact inverse-CDF sampling via the PMF recurrence
/// `P(X = k+1) = P(X = k) * (count - k) / (k + 1) * p / (1 - p)`.
fn inverse_cdf(count: u64, p: f64, u: f64) -> u64 {
    let q = 1.0 - p;
    let mut prob = q.powi(count as i32);
    let mut cumulative = prob;
    if u <= cumulative {
        return 0;
    }

    for k in 0..count {
        prob = prob * (count - k) as f64 / (k + 1) as f64 * p / q;
        cumulative += prob;
        if u <= cumulative {
            return k + 1;
        }
    }
    count
}

/// Box-Muller normal approximation, rounded and clamped onto the support.
fn normal_approx(count: u64, p: f64, u1: f64, u2: f64) -> u64 {
    let mean = count as f64 * p;
    let sd = (count as f64 * p * (1.0 - p)).sqrt();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();

    (mean + z * sd).round().clamp(0.0, count as f64) as u64
}
