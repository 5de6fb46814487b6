use crate::RootFinder;

mod quad;
pub use quad::{IntegrationError, Quadrature};

/// The seed used when numerically inverting a curve
pub const INVERSE_SEED: f64 = 1e-6;

// Relative step for the elasticity finite difference
const ELASTICITY_STEP: f64 = 0.001;

/// The region a root is searched in.
///
/// Prices in the model are positive; restricting the search keeps solvers away from the flat
/// floor a log-linear curve takes at non-positive prices, where the excess-demand function
/// can vanish identically.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    /// The whole real line
    Real,
    /// The open half-line `x > 0`
    Positive,
}

impl Domain {
    /// Whether `x` is an admissible point of the domain
    pub fn contains(&self, x: f64) -> bool {
        match self {
            Self::Real => x.is_finite(),
            Self::Positive => x.is_finite() && x > 0.0,
        }
    }
}

/// Settings shared by the root-finder implementations
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootSettings {
    /// A point is accepted as a root when `|f(x)|` is at most this
    pub tolerance: f64,
    /// Relative step tolerance: an iterate is also accepted once the step towards the root,
    /// or the width of the bracket holding it, falls below `x_tolerance * |x|`.
    ///
    /// This keeps convergence independent of the scale of `f`, whose rounding error alone
    /// can exceed `tolerance` when quantities are large.
    pub x_tolerance: f64,
    /// The iteration budget of the main iteration (and of any refinement stage)
    pub max_iterations: usize,
    /// How many times the search interval may double while looking for a sign change
    pub max_expansions: usize,
}

impl Default for RootSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            x_tolerance: 1e-12,
            max_iterations: 100,
            max_expansions: 60,
        }
    }
}

impl RootSettings {
    /// The absolute step tolerance around `x`
    pub fn step_tolerance(&self, x: f64) -> f64 {
        self.x_tolerance * x.abs().max(f64::MIN_POSITIVE)
    }

    /// Whether a bracket that has collapsed onto `x` holds a root rather than a jump.
    ///
    /// The residual is judged against `scale`, the size of the function values at the ends of
    /// the original bracket: a continuous function leaves only rounding error, a jump leaves
    /// a residual comparable to the function itself.
    pub(crate) fn collapsed_on_root(&self, fx: f64, scale: f64) -> bool {
        fx.abs() <= self.tolerance * scale.max(1.0)
    }
}

/// Errors that can occur when searching for a root
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RootError {
    /// The seed is not an admissible point
    #[error("seed {x0} lies outside the search domain")]
    OutsideDomain {
        /// The seed
        x0: f64,
    },
    /// The function returned NaN or an infinity
    #[error("function is not finite at {x}")]
    NonFinite {
        /// Where the function was evaluated
        x: f64,
    },
    /// No sign change was found around the seed
    #[error("no sign change found around {x0}")]
    NoBracket {
        /// The seed
        x0: f64,
    },
    /// The iteration budget ran out before the residual was small enough
    #[error("no convergence after {iterations} iterations (residual {residual:e})")]
    NoConvergence {
        /// Iterations performed
        iterations: usize,
        /// The smallest residual seen
        residual: f64,
    },
}

/// Numerically invert `f`: find `x` with `f(x) = target`.
///
/// The search starts at [`INVERSE_SEED`] and covers the whole real line.
pub fn invert<R: RootFinder>(
    solver: &R,
    f: impl Fn(f64) -> f64,
    target: f64,
) -> Result<f64, RootError> {
    invert_within(solver, f, target, Domain::Real)
}

/// Like [`invert`], restricted to the given domain
pub fn invert_within<R: RootFinder>(
    solver: &R,
    f: impl Fn(f64) -> f64,
    target: f64,
    domain: Domain,
) -> Result<f64, RootError> {
    solver.find_root(|x| target - f(x), INVERSE_SEED, domain)
}

/// The point elasticity `(df/f) / (dx/x)` of `f` at `x`, by central differences with a
/// relative step of 0.1%.
pub fn elasticity(f: impl Fn(f64) -> f64, x: f64) -> f64 {
    let below = f(x * (1.0 - ELASTICITY_STEP));
    let above = f(x * (1.0 + ELASTICITY_STEP));
    (above - below) / (2.0 * ELASTICITY_STEP) / f(x)
}

/// Central finite-difference derivative, with the step shrunk to stay inside `domain`
pub(crate) fn derivative(f: &impl Fn(f64) -> f64, x: f64, domain: Domain) -> f64 {
    let mut h = 1e-7 * x.abs().max(1.0);
    if domain == Domain::Positive {
        h = h.min(0.5 * x);
    }
    (f(x + h) - f(x - h)) / (2.0 * h)
}

/// A bracket `[lo, hi]` over which `f` changes sign, with the function values at its ends
#[derive(Clone, Copy, Debug)]
pub(crate) struct Bracket {
    pub lo: f64,
    pub f_lo: f64,
    pub hi: f64,
    pub f_hi: f64,
}

impl Bracket {
    /// The size of the function values at the ends of the bracket
    pub fn scale(&self) -> f64 {
        self.f_lo.abs().max(self.f_hi.abs())
    }
}

/// Search outwards from `x0` for a sign change of `f`.
///
/// The search interval doubles on each expansion. Above the seed it grows additively; below
/// the seed it grows additively on the real line, and geometrically towards zero on the
/// positive half-line. Points where `f` is not finite are skipped.
pub(crate) fn bracket(
    f: &impl Fn(f64) -> f64,
    x0: f64,
    f0: f64,
    domain: Domain,
    max_expansions: usize,
) -> Option<Bracket> {
    let mut step = 0.1 * x0.abs().max(1.0);
    let (mut above, mut f_above) = (x0, f0);
    let (mut below, mut f_below) = (x0, f0);

    for k in 0..max_expansions {
        let hi = x0 + step;
        let f_hi = f(hi);
        if f_hi.is_finite() {
            if f_hi.signum() != f0.signum() || f_hi == 0.0 {
                return Some(Bracket {
                    lo: above,
                    f_lo: f_above,
                    hi,
                    f_hi,
                });
            }
            (above, f_above) = (hi, f_hi);
        }

        let lo = match domain {
            Domain::Real => x0 - step,
            Domain::Positive => x0 * 0.5f64.powi(k as i32 + 1),
        };
        let f_lo = f(lo);
        if f_lo.is_finite() {
            if f_lo.signum() != f0.signum() || f_lo == 0.0 {
                return Some(Bracket {
                    lo,
                    f_lo,
                    hi: below,
                    f_hi: f_below,
                });
            }
            (below, f_below) = (lo, f_lo);
        }

        step *= 2.0;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newton::NewtonSolver;
    use approx::assert_abs_diff_eq;
    use pem_core::models::FunctionSpec;

    #[test]
    fn bracket_finds_sign_change_above() {
        let f = |x: f64| x - 3.0;
        let b = bracket(&f, 0.0, f(0.0), Domain::Real, 60).unwrap();
        assert!(b.lo <= 3.0 && 3.0 <= b.hi);
        assert!(b.f_lo * b.f_hi <= 0.0);
    }

    #[test]
    fn bracket_stays_positive() {
        let f = |x: f64| x - 1e-4;
        let b = bracket(&f, 1.0, f(1.0), Domain::Positive, 60).unwrap();
        assert!(b.lo > 0.0);
        assert!(b.lo <= 1e-4 && 1e-4 <= b.hi);
    }

    #[test]
    fn bracket_gives_up_without_sign_change() {
        let f = |x: f64| x * x + 1.0;
        assert!(bracket(&f, 0.5, f(0.5), Domain::Real, 10).is_none());
    }

    #[test]
    fn linear_elasticity_matches_closed_form() {
        let demand = FunctionSpec::linear(20.0, -15.0);
        // slope * p / q = -15 * 0.5 / 12.5
        let el = elasticity(|p| demand.evaluate(p), 0.5);
        assert_abs_diff_eq!(el, -0.6, epsilon = 1e-9);
    }

    #[test]
    fn log_linear_elasticity_is_its_slope() {
        let supply = FunctionSpec::log_linear(5.0, 0.75);
        let el = elasticity(|p| supply.evaluate(p), 2.0);
        assert_abs_diff_eq!(el, 0.75, epsilon = 1e-6);
    }

    #[test]
    fn invert_recovers_log_linear_price() {
        let supply = FunctionSpec::log_linear(5.0, 1.0);
        let solver = NewtonSolver::default();
        let p = invert(&solver, |p| supply.evaluate(p), 8.0).unwrap();
        assert_abs_diff_eq!(p, 1.6, epsilon = 1e-9);
    }

    #[test]
    fn domain_membership() {
        assert!(Domain::Real.contains(-1.0));
        assert!(!Domain::Real.contains(f64::NAN));
        assert!(Domain::Positive.contains(1e-300));
        assert!(!Domain::Positive.contains(0.0));
    }
}
