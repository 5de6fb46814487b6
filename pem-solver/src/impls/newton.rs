use crate::{Bracket, Domain, RootError, RootFinder, RootSettings, bracket, derivative};
use tracing::{Level, event};

// Smallest fraction of a Newton step tried before the iteration is abandoned
const MIN_DAMPING: f64 = 1e-6;

/// A damped Newton iteration with a bisection fallback.
///
/// Each iteration takes the Newton step computed from a central finite-difference derivative,
/// halving it until it stays inside the domain and strictly reduces `|f|`. If the iteration
/// stalls (flat derivative, no acceptable step, or budget exhausted), the solver looks for a
/// sign change around the seed and bisects it.
///
/// A point is a root when its residual is within the tolerance, or when the Newton step
/// from it is below the relative step tolerance.
#[derive(Clone, Debug, Default)]
pub struct NewtonSolver(RootSettings);

impl RootFinder for NewtonSolver {
    type Settings = RootSettings;

    fn new(settings: Self::Settings) -> Self {
        Self(settings)
    }

    fn find_root<F: Fn(f64) -> f64>(
        &self,
        f: F,
        x0: f64,
        domain: Domain,
    ) -> Result<f64, RootError> {
        if !domain.contains(x0) {
            return Err(RootError::OutsideDomain { x0 });
        }
        let f0 = f(x0);
        if !f0.is_finite() {
            return Err(RootError::NonFinite { x: x0 });
        }

        let residual = match self.newton(&f, x0, f0, domain) {
            Ok(x) => return Ok(x),
            Err(residual) => residual,
        };

        event!(
            Level::DEBUG,
            x0,
            residual,
            "newton iteration stalled, falling back to bisection"
        );

        let Some(bracket) = bracket(&f, x0, f0, domain, self.0.max_expansions) else {
            return Err(RootError::NoBracket { x0 });
        };
        self.bisect(&f, bracket)
    }
}

impl NewtonSolver {
    /// The settings this solver was built with
    pub fn settings(&self) -> &RootSettings {
        &self.0
    }

    // On failure, reports the smallest residual reached
    fn newton(
        &self,
        f: &impl Fn(f64) -> f64,
        x0: f64,
        f0: f64,
        domain: Domain,
    ) -> Result<f64, f64> {
        let RootSettings {
            tolerance,
            max_iterations,
            ..
        } = self.0;

        let (mut x, mut fx) = (x0, f0);
        for iteration in 0..max_iterations {
            if fx.abs() <= tolerance {
                event!(Level::TRACE, x, iteration, "newton converged");
                return Ok(x);
            }

            let slope = derivative(f, x, domain);
            if !slope.is_finite() || slope == 0.0 {
                return Err(fx.abs());
            }
            let step = fx / slope;
            if step.abs() <= self.0.step_tolerance(x) {
                event!(
                    Level::TRACE,
                    x,
                    iteration,
                    residual = fx.abs(),
                    "newton step converged"
                );
                return Ok(x);
            }

            // Backtrack until the step is admissible and improving
            let mut damping = 1.0;
            loop {
                let candidate = x - damping * step;
                if domain.contains(candidate) {
                    let f_candidate = f(candidate);
                    if f_candidate.is_finite() && f_candidate.abs() < fx.abs() {
                        (x, fx) = (candidate, f_candidate);
                        break;
                    }
                }
                damping *= 0.5;
                if damping < MIN_DAMPING {
                    return Err(fx.abs());
                }
            }
        }

        if fx.abs() <= tolerance { Ok(x) } else { Err(fx.abs()) }
    }

    fn bisect(&self, f: &impl Fn(f64) -> f64, bracket: Bracket) -> Result<f64, RootError> {
        let scale = bracket.scale();
        let Bracket {
            mut lo,
            mut f_lo,
            mut hi,
            f_hi,
        } = bracket;

        // Either end may already be a root
        if f_lo.abs() <= self.0.tolerance {
            return Ok(lo);
        }
        if f_hi.abs() <= self.0.tolerance {
            return Ok(hi);
        }

        // Enough halvings to reach f64 resolution even on a wide bracket
        let budget = self.0.max_iterations.max(2 * f64::MANTISSA_DIGITS as usize);
        let mut best = f64::INFINITY;
        for _ in 0..budget {
            let mid = 0.5 * (lo + hi);
            let f_mid = f(mid);
            if !f_mid.is_finite() {
                return Err(RootError::NonFinite { x: mid });
            }
            best = best.min(f_mid.abs());
            if f_mid.abs() <= self.0.tolerance {
                return Ok(mid);
            }
            if hi - lo <= 2.0 * self.0.step_tolerance(mid) {
                if self.0.collapsed_on_root(f_mid, scale) {
                    return Ok(mid);
                }
                break;
            }
            if mid == lo || mid == hi {
                break;
            }
            if f_mid.signum() == f_lo.signum() {
                (lo, f_lo) = (mid, f_mid);
            } else {
                hi = mid;
            }
        }

        Err(RootError::NoConvergence {
            iterations: budget,
            residual: best,
        })
    }
}
