use crate::{Bracket, Domain, RootError, RootFinder, RootSettings, bracket};
use tracing::{Level, event};

/// Brent's method: bracket a sign change around the seed, then combine inverse quadratic
/// interpolation, secant steps and bisection.
///
/// Never leaves the bracket, so it cannot wander into regions where a curve is floored.
/// Slower than Newton on smooth problems but insensitive to the seed.
#[derive(Clone, Debug, Default)]
pub struct BrentSolver(RootSettings);

impl RootFinder for BrentSolver {
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
        if f0.abs() <= self.0.tolerance {
            return Ok(x0);
        }

        let Some(bracket) = bracket(&f, x0, f0, domain, self.0.max_expansions) else {
            return Err(RootError::NoBracket { x0 });
        };
        self.brent(&f, bracket)
    }
}

impl BrentSolver {
    /// The settings this solver was built with
    pub fn settings(&self) -> &RootSettings {
        &self.0
    }

    fn brent(&self, f: &impl Fn(f64) -> f64, bracket: Bracket) -> Result<f64, RootError> {
        let tolerance = self.0.tolerance;
        let scale = bracket.scale();
        let Bracket {
            lo: mut a,
            f_lo: mut fa,
            hi: mut b,
            f_hi: mut fb,
        } = bracket;

        // b is always the best estimate so far
        if fa.abs() < fb.abs() {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }
        let (mut c, mut fc) = (a, fa);
        let mut d = c;
        let mut bisected = true;

        for iteration in 0..self.0.max_iterations {
            if fb.abs() <= tolerance {
                event!(Level::TRACE, x = b, iteration, "brent converged");
                return Ok(b);
            }
            let step_tolerance = self.0.step_tolerance(b);
            if (b - a).abs() <= 2.0 * step_tolerance {
                if self.0.collapsed_on_root(fb, scale) {
                    event!(
                        Level::TRACE,
                        x = b,
                        iteration,
                        residual = fb.abs(),
                        "brent bracket converged"
                    );
                    return Ok(b);
                }
                // collapsed onto a jump
                break;
            }

            let mut s = if fa != fc && fb != fc {
                // inverse quadratic interpolation
                a * fb * fc / ((fa - fb) * (fa - fc))
                    + b * fa * fc / ((fb - fa) * (fb - fc))
                    + c * fa * fb / ((fc - fa) * (fc - fb))
            } else {
                // secant
                b - fb * (b - a) / (fb - fa)
            };

            let delta = step_tolerance;
            let quarter = (3.0 * a + b) / 4.0;
            let outside = !((s > quarter.min(b)) && (s < quarter.max(b)));
            let slow = if bisected {
                (s - b).abs() >= 0.5 * (b - c).abs() || (b - c).abs() < delta
            } else {
                (s - b).abs() >= 0.5 * (c - d).abs() || (c - d).abs() < delta
            };
            if outside || slow || !s.is_finite() {
                s = 0.5 * (a + b);
                bisected = true;
            } else {
                bisected = false;
            }
            // Steps below the tolerance cannot shrink the bracket
            if (s - b).abs() < step_tolerance {
                s = b + step_tolerance.copysign(a - b);
            }

            let fs = f(s);
            if !fs.is_finite() {
                return Err(RootError::NonFinite { x: s });
            }

            d = c;
            (c, fc) = (b, fb);
            if fa.signum() != fs.signum() {
                (b, fb) = (s, fs);
            } else {
                (a, fa) = (s, fs);
            }
            if fa.abs() < fb.abs() {
                std::mem::swap(&mut a, &mut b);
                std::mem::swap(&mut fa, &mut fb);
            }
        }

        if fb.abs() <= tolerance {
            return Ok(b);
        }
        Err(RootError::NoConvergence {
            iterations: self.0.max_iterations,
            residual: fb.abs(),
        })
    }
}
