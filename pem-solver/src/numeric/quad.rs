/// Adaptive Simpson quadrature.
///
/// Welfare changes are areas under supply and demand curves between two prices. The bounds
/// are not assumed to be ordered: integrating from `b` down to `a` yields the negated area,
/// which is what the surplus formulas require when a tariff lowers rather than raises a price.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quadrature {
    /// Target absolute error over the whole interval
    pub tolerance: f64,
    /// Maximum number of bisections of any sub-interval
    pub max_depth: u32,
}

impl Default for Quadrature {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_depth: 40,
        }
    }
}

/// Errors that can occur during integration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrationError {
    /// The integrand returned NaN or an infinity
    #[error("integrand is not finite at {x}")]
    NonFinite {
        /// Where the integrand was evaluated
        x: f64,
    },
}

// A Simpson panel over [a, b] with midpoint m and its estimate of the integral
#[derive(Clone, Copy)]
struct Panel {
    a: f64,
    fa: f64,
    m: f64,
    fm: f64,
    b: f64,
    fb: f64,
    estimate: f64,
}

impl Quadrature {
    /// Integrate `f` from `a` to `b`
    pub fn integrate(
        &self,
        f: impl Fn(f64) -> f64,
        a: f64,
        b: f64,
    ) -> Result<f64, IntegrationError> {
        if a == b {
            return Ok(0.0);
        }
        let fa = eval(&f, a)?;
        let fb = eval(&f, b)?;
        let whole = panel(&f, a, fa, b, fb)?;
        self.refine(&f, whole, self.tolerance, self.max_depth)
    }

    fn refine(
        &self,
        f: &impl Fn(f64) -> f64,
        whole: Panel,
        tolerance: f64,
        depth: u32,
    ) -> Result<f64, IntegrationError> {
        let left = panel(f, whole.a, whole.fa, whole.m, whole.fm)?;
        let right = panel(f, whole.m, whole.fm, whole.b, whole.fb)?;
        let delta = left.estimate + right.estimate - whole.estimate;

        // Richardson extrapolation: the halved estimate is 16x more accurate
        if depth == 0 || delta.abs() <= 15.0 * tolerance {
            return Ok(left.estimate + right.estimate + delta / 15.0);
        }

        Ok(self.refine(f, left, 0.5 * tolerance, depth - 1)?
            + self.refine(f, right, 0.5 * tolerance, depth - 1)?)
    }
}

fn eval(f: &impl Fn(f64) -> f64, x: f64) -> Result<f64, IntegrationError> {
    let y = f(x);
    if y.is_finite() {
        Ok(y)
    } else {
        Err(IntegrationError::NonFinite { x })
    }
}

fn panel(
    f: &impl Fn(f64) -> f64,
    a: f64,
    fa: f64,
    b: f64,
    fb: f64,
) -> Result<Panel, IntegrationError> {
    let m = 0.5 * (a + b);
    let fm = eval(f, m)?;
    Ok(Panel {
        a,
        fa,
        m,
        fm,
        b,
        fb,
        estimate: (b - a) / 6.0 * (fa + 4.0 * fm + fb),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn integrates_polynomials_exactly() {
        let quad = Quadrature::default();
        let area = quad.integrate(|x| 3.0 * x * x - 2.0 * x + 1.0, 0.0, 2.0).unwrap();
        assert_abs_diff_eq!(area, 8.0 - 4.0 + 2.0, epsilon = 1e-12);
    }

    #[test]
    fn reversed_bounds_flip_the_sign() {
        let quad = Quadrature::default();
        let f = |x: f64| 20.0 - 15.0 * x;
        let forward = quad.integrate(f, 0.5, 0.6).unwrap();
        let backward = quad.integrate(f, 0.6, 0.5).unwrap();
        assert_abs_diff_eq!(forward, -backward, epsilon = 1e-14);
        assert_abs_diff_eq!(forward, 2.0 - 7.5 * (0.36 - 0.25), epsilon = 1e-12);
    }

    #[test]
    fn handles_non_polynomial_integrands() {
        let quad = Quadrature::default();
        // d/dx (40 sqrt(x)) = 20 / sqrt(x)
        let area = quad.integrate(|x| 20.0 * x.powf(-0.5), 1.0, 4.0).unwrap();
        assert_abs_diff_eq!(area, 40.0, epsilon = 1e-8);
    }

    #[test]
    fn empty_interval_is_zero() {
        let quad = Quadrature::default();
        assert_eq!(quad.integrate(|_| f64::NAN, 1.0, 1.0).unwrap(), 0.0);
    }

    #[test]
    fn non_finite_integrand_is_reported() {
        let quad = Quadrature::default();
        let err = quad.integrate(|x| 1.0 / x, -1.0, 1.0).unwrap_err();
        assert_eq!(err, IntegrationError::NonFinite { x: 0.0 });
    }
}
