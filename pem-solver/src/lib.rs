/**
 * These are implementations of the scalar root-finder.
 */
mod impls;
pub use impls::*;

/**
 * Numerical building blocks: settings, bracketing, quadrature, inversion and elasticities.
 */
mod numeric;
pub use numeric::*;

mod equilibrium;
pub use equilibrium::*;

mod welfare;
pub use welfare::*;

mod scan;
pub use scan::*;

mod error;
pub use error::*;

/// The RootFinder trait defines the interface for scalar root-finders.
///
/// Every equilibrium in the model reduces to a single nonlinear equation in one unknown,
/// a price, so one scalar solver drives the whole engine: market clearing, autarky, and the
/// numeric inverse of supply and demand curves.
///
/// Implementations may trade robustness for speed differently, but all of them must either
/// return a point that meets their convergence criterion or report that they failed.
pub trait RootFinder {
    /// The configuration type for this solver
    type Settings;

    /// Create a new instance with the provided settings
    fn new(settings: Self::Settings) -> Self;

    /// Find `x` in `domain` with `f(x) ≈ 0`, starting the search from `x0`
    ///
    /// # Parameters
    /// * `f` - The function whose root is sought
    /// * `x0` - The seed; must lie inside `domain`
    /// * `domain` - The admissible region for the root
    ///
    /// # Returns
    /// * `Ok(x)` with `|f(x)|`, or the step towards the root, within the solver's tolerance
    /// * `Err(RootError)` if no such point was found within the iteration budget
    fn find_root<F: Fn(f64) -> f64>(
        &self,
        f: F,
        x0: f64,
        domain: Domain,
    ) -> Result<f64, RootError>;
}
