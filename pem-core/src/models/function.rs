/// The value a log-linear curve takes at a non-positive price.
///
/// Returning a small positive number instead of failing keeps the curve defined on the whole
/// real line, which root-finders rely on when they search outside the economic domain.
pub const LOG_FLOOR: f64 = 1e-6;

/// The functional form shared by every curve in a market.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionFamily {
    /// `q = const + slope * p`
    #[serde(alias = "lin")]
    Linear,
    /// `q = const * p^slope`, i.e. a constant elasticity of `slope`
    #[serde(alias = "linlog", alias = "log_linear")]
    LogLinear,
}

impl std::fmt::Display for FunctionFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        (match self {
            Self::Linear => "linear",
            Self::LogLinear => "log-linear",
        })
        .fmt(f)
    }
}

/// A quantity-as-a-function-of-price curve: a family together with its two parameters.
///
/// Specs are immutable once built. Each side of the market (home demand, home supply and
/// foreign supply) owns its own copy.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionSpec {
    /// The functional form
    pub family: FunctionFamily,
    /// The intercept (linear) or scale (log-linear) parameter
    #[serde(rename = "const")]
    pub constant: f64,
    /// The slope (linear) or elasticity (log-linear) parameter
    pub slope: f64,
}

impl FunctionSpec {
    /// Create a linear curve `const + slope * p`
    pub fn linear(constant: f64, slope: f64) -> Self {
        Self {
            family: FunctionFamily::Linear,
            constant,
            slope,
        }
    }

    /// Create a constant-elasticity curve `const * p^slope`
    pub fn log_linear(constant: f64, slope: f64) -> Self {
        Self {
            family: FunctionFamily::LogLinear,
            constant,
            slope,
        }
    }

    /// Evaluate the quantity at the given price.
    ///
    /// Log-linear curves return [`LOG_FLOOR`] for non-positive prices.
    pub fn evaluate(&self, price: f64) -> f64 {
        match self.family {
            FunctionFamily::Linear => self.constant + self.slope * price,
            FunctionFamily::LogLinear => {
                if price > 0.0 {
                    self.constant * price.powf(self.slope)
                } else {
                    LOG_FLOOR
                }
            }
        }
    }
}
