use super::{FunctionFamily, FunctionSpec, Market, Tariff, TariffKind};
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::{Level, event};

/// The two parameters of a curve, as they appear in a parameter file
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    /// Intercept (linear) or scale (log-linear)
    #[serde(rename = "const")]
    pub constant: f64,
    /// Slope (linear) or elasticity (log-linear)
    pub slope: f64,
}

/// A full parameterization of the model.
///
/// The field names on the wire follow the established parameter-file layout, e.g.
///
/// ```json
/// {
///     "SYSTEM": "linear",
///     "MONEY": "Euros",
///     "VOLUME": "Tons",
///     "TAR_type": "ad-valorem",
///     "TAR_val": 0.2,
///     "homedem_pars": {"const": 20, "slope": -15},
///     "homesup_pars": {"const": -1, "slope": 10},
///     "forsup_pars": {"const": -2, "slope": 15}
/// }
/// ```
///
/// Every key is required; a file missing any of them is rejected as a whole rather than
/// being merged with the defaults.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// The functional form of every curve
    #[serde(rename = "SYSTEM")]
    pub system: FunctionFamily,
    /// Label for the unit of money
    #[serde(rename = "MONEY")]
    pub money: String,
    /// Label for the unit of quantity
    #[serde(rename = "VOLUME")]
    pub volume: String,
    /// How the tariff is expressed
    #[serde(rename = "TAR_type")]
    pub tariff_kind: TariffKind,
    /// The tariff value
    #[serde(rename = "TAR_val")]
    pub tariff_value: f64,
    /// Home demand parameters
    #[serde(rename = "homedem_pars")]
    pub home_demand: Coefficients,
    /// Home supply parameters
    #[serde(rename = "homesup_pars")]
    pub home_supply: Coefficients,
    /// Foreign export supply parameters
    #[serde(rename = "forsup_pars")]
    pub foreign_supply: Coefficients,
}

impl Default for Params {
    /// A linear large-country market with a 20% ad-valorem tariff
    fn default() -> Self {
        Self {
            system: FunctionFamily::Linear,
            money: "Euros".to_owned(),
            volume: "Tons".to_owned(),
            tariff_kind: TariffKind::AdValorem,
            tariff_value: 0.2,
            home_demand: Coefficients {
                constant: 20.0,
                slope: -15.0,
            },
            home_supply: Coefficients {
                constant: -1.0,
                slope: 10.0,
            },
            foreign_supply: Coefficients {
                constant: -2.0,
                slope: 15.0,
            },
        }
    }
}

/// Where a set of parameters came from
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum ParamSource {
    /// The parameters were read successfully
    Input,
    /// The input was unusable and the defaults were substituted
    Defaults {
        /// Why the input was rejected
        reason: String,
    },
}

impl Params {
    /// Parse and validate parameters from a JSON string
    pub fn from_json(raw: &str) -> Result<Self, ParamError> {
        serde_json::from_str::<Self>(raw)?.validated()
    }

    /// Parse and validate parameters from a reader yielding JSON
    pub fn from_reader(reader: impl Read) -> Result<Self, ParamError> {
        serde_json::from_reader::<_, Self>(reader)?.validated()
    }

    /// Accept a parse result, substituting the defaults if it failed.
    ///
    /// The substitution is never silent: it is logged, and the returned [`ParamSource`]
    /// carries the reason.
    pub fn or_default(result: Result<Self, ParamError>) -> (Self, ParamSource) {
        match result {
            Ok(params) => (params, ParamSource::Input),
            Err(error) => {
                event!(
                    Level::WARN,
                    error = %error,
                    "unusable model parameters, reverting to defaults"
                );
                (
                    Self::default(),
                    ParamSource::Defaults {
                        reason: error.to_string(),
                    },
                )
            }
        }
    }

    /// Parse parameters from JSON, reverting to the defaults on any failure
    pub fn from_json_or_default(raw: &str) -> (Self, ParamSource) {
        Self::or_default(Self::from_json(raw))
    }

    /// Build the market described by these parameters
    pub fn market(&self) -> Market {
        let spec = |c: Coefficients| FunctionSpec {
            family: self.system,
            constant: c.constant,
            slope: c.slope,
        };
        Market {
            home_demand: spec(self.home_demand),
            home_supply: spec(self.home_supply),
            foreign_supply: spec(self.foreign_supply),
        }
    }

    /// Build the tariff described by these parameters
    pub fn tariff(&self) -> Tariff {
        Tariff::new(self.tariff_kind, self.tariff_value)
    }

    fn validated(self) -> Result<Self, ParamError> {
        let checks = [
            ("TAR_val", self.tariff_value),
            ("homedem_pars.const", self.home_demand.constant),
            ("homedem_pars.slope", self.home_demand.slope),
            ("homesup_pars.const", self.home_supply.constant),
            ("homesup_pars.slope", self.home_supply.slope),
            ("forsup_pars.const", self.foreign_supply.constant),
            ("forsup_pars.slope", self.foreign_supply.slope),
        ];
        for (field, value) in checks {
            if !value.is_finite() {
                return Err(ParamError::NonFinite(field));
            }
        }
        Ok(self)
    }
}

/// Errors that can occur when reading model parameters
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    /// The input could not be read
    #[error("unable to read parameters: {0}")]
    Io(#[from] std::io::Error),
    /// The input was not valid JSON, or lacked a required key
    #[error("invalid parameters: {0}")]
    Json(#[from] serde_json::Error),
    /// A numeric parameter was NaN or infinite
    #[error("parameter {0} must be finite")]
    NonFinite(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = r#"{
        "SYSTEM": "linlog",
        "MONEY": "Dollars",
        "VOLUME": "Barrels",
        "TAR_type": "Specific",
        "TAR_val": 0.5,
        "homedem_pars": {"const": 20, "slope": -0.5},
        "homesup_pars": {"const": 5, "slope": 0.5},
        "forsup_pars": {"const": 5, "slope": 1.0}
    }"#;

    #[test]
    fn test_deserialize_full_file() {
        let params = Params::from_json(RAW).unwrap();
        assert_eq!(params.system, FunctionFamily::LogLinear);
        assert_eq!(params.tariff(), Tariff::specific(0.5));

        let market = params.market();
        assert_eq!(market.home_demand, FunctionSpec::log_linear(20.0, -0.5));
        assert_eq!(market.foreign_supply, FunctionSpec::log_linear(5.0, 1.0));
    }

    #[test]
    fn missing_key_reverts_to_defaults() {
        let raw = r#"{"SYSTEM": "linear", "TAR_val": 0.3}"#;
        let (params, source) = Params::from_json_or_default(raw);
        assert_eq!(params, Params::default());
        match source {
            ParamSource::Defaults { reason } => assert!(reason.contains("missing field")),
            ParamSource::Input => panic!("expected a fallback"),
        }
    }

    #[test]
    fn unknown_system_reverts_to_defaults() {
        let raw = RAW.replace("linlog", "quadratic");
        let (params, source) = Params::from_json_or_default(&raw);
        assert_eq!(params, Params::default());
        assert!(matches!(source, ParamSource::Defaults { .. }));
    }

    #[test]
    fn valid_input_is_reported_as_such() {
        let (params, source) = Params::from_json_or_default(RAW);
        assert_eq!(source, ParamSource::Input);
        assert_eq!(params.money, "Dollars");
    }

    #[test]
    fn defaults_round_trip_through_the_file_layout() {
        let raw = serde_json::to_string(&Params::default()).unwrap();
        assert!(raw.contains("\"homedem_pars\""));
        assert!(raw.contains("\"TAR_type\":\"ad-valorem\""));
        assert_eq!(Params::from_json(&raw).unwrap(), Params::default());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let error = Params::validated(Params {
            tariff_value: f64::NAN,
            ..Params::default()
        })
        .unwrap_err();
        assert!(matches!(error, ParamError::NonFinite("TAR_val")));
    }

    #[cfg(feature = "schemars")]
    #[test]
    fn schema_uses_the_file_layout() {
        let schema = serde_json::to_string(&schemars::schema_for!(Params)).unwrap();
        assert!(schema.contains("homedem_pars"));
        assert!(schema.contains("TAR_type"));
    }
}
