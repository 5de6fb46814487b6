use std::fmt;

// Prices closer to zero than this are treated as zero when converting a specific tariff.
const ZERO_PRICE: f64 = 1e-8;

/// The two ways of expressing a tariff
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TariffKind {
    /// A fixed amount of money per unit of quantity
    #[serde(alias = "Specific")]
    Specific,
    /// A fraction of the (tariff-inclusive) price
    #[serde(alias = "Ave", alias = "ad_valorem")]
    AdValorem,
}

impl TariffKind {
    /// A human-readable description of the unit the tariff value is expressed in
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Specific => "money per quantity, e.g. $/ton",
            Self::AdValorem => "money per value, e.g. x%/100",
        }
    }
}

impl fmt::Display for TariffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (match self {
            Self::Specific => "specific tariff",
            Self::AdValorem => "ad-valorem",
        })
        .fmt(f)
    }
}

/// An import tariff.
///
/// The value is mutable: a tariff scan creates one instance and walks its value
/// upwards in place. A unit label may be attached; without one the kind's default
/// description is used.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Tariff {
    /// A specific tariff, in money per unit
    Specific {
        /// The amount levied per unit
        value: f64,
        /// The unit label, e.g. `EUR/ton`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    /// An ad-valorem tariff, as a fraction of price
    AdValorem {
        /// The fraction of the price levied
        value: f64,
        /// The unit label
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
}

impl Tariff {
    /// Create a tariff of the given kind
    pub fn new(kind: TariffKind, value: f64) -> Self {
        match kind {
            TariffKind::Specific => Self::specific(value),
            TariffKind::AdValorem => Self::ad_valorem(value),
        }
    }

    /// A specific tariff with the default unit
    pub fn specific(value: f64) -> Self {
        Self::Specific { value, unit: None }
    }

    /// An ad-valorem tariff with the default unit
    pub fn ad_valorem(value: f64) -> Self {
        Self::AdValorem { value, unit: None }
    }

    /// Attach a unit label
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.set_unit(unit);
        self
    }

    /// The kind of this tariff
    pub fn kind(&self) -> TariffKind {
        match self {
            Self::Specific { .. } => TariffKind::Specific,
            Self::AdValorem { .. } => TariffKind::AdValorem,
        }
    }

    /// The tariff value, in the units given by [`Tariff::unit`]
    pub fn value(&self) -> f64 {
        match self {
            Self::Specific { value, .. } | Self::AdValorem { value, .. } => *value,
        }
    }

    /// Mutable access to the tariff value
    pub fn value_mut(&mut self) -> &mut f64 {
        match self {
            Self::Specific { value, .. } | Self::AdValorem { value, .. } => value,
        }
    }

    /// Overwrite the tariff value, keeping its kind
    pub fn set_value(&mut self, value: f64) {
        *self.value_mut() = value;
    }

    /// The unit the value is expressed in: the attached label, or the kind's default
    pub fn unit(&self) -> &str {
        match self {
            Self::Specific { unit, .. } | Self::AdValorem { unit, .. } => {
                unit.as_deref().unwrap_or_else(|| self.kind().unit())
            }
        }
    }

    /// Replace the unit label, keeping kind and value
    pub fn set_unit(&mut self, label: impl Into<String>) {
        match self {
            Self::Specific { unit, .. } | Self::AdValorem { unit, .. } => {
                *unit = Some(label.into())
            }
        }
    }

    /// The ad-valorem equivalent of this tariff at the given tariff-inclusive price.
    ///
    /// For a specific tariff this is `value / price`, which is NaN at a zero price.
    pub fn ad_valorem_equivalent(&self, price: f64) -> f64 {
        match self {
            Self::AdValorem { value, .. } => *value,
            Self::Specific { value, .. } => {
                if price.abs() <= ZERO_PRICE {
                    f64::NAN
                } else {
                    value / price
                }
            }
        }
    }

    /// A one-line description of the tariff
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Tariff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}. Value: {}", self.kind(), self.unit(), self.value())
    }
}
