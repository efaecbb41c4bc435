//! Signal registry.
//!
//! The closed set of signal types a configuration may name, each bound to a
//! static [`WindowedSignal`] implementation, plus discovery metadata. Lookup is
//! an exhaustive match; unknown identifiers are a configuration error.

use std::fmt;
use std::str::FromStr;

use cartera_traits::{CarteraError, WindowedSignal};
use serde::{Deserialize, Serialize};

use crate::liquidity::{Cost, PriceImpact};
use crate::reversal::ShortTermReversal;
use crate::volatility::{IdioRisk, IdioVol};

/// Signal category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalCategory {
    /// Realized or forecast idiosyncratic volatility
    Volatility,
    /// Liquidity and trading cost
    Liquidity,
    /// Short-horizon mean reversion
    Reversal,
}

impl SignalCategory {
    /// Get a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &str {
        match self {
            Self::Volatility => "Idiosyncratic volatility and specific risk signals",
            Self::Liquidity => "Price impact and trading cost signals",
            Self::Reversal => "Short-horizon mean reversion signals",
        }
    }
}

/// A registered signal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    /// Rolling std of returns.
    IdioVol,
    /// Rolling mean of specific risk.
    IdioRisk,
    /// Rolling mean of absolute return per dollar volume.
    PriceImpact,
    /// Relative spread over return volatility.
    Cost,
    /// Rolling cumulative log return.
    ShortTermReversal,
}

impl SignalType {
    /// Every registered signal type.
    pub const ALL: [Self; 5] = [
        Self::IdioVol,
        Self::IdioRisk,
        Self::PriceImpact,
        Self::Cost,
        Self::ShortTermReversal,
    ];

    /// Canonical identifier.
    pub const fn id(self) -> &'static str {
        match self {
            Self::IdioVol => "idio_vol",
            Self::IdioRisk => "idio_risk",
            Self::PriceImpact => "price_impact",
            Self::Cost => "cost",
            Self::ShortTermReversal => "short_term_reversal",
        }
    }

    /// The transform implementing this signal type.
    pub fn signal(self) -> &'static dyn WindowedSignal {
        match self {
            Self::IdioVol => &IdioVol,
            Self::IdioRisk => &IdioRisk,
            Self::PriceImpact => &PriceImpact,
            Self::Cost => &Cost,
            Self::ShortTermReversal => &ShortTermReversal,
        }
    }

    /// Discovery metadata.
    pub const fn info(self) -> SignalInfo {
        match self {
            Self::IdioVol => SignalInfo {
                name: "idio_vol",
                aliases: &[],
                category: SignalCategory::Volatility,
                description: "Rolling sample std of daily returns",
                typical_window: 252,
            },
            Self::IdioRisk => SignalInfo {
                name: "idio_risk",
                aliases: &[],
                category: SignalCategory::Volatility,
                description: "Rolling mean of risk-model specific risk",
                typical_window: 252,
            },
            Self::PriceImpact => SignalInfo {
                name: "price_impact",
                aliases: &[],
                category: SignalCategory::Liquidity,
                description: "Rolling mean of |return| per dollar traded",
                typical_window: 22,
            },
            Self::Cost => SignalInfo {
                name: "cost",
                aliases: &[],
                category: SignalCategory::Liquidity,
                description: "Rolling relative spread over 44-day return volatility",
                typical_window: 22,
            },
            Self::ShortTermReversal => SignalInfo {
                name: "short_term_reversal",
                aliases: &["str"],
                category: SignalCategory::Reversal,
                description: "Cumulative log return over the window",
                typical_window: 22,
            },
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SignalType {
    type Err = CarteraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| {
                let info = t.info();
                info.name == s || info.aliases.contains(&s)
            })
            .ok_or_else(|| CarteraError::UnknownSignal(s.to_string()))
    }
}

/// Metadata about a signal.
#[derive(Debug, Clone, Serialize)]
pub struct SignalInfo {
    /// Unique identifier for the signal
    pub name: &'static str,

    /// Alternative identifiers accepted in configuration
    pub aliases: &'static [&'static str],

    /// Category classification
    pub category: SignalCategory,

    /// Human-readable description
    pub description: &'static str,

    /// Typical window length in trading days
    pub typical_window: usize,
}

/// Get information about all available signals.
#[must_use]
pub fn available_signals() -> Vec<SignalInfo> {
    SignalType::ALL.into_iter().map(SignalType::info).collect()
}

/// Get all signals in a specific category.
#[must_use]
pub fn signals_by_category(category: &SignalCategory) -> Vec<SignalInfo> {
    available_signals()
        .into_iter()
        .filter(|info| &info.category == category)
        .collect()
}
