//! Liquidity and trading-cost signals.
//!
//! - Price impact: Amihud-style absolute return per dollar traded
//! - Cost: relative bid/ask spread scaled by recent return volatility

mod cost;
mod price_impact;

pub use cost::{COST_VOL_WINDOW, Cost};
pub use price_impact::PriceImpact;
