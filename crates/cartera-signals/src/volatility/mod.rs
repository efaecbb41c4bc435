//! Volatility signals.
//!
//! - Idiosyncratic volatility: rolling sample std of daily returns
//! - Idiosyncratic risk: rolling mean of the risk model's specific risk
//!
//! Both are typically run with `direction = -1` (long low-volatility names).

mod idio_risk;
mod idio_vol;

pub use idio_risk::IdioRisk;
pub use idio_vol::IdioVol;
