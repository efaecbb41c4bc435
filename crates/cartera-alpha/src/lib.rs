//! Risk-scaled alpha from raw signals.
//!
//! A raw signal is first standardized across assets on each date (z-score,
//! sample std), then multiplied by each asset's specific risk. The result is
//! the alpha the optimizer maximizes exposure to.
//!
//! # Examples
//!
//! ```rust,ignore
//! use cartera_alpha::Standardizer;
//!
//! let risk = panel.risk_table("date", "barrid")?;
//! let alpha = Standardizer::default().standardize(&signal_frame, &risk);
//! for (date, rows) in alpha.by_date() {
//!     println!("{date}: {} usable assets", rows.iter().filter(|r| r.alpha.is_some()).count());
//! }
//! ```

mod frame;
mod standardize;

// Re-export main types
pub use frame::{AlphaFrame, AlphaValue};
pub use standardize::{Standardizer, cross_sectional_zscore};
