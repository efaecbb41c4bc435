//! Reversal signals based on recent price moves.

mod short_term;

pub use short_term::ShortTermReversal;
