//! CLI subcommand modules.
//!
//! This module contains the implementations for all cartera CLI subcommands.

pub(crate) mod constraints;
pub(crate) mod run;
pub(crate) mod signals;
pub(crate) mod validate;
