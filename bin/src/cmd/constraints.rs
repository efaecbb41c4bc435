//! Constraint listing command implementation.

use cartera::{Constraint, optimizer::BOUND_TOLERANCE, optimizer::EQUALITY_TOLERANCE};

/// List the constraint tags accepted in `[backtest].constraints`.
pub(crate) fn list_constraints() {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Constraint Tags                           ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    for tag in Constraint::TAGS {
        match tag.parse::<Constraint>() {
            Ok(constraint) => println!("  {:18} - {}", tag, constraint.description()),
            Err(e) => println!("  {:18} - {}", tag, e),
        }
    }
    println!("  {:18}   alias of NoLeverage", "NoBuyingOnMargin");
    println!();
    println!("Per-asset bounds are set with `weight_bounds = [lower, upper]`.");
    println!(
        "Tolerances: {EQUALITY_TOLERANCE:e} for equalities and leverage, {BOUND_TOLERANCE:e} for bounds.\n"
    );
}
