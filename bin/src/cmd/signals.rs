//! Signal listing command implementation.

use anyhow::Result;
use cartera::signals::{SignalCategory, signals_by_category};

/// List registered signal types, optionally filtered by category.
pub(crate) fn list_signals(category: Option<&str>, verbose: bool) -> Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Available Signals                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let categories = [
        (SignalCategory::Volatility, "Volatility"),
        (SignalCategory::Liquidity, "Liquidity"),
        (SignalCategory::Reversal, "Reversal"),
    ];

    for (cat, cat_name) in categories {
        if let Some(filter) = category
            && !cat_name.to_lowercase().contains(&filter.to_lowercase())
        {
            continue;
        }

        let cat_signals = signals_by_category(&cat);
        if cat_signals.is_empty() {
            continue;
        }

        println!("{}:", cat_name);
        if verbose {
            println!("  {}", cat.description());
        }
        println!("{}", "-".repeat(60));

        for info in cat_signals {
            if verbose {
                println!(
                    "  {:22} - {} (typical window: {} rows)",
                    info.name, info.description, info.typical_window
                );
            } else {
                println!("  {}", info.name);
            }
            if !info.aliases.is_empty() {
                println!("  {:22}   aliases: {}", "", info.aliases.join(", "));
            }
        }
        println!();
    }

    if !verbose {
        println!("Use --verbose for detailed signal descriptions.\n");
    }

    Ok(())
}
