//! Category listing command.

use console::style;

use crate::models::POPULAR_CATEGORIES;

/// Print the popular category slugs.
pub fn cmd_categories() -> anyhow::Result<()> {
    println!("{}", style("Popular categories:").bold());
    for slug in POPULAR_CATEGORIES {
        println!("  {} {}", style("•").cyan(), slug);
    }
    Ok(())
}
