use anyhow::Result;
use crossterm::style::Stylize;
use data_core::get::list_installed;

/// List datasets installed below the working directory
pub fn list() -> Result<()> {
    let ctx = super::context()?;
    let installed = list_installed(&ctx, &super::cwd()?)?;

    if installed.is_empty() {
        println!();
        println!("  No datasets installed.");
        println!("  Run 'data get <author>/<name>' to get started.");
        return Ok(());
    }

    let width = installed
        .iter()
        .map(|d| d.descriptor.dataset.len())
        .max()
        .unwrap_or(0);

    for d in &installed {
        println!(
            "  {}  {}",
            format!("{:<width$}", d.descriptor.dataset).cyan(),
            d.descriptor.tagline.as_str().dark_grey(),
        );
    }
    println!();
    println!(
        "{}",
        format!("  {} datasets", installed.len()).dark_grey()
    );
    Ok(())
}
