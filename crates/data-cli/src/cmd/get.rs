use anyhow::Result;
use data_core::get::get_all;

/// Install datasets, or the Datafile's dependencies when none are named
pub async fn get(datasets: &[String]) -> Result<()> {
    let ctx = super::context()?;
    let installed = get_all(&ctx, &super::cwd()?, datasets).await?;
    if installed.len() > 1 {
        ctx.reporter
            .info(&format!("Installed {} datasets.", installed.len()));
    }
    Ok(())
}
