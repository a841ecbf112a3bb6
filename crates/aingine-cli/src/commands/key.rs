use anyhow::{Context, Result};
use colored::Colorize;

use crate::context::AppContext;
use crate::render::mask_key;

pub async fn set(ctx: &AppContext, value: &str) -> Result<()> {
    ctx.credentials()
        .set_override(value)
        .await
        .context("Failed to store API key")?;
    println!("{}", "API key saved.".bright_green());
    Ok(())
}

pub async fn clear(ctx: &AppContext) -> Result<()> {
    ctx.credentials()
        .clear_override()
        .await
        .context("Failed to clear API key")?;
    println!("{}", "API key cleared; the default key will be used.".bright_green());
    Ok(())
}

pub async fn show(ctx: &AppContext) -> Result<()> {
    let credentials = ctx.credentials();
    let origin = if credentials.has_override().await {
        "stored override"
    } else {
        "default"
    };
    println!("{} ({})", mask_key(&credentials.resolve().await), origin);
    Ok(())
}
