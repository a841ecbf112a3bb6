use anyhow::Result;

use crate::context::AppContext;
use crate::render;

pub async fn run(ctx: &AppContext) -> Result<()> {
    let session = ctx.session();
    let snapshot = session.refresh().await;
    println!("Endpoint: {}", ctx.config().base_url());
    render::print_status(&snapshot, ctx.catalog());
    Ok(())
}

/// Lists the catalog, marking the model the gateway reports as active.
pub async fn models(ctx: &AppContext) -> Result<()> {
    let session = ctx.session();
    let snapshot = session.refresh().await;
    render::print_catalog(ctx.catalog(), snapshot.current_model_id.as_deref());
    Ok(())
}
