use aingine_application::SwapOutcome;
use anyhow::{Result, bail};

use crate::context::AppContext;
use crate::render;

pub async fn run(ctx: &AppContext, model_id: &str) -> Result<()> {
    let session = ctx.session();
    session.refresh().await;

    let outcome = session.select_model(model_id).await;
    for message in session.messages() {
        render::print_message(&message);
    }

    match outcome {
        SwapOutcome::Loaded { .. } => Ok(()),
        SwapOutcome::Rejected(reason) => bail!("Swap not started: {:?}", reason),
        SwapOutcome::Failed(e) => bail!(e),
    }
}
