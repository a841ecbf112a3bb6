use aingine_application::ChatOutcome;
use anyhow::{Result, bail};

use crate::context::AppContext;
use crate::render;

pub async fn run(ctx: &AppContext, prompt: &str) -> Result<()> {
    let session = ctx.session();
    session.refresh().await;

    let outcome = session.send(prompt).await;
    for message in session.messages().iter().filter(|m| !m.is_user()) {
        render::print_message(message);
    }

    match outcome {
        ChatOutcome::Replied { .. } => Ok(()),
        ChatOutcome::Rejected(reason) => bail!("Prompt not sent: {:?}", reason),
        ChatOutcome::Failed(e) => bail!(e),
    }
}
