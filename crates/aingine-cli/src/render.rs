//! Terminal rendering of log entries and status.

use aingine_application::SessionSnapshot;
use aingine_core::gateway::{ResponseSource, SystemStatus};
use aingine_core::model::ModelCatalog;
use aingine_core::session::{Message, MessageKind, MessageRole};
use colored::Colorize;

pub fn print_message(message: &Message) {
    match (message.role, message.kind) {
        (MessageRole::User, _) => println!("{}", format!("> {}", message.content).green()),
        (MessageRole::Assistant, MessageKind::Notice) => {
            println!("{}", message.content.bright_yellow())
        }
        (MessageRole::Assistant, MessageKind::Error) => println!("{}", message.content.red()),
        (MessageRole::Assistant, MessageKind::Chat) => {
            for line in message.content.lines() {
                println!("{}", line.bright_blue());
            }
            if let Some(source) = message.source {
                println!("{}", source_label(source));
            }
        }
    }
}

pub fn source_label(source: ResponseSource) -> String {
    match source {
        ResponseSource::Cache => "[cache]".bright_green().to_string(),
        ResponseSource::Gpu => "[gpu]".bright_black().to_string(),
    }
}

pub fn print_status(snapshot: &SessionSnapshot, catalog: &ModelCatalog) {
    let status = match snapshot.system_status {
        SystemStatus::Online => "online".bright_green(),
        SystemStatus::Offline => "offline".red(),
    };
    let model = snapshot
        .current_model_id
        .as_deref()
        .map(|id| catalog.display_name(id).to_string())
        .unwrap_or_else(|| "none".to_string());
    let gpu = if snapshot.gpu_locked {
        "locked".yellow()
    } else {
        "free".normal()
    };
    println!("Gateway: {}  Model: {}  GPU: {}", status, model.bold(), gpu);
}

pub fn print_catalog(catalog: &ModelCatalog, active: Option<&str>) {
    for model in catalog.models() {
        let marker = if active == Some(model.id.as_str()) {
            "*".bright_green().to_string()
        } else {
            " ".to_string()
        };
        let weights = model.quantization.as_deref().unwrap_or("full precision");
        println!(
            "{} {:<12} {} ({}, {})",
            marker,
            model.id.bold(),
            model.name,
            weights,
            model.vram_estimate
        );
        println!("  {:<12} {}", "", model.description.bright_black());
    }
}

/// Shortens a credential for display.
pub fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    match count {
        0 => "(none)".to_string(),
        1..=4 => "*".repeat(count),
        _ => {
            let prefix: String = key.chars().take(4).collect();
            format!("{}{}", prefix, "*".repeat(count.min(12) - 4))
        }
    }
}
