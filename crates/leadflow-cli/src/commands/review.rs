use anyhow::{Context, Result};
use colored::Colorize;
use leadflow_core::session::Sender;

use crate::app::App;

/// Prints every stored session, most recent activity first.
pub async fn sessions(app: &App) -> Result<()> {
    let summaries = app.review.sessions().await?;
    if summaries.is_empty() {
        println!("{}", "No sessions yet.".bright_black());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{:<38} {:<7} {:>4}  {:<6} {:<24} {}",
            "SESSION", "STATUS", "STEP", "PURPOSE", "NAME", "LAST ACTIVITY"
        )
        .bold()
    );
    for summary in summaries {
        println!(
            "{:<38} {:<7} {:>4}  {:<6} {:<24} {}",
            summary.session_id,
            summary.status.to_string(),
            summary.step,
            summary.purpose.as_deref().unwrap_or("-"),
            summary.name.as_deref().unwrap_or("-"),
            summary.last_activity_at,
        );
    }
    Ok(())
}

/// Prints the committed transcript of one session in sequence order.
pub async fn transcript(app: &App, session_id: &str) -> Result<()> {
    let messages = app
        .review
        .transcript(session_id)
        .await
        .with_context(|| format!("cannot load transcript of session {}", session_id))?;

    for message in messages {
        let text = if message.options.is_empty() {
            message.text.clone()
        } else {
            format!("[{}]", message.options.join(" | "))
        };
        let line = format!("{:>4} {} {}", message.sequence, message.created_at, text);
        match message.sender {
            Sender::User => println!("{}", line.green()),
            Sender::Bot => println!("{}", line.bright_blue()),
        }
    }
    Ok(())
}

pub async fn health(app: &App) -> Result<()> {
    let status = app.review.health().await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
