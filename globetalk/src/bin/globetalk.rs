use std::io::Write;

use globetalk::{RuntimeConfig, UserId, build_runtime, new_session_id, user_turn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let runtime = build_runtime(RuntimeConfig::from_env()?)?;
    let session_id = new_session_id("cli");
    let user_id = std::env::var("USER")
        .map(UserId::from)
        .unwrap_or_default();
    tracing::info!(session_id = %session_id, user_id = %user_id, "starting conversation");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match runtime
            .chat
            .run_turn(user_turn(session_id.clone(), user_id.clone(), line))
            .await
        {
            Ok(turn) => {
                println!("{}", turn.reply);
                if turn.is_finished() {
                    break;
                }
            }
            Err(error) => tracing::warn!(error = %error, "turn failed"),
        }
    }

    Ok(())
}
