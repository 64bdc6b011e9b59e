use anyhow::{Context, Result};
use ferric_irc::config::{self, AppConfig};
use ferric_irc::irc::commands::{self, HELP};
use ferric_irc::irc::handlers::RPL_WELCOME;
use ferric_irc::irc::Client;
use ferric_irc::logging;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    // Optional first argument: path to a config file
    let cfg = match std::env::args().nth(1) {
        Some(path) => config::load_config_from(&PathBuf::from(path))?,
        None => config::load_config()?,
    };
    logging::init_tracing(&cfg.logging.level)?;

    let client = cfg.client_builder().build();
    install_handlers(&client, &cfg);

    // Terminal input task
    let input_client = client.clone();
    let channels = cfg.server.channels.clone();
    let quit_message = cfg.server.quit_message.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Err(e) = handle_input(&input_client, &channels, &quit_message, &line).await {
                eprintln!("error: {}", e);
            }
        }
    });

    // Ctrl-C sends QUIT and lets the session wind down
    let signal_client = client.clone();
    let quit_message = cfg.server.quit_message.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_client.quit(&quit_message).await;
        }
    });

    tracing::info!(addr = %cfg.server.addr, nick = %cfg.server.nickname, "connecting");
    client
        .connect()
        .await
        .with_context(|| format!("session with {} failed", cfg.server.addr))?;
    Ok(())
}

fn install_handlers(client: &Client, cfg: &AppConfig) {
    let channels = Arc::new(cfg.server.channels.clone());
    client.handle(RPL_WELCOME, move |client, _msg| {
        let channels = Arc::clone(&channels);
        async move {
            for channel in channels.iter() {
                if let Err(e) = client.join(channel).await {
                    tracing::warn!(channel = %channel, error = %e, "join failed");
                }
            }
        }
    });

    for event in ["PRIVMSG", "NOTICE"] {
        client.handle(event, |_client, msg| async move {
            let Some(text) = msg.trailing() else {
                return;
            };
            let target = msg.param(0).unwrap_or("*");
            let from = if msg.name.is_empty() { &msg.host } else { &msg.name };
            println!("[{}] <{}> {}", target, from, text);
        });
    }
}

async fn handle_input(
    client: &Client,
    channels: &[String],
    quit_message: &str,
    line: &str,
) -> Result<()> {
    let line = line.trim_end();
    if line.is_empty() {
        return Ok(());
    }
    if line.starts_with('/') {
        match commands::parse_command(line) {
            Some(cmd) => commands::execute(client, cmd, quit_message).await?,
            None => println!("{}", HELP),
        }
        return Ok(());
    }
    match channels.first() {
        Some(channel) => client.privmsg(channel, line).await?,
        None => println!("no default channel; use /msg <target> <text>"),
    }
    Ok(())
}
