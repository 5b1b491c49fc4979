//! Length-Framed Chat Client - Entry Point
//!
//! Reads `bindname <name>` and `chat <text>` lines from stdin and prints
//! every chat line the room broadcasts.

use std::env;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use frame_chat::client::format_room_info;
use frame_chat::{parse_command, ChatClient, ClientConfig, MAX_BODY_LENGTH};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("frame_chat=warn")),
        )
        .init();

    let config = ClientConfig::from_args(env::args().skip(1))?;
    let client = ChatClient::connect(config.addr(), |info| {
        println!("{}", format_room_info(&info));
    })
    .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(msg) = parse_command(&line) else {
            warn!("Unrecognised input; use 'bindname <name>' or 'chat <text>'");
            continue;
        };
        if msg.body_length() > MAX_BODY_LENGTH as usize {
            warn!(
                "Message body is {} bytes; the server accepts at most {}",
                msg.body_length(),
                MAX_BODY_LENGTH
            );
        }
        debug!("Sending {} byte frame", msg.length());
        client.write(msg)?;
    }

    client.close().await?;
    Ok(())
}
