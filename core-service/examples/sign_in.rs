//! Interactive sign-in from a terminal.
//!
//! Opens the Crowdin authorization page in the default browser, then waits
//! for the redirect URI to be pasted on stdin (a desktop host would receive
//! it through its custom URL scheme instead) and lists the user's projects.
//!
//! Run with:
//! ```bash
//! CROWDIN_CLIENT_ID=... CROWDIN_CLIENT_SECRET=... cargo run -p core-service --example sign_in
//!
//! # JSON logs
//! cargo run -p core-service --example sign_in -- json
//! ```

use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_service::{ClientConfig, CrowdinClient, EventSeverity};
use std::env;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let format = match env::args().nth(1).as_deref() {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };
    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug),
    )?;

    let client = CrowdinClient::new(ClientConfig::builder_from_env().build()?).await?;
    let mut events = client.notifications(EventSeverity::Info);
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.severity() {
                EventSeverity::Warning | EventSeverity::Error => {
                    warn!(event = ?event, "{}", event.description())
                }
                _ => info!("{}", event.description()),
            }
        }
    });

    if !client.is_signed_in() {
        let outcome = client.begin_authentication().await?;
        println!("Paste the redirect URI from the browser and press Enter:");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let uri = line.trim();
            if client.is_oauth_callback(uri) && client.handle_oauth_callback(uri).await {
                break;
            }
            println!("Not a Crowdin callback, try again:");
        }

        if let Err(e) = outcome.await {
            error!(error = %e, "Sign-in failed");
            return Err(e.into());
        }
    }

    let user = client.get_user_info().await?;
    println!("Signed in as {} ({})", user.name, user.login);

    for project in client.get_user_projects().await? {
        println!("{:>8}  {}", project.id, project.name);
    }
    println!("{}", client.attribute_link("/profile"));

    client.shutdown().await;
    Ok(())
}
