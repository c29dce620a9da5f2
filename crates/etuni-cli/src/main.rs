//! Etuni CLI - a command-line client for the Etuni campus events API.
//!
//! Signs in, keeps the session token between runs, and issues authenticated
//! requests the same way the mobile app does.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use etuni_core::api::ApiClient;
use etuni_core::models::{CheckIn, UserUpdate};
use etuni_core::utils::elapsed_display;
use etuni_core::{Config, RequestOptions, SessionEvent, TokenStore};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "\
Usage: etuni <command> [args]

Commands:
  login [email]                 Sign in (prompts for the password)
  logout                        Sign out on the server and locally
  status                        Show the current session
  get <path>                    GET an API path with the session token
  universities                  List universities
  events <university id|mine>   List a university's events, or your own
  join <event id>               Sign up for an event
  scan <event id> <qr payload>  Check in a ticket for an event
  code <ticket code>            Check in by ticket code
  admin stats                   Show dashboard statistics
  admin users [query]           Search users by name
  admin update <id> <full name> <email> <role> [university id]
                                Update a user";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; when `ETUNI_LOG_DIR` is set they are also written to
/// `etuni.log` in that directory. The returned guard must outlive logging.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var("ETUNI_LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::never(dir, "etuni.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let mut config = Config::load().context("Failed to load config")?;
    let storage = config.open_storage()?;
    let tokens = Arc::new(TokenStore::new(storage));
    let mut events = tokens.subscribe();
    let api = ApiClient::new(config.api_url(), Arc::clone(&tokens))
        .context("Failed to create API client")?;
    info!(api_url = api.base_url(), "Etuni CLI starting");

    let result = run(&api, &mut config, command, &args[1..]).await;

    report_session_events(&mut events);
    // Durable writes are detached; make sure they land before exiting
    tokens.flush().await;
    result
}

async fn run(api: &ApiClient, config: &mut Config, command: &str, args: &[String]) -> Result<()> {
    match command {
        "login" => login(api, config, args.first().map(String::as_str)).await,
        "logout" => {
            api.logout_from_server().await;
            println!("Signed out.");
            Ok(())
        }
        "status" => status(api).await,
        "get" => {
            let path = args.first().context("Usage: etuni get <path>")?;
            get(api, path).await
        }
        "universities" => {
            for university in api.fetch_universities().await? {
                println!("{:>4}  {}", university.id, university.name);
            }
            Ok(())
        }
        "events" => events(api, args.first().map(String::as_str)).await,
        "join" => {
            let id = args.first().context("Usage: etuni join <event id>")?;
            let id: i64 = id.parse().context("Event id must be a number")?;
            println!("{}", api.join_event(id).await?);
            Ok(())
        }
        "scan" => {
            let [event_id, payload, ..] = args else {
                bail!("Usage: etuni scan <event id> <qr payload>");
            };
            let event_id: i64 = event_id.parse().context("Event id must be a number")?;
            report_check_in(api.scan_ticket(payload, Some(event_id)).await?)
        }
        "code" => {
            let code = args.first().context("Usage: etuni code <ticket code>")?;
            report_check_in(api.validate_ticket_code(code).await?)
        }
        "admin" => admin(api, args).await,
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}

async fn login(api: &ApiClient, config: &mut Config, email: Option<&str>) -> Result<()> {
    let email = match email {
        Some(email) => email.to_string(),
        None => prompt_email(config.last_email.as_deref())?,
    };
    if email.is_empty() {
        bail!("Email is required");
    }
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    if password.trim().is_empty() {
        bail!("Password is required");
    }

    let user = api.login(&email, &password).await?;
    println!(
        "Signed in as {}{}",
        user.full_name.as_deref().unwrap_or(&email),
        user.role
            .as_deref()
            .map(|role| format!(" ({})", role))
            .unwrap_or_default()
    );

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
    Ok(())
}

fn prompt_email(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    Ok(match (input.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    })
}

async fn status(api: &ApiClient) -> Result<()> {
    println!("API: {}", api.base_url());
    if !api.tokens().has_session().await {
        println!("Not signed in.");
        return Ok(());
    }

    let profile = api.tokens().profile().await?;
    println!("Signed in.");
    if let Some(role) = profile.role {
        println!("Role: {}", role);
    }
    if let Some(university_id) = profile.university_id {
        println!("University: {}", university_id);
    }
    if let Some(signed_in_at) = profile.signed_in_at {
        println!(
            "Since: {} ({} ago)",
            signed_in_at.format("%Y-%m-%d %H:%M UTC"),
            elapsed_display(signed_in_at, Utc::now())
        );
    }
    Ok(())
}

async fn get(api: &ApiClient, path: &str) -> Result<()> {
    let response = api.auth_fetch(path, RequestOptions::get()).await?;
    println!("HTTP {}", response.status());

    let text = response.text();
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    if !response.is_success() {
        bail!(
            "Request failed: {}",
            response.error_message().unwrap_or_else(|| response.status().to_string())
        );
    }
    Ok(())
}

async fn events(api: &ApiClient, which: Option<&str>) -> Result<()> {
    let events = match which {
        Some("mine") => api.fetch_my_events().await?,
        Some(id) => {
            let university_id: i64 = id.parse().context("University id must be a number")?;
            api.fetch_events(university_id).await?
        }
        None => bail!("Usage: etuni events <university id|mine>"),
    };
    if events.is_empty() {
        println!("No events found.");
    }
    for event in events {
        match event.price.filter(|_| !event.is_free()) {
            Some(price) => println!("{} ({:.2} TL)", event.display_line(), price),
            None => println!("{}", event.display_line()),
        }
    }
    Ok(())
}

fn report_check_in(check_in: CheckIn) -> Result<()> {
    match check_in {
        CheckIn::Admitted(check) => {
            println!(
                "Admitted: {}{}",
                check.user_full_name.as_deref().unwrap_or("attendee"),
                check
                    .event_title
                    .map(|title| format!(" - {}", title))
                    .unwrap_or_default()
            );
            Ok(())
        }
        CheckIn::WrongEvent(check) => bail!(
            "This ticket belongs to another event{}",
            check
                .event_title
                .map(|title| format!(" ({})", title))
                .unwrap_or_default()
        ),
        CheckIn::Refused { reason } => bail!("Check-in refused: {}", reason),
    }
}

async fn admin(api: &ApiClient, args: &[String]) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("stats") => {
            let stats = api.fetch_dashboard_stats().await?;
            println!("Users:        {}", stats.total_users);
            println!("Events:       {}", stats.total_events);
            println!("Universities: {}", stats.active_universities);
        }
        Some("users") => {
            let query = args[1..].join(" ");
            let users = api.search_users(&query).await?;
            if users.is_empty() {
                println!("No users found.");
            }
            for user in users {
                println!("{}", user.display_line());
            }
        }
        Some("update") => {
            let [id, full_name, email, role, rest @ ..] = &args[1..] else {
                bail!("Usage: etuni admin update <id> <full name> <email> <role> [university id]");
            };
            let id: i64 = id.parse().context("User id must be a number")?;
            let university_id = rest
                .first()
                .map(|id| id.parse::<i64>())
                .transpose()
                .context("University id must be a number")?;
            let update = UserUpdate {
                full_name: full_name.clone(),
                email: email.clone(),
                role: role.to_uppercase(),
                university_id,
            };
            println!("{}", api.update_user(id, &update).await?);
        }
        _ => bail!("Usage: etuni admin <stats|users|update> ..."),
    }
    Ok(())
}

/// Tell the user when the backend ended their session during this run
fn report_session_events(events: &mut broadcast::Receiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        if event.is_rejection() {
            eprintln!("Session expired. Please log in again.");
            break;
        }
    }
}
