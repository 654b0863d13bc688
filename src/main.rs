use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use convoke::config::Config;
use convoke::context::AppContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let config = Config::from_env();
    info!(
        target: "convoke",
        "convoke starting: RUST_LOG='{}', identity_url='{}', store_url='{}', collection='{}', data_dir='{}'",
        rust_log,
        config.identity_url,
        config.store_url.as_deref().unwrap_or("<in-memory>"),
        config.events_collection,
        config.data_dir.display()
    );

    let ctx = AppContext::from_config(config)?;

    // Mirror the UI signal surfaces on the console so a smoke run is
    // observable end to end.
    let _loading = ctx.signal.observe(|on| {
        if *on {
            eprintln!("... working ...");
        }
    });
    let _toasts = ctx.notifier.observe(|n| {
        if let Some(n) = n {
            eprintln!("[{:?}] {}", n.kind, n.text);
        }
    });
    let _nav = ctx.lifecycle.observe_nav(|target| {
        if let Some(t) = target {
            info!(target: "convoke", "navigation requested: {t:?}");
        }
    });

    ctx.lifecycle.bootstrap();
    match ctx.sessions.current() {
        Some(session) => info!(target: "convoke", "restored session for {}", session.email),
        None => info!(target: "convoke", "no persisted session"),
    }

    // Optional smoke sign-in from the environment.
    if let (Ok(email), Ok(password)) = (std::env::var("CONVOKE_EMAIL"), std::env::var("CONVOKE_PASSWORD")) {
        match ctx.lifecycle.sign_in(&email, &password).await {
            Ok(session) => info!(target: "convoke", "signed in as {}", session.email),
            Err(e) => {
                eprintln!("sign-in failed: {e}");
                return Ok(());
            }
        }
    }

    if ctx.sessions.is_authenticated() {
        let events = ctx.events.list_mine().await?;
        let now = chrono::Utc::now();
        let (upcoming, past) = convoke::events::partition_upcoming(events, now);
        println!("upcoming events: {}", upcoming.len());
        for e in &upcoming {
            println!("  {} {} — {} @ {}", e.short_date(), e.time, e.title, e.location);
        }
        println!("past events: {}", past.len());
        for e in &past {
            println!("  {} {} — {} @ {}", e.short_date(), e.time, e.title, e.location);
        }
    }

    Ok(())
}
