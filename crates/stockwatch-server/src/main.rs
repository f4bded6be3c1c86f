mod cycle;
mod listener;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use stockwatch_core::NotificationSink;
use stockwatch_discord::{DiscordClient, DiscordSink};
use stockwatch_ledger::DedupLedger;
use stockwatch_scraper::{BrowserSession, ChromiumBrowser, ChromiumLaunchOptions};
use tracing_subscriber::EnvFilter;

use crate::{
    cycle::CycleContext,
    listener::{CommandHandler, CommandListener},
    scheduler::CycleScheduler,
};

/// How long shutdown waits for an in-flight cycle before closing the browser.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(stockwatch_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        target_url = %config.target_url,
        interval_secs = config.cycle_interval_secs,
        whitelist = config.location_whitelist.len(),
        favorites = config.favorite_item_ids.len(),
        debug = config.debug,
        "stockwatch: starting"
    );

    let client = Arc::new(DiscordClient::new(
        &config.discord_api_base,
        &config.discord_token,
        config.discord_max_retries,
        config.discord_backoff_base_ms,
    )?);
    let bot = client
        .current_user()
        .await
        .context("discord login failed; check DISCORD_TOKEN")?;
    tracing::info!(bot_id = %bot.id, username = %bot.username, "discord: connected");
    if !bot.bot {
        tracing::warn!(username = %bot.username, "discord: token does not belong to a bot account");
    }

    let browser = Arc::new(
        ChromiumBrowser::launch(&ChromiumLaunchOptions {
            executable: config.chrome_executable.clone(),
            headless: config.headless,
        })
        .await
        .context("browser launch failed")?,
    );

    let ledger = Arc::new(
        DedupLedger::open(config.ledger_path.clone())
            .await
            .context("ledger could not be opened")?,
    );
    let sink: Arc<dyn NotificationSink> = Arc::new(DiscordSink::new(
        Arc::clone(&client),
        config.discord_channel_id.clone(),
    ));

    let ctx = Arc::new(CycleContext::from_config(
        &config,
        Arc::clone(&browser) as Arc<dyn BrowserSession>,
        Arc::clone(&sink),
        Arc::clone(&ledger),
    )?);

    let listener = CommandListener::new(
        Arc::clone(&client),
        config.discord_channel_id.clone(),
        bot.id.clone(),
        CommandHandler::new(
            Arc::clone(&sink),
            ledger.path().to_path_buf(),
            cycle::debug_screenshot_path(&config),
        ),
        Duration::from_secs(config.command_poll_secs),
    );
    let listener_task = tokio::spawn(listener.run());

    let scheduler = CycleScheduler::new(Duration::from_secs(config.cycle_interval_secs));
    let guard = scheduler.guard();
    let cycle_ctx = Arc::clone(&ctx);

    tokio::select! {
        () = scheduler.run(move || logged_cycle(Arc::clone(&cycle_ctx))) => {},
        () = shutdown_signal() => {},
    }

    listener_task.abort();
    if guard.is_busy() {
        tracing::info!("shutdown: waiting for in-flight cycle");
    }
    if tokio::time::timeout(SHUTDOWN_GRACE, guard.wait_idle())
        .await
        .is_err()
    {
        tracing::warn!("shutdown: cycle still running after grace period");
    }

    drop(ctx);
    match Arc::try_unwrap(browser) {
        Ok(browser) => browser.shutdown().await,
        Err(_) => tracing::warn!("shutdown: browser still in use; leaving it to process exit"),
    }
    tracing::info!("stockwatch: stopped");
    Ok(())
}

async fn logged_cycle(ctx: Arc<CycleContext>) -> anyhow::Result<()> {
    let report = cycle::run_cycle(&ctx).await;
    tracing::info!(
        extracted = report.extracted,
        available = report.available,
        matched = report.matched,
        notified = report.notified,
        delivery_failures = report.delivery_failures,
        ledger_failures = report.ledger_failures,
        skipped_known = report.skipped_known,
        "cycle: done"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
