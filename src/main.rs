use std::sync::Arc;

use anyhow::Context;

use brief_assist::bot::BotRunner;
use brief_assist::catalog::load_catalog;
use brief_assist::channels::{Channel, OperatorChat, TelegramChannel};
use brief_assist::config::BotConfig;
use brief_assist::conversation::{ConversationEngine, ConversationService};
use brief_assist::dispatch::{Dispatcher, ZohoLeadSink};
use brief_assist::routes::health_routes;
use brief_assist::session::InMemorySessionStore;
use brief_assist::summary::OperatorLayout;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().context("loading configuration")?;

    let catalog = Arc::new(
        load_catalog(&config.catalog_path, &config.catalog_name)
            .await
            .with_context(|| format!("loading catalog from {}", config.catalog_path.display()))?,
    );

    eprintln!("🐾 Brief Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Catalog: {} ({} questions)",
        catalog.title(),
        catalog.len()
    );
    eprintln!(
        "   Telegram: allowed {}",
        if config.allows_everyone() {
            "everyone".to_string()
        } else {
            config.allowed_users.join(", ")
        }
    );

    // ── Health server ───────────────────────────────────────────────────
    let app = health_routes(catalog.title());
    let port = config.http_port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .with_context(|| format!("binding health server port {port}"))?;
    eprintln!("   Health: http://0.0.0.0:{port}/health");
    tokio::spawn(async move {
        tracing::info!(port, "Health server started");
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Health server stopped: {e}");
        }
    });

    // ── Telegram ────────────────────────────────────────────────────────
    let Some(bot_token) = config.bot_token.clone() else {
        tracing::warn!("TELEGRAM_BOT_TOKEN is not set; serving health endpoints only");
        tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
        return Ok(());
    };

    let telegram = Arc::new(TelegramChannel::new(bot_token, config.allowed_users.clone()));
    if let Err(e) = telegram.health_check().await {
        tracing::warn!("Telegram health check failed: {e}");
    }

    // ── Dispatch ────────────────────────────────────────────────────────
    let mut dispatcher = Dispatcher::new(OperatorLayout::for_catalog(&catalog))
        .with_timeout(config.dispatch.timeout);

    match &config.dispatch.operator_chat_id {
        Some(chat_id) => {
            eprintln!("   Operator chat: {chat_id}");
            dispatcher =
                dispatcher.with_notifier(Arc::new(OperatorChat::new(telegram.clone(), chat_id)));
        }
        None => eprintln!("   Operator chat: not set (ADMIN_CHAT_ID), briefs are only logged"),
    }

    match &config.dispatch.crm {
        Some(crm) => {
            eprintln!("   CRM: {} ({})", crm.api_base, crm.module);
            dispatcher = dispatcher.with_lead_sink(Arc::new(ZohoLeadSink::new(crm.clone())));
        }
        None => eprintln!("   CRM: disabled"),
    }

    // ── Conversation ────────────────────────────────────────────────────
    let service = Arc::new(ConversationService::new(
        ConversationEngine::new(catalog),
        InMemorySessionStore::new(),
        Arc::new(dispatcher),
    ));

    let runner = BotRunner::new(telegram, service);
    runner.run().await?;

    Ok(())
}
