//! Process bootstrap: database, modules, and the HTTP server.

use std::sync::Arc;

use anyhow::Context;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{self, books::repository::SqliteBookRepository};

/// Connect to the database and build the registry with every module wired to it
pub async fn build_registry(settings: &Settings) -> anyhow::Result<(ModuleRegistry, bookshelf_db::Pool)> {
    let pool = bookshelf_db::connect(&settings.database)
        .await
        .context("failed to open database")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, Arc::new(SqliteBookRepository::new(pool.clone())))?;

    Ok((registry, pool))
}

/// Apply pending migrations from every registered module
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let (registry, pool) = build_registry(settings).await?;
    let applied = bookshelf_db::run_migrations(&pool, &registry.collect_migrations()).await?;
    tracing::info!(applied, "migrations complete");
    pool.close().await;
    Ok(applied)
}

/// Run migrations, start all modules and serve HTTP until Ctrl-C
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "bookshelf bootstrap starting"
    );

    let (registry, pool) = build_registry(settings).await?;
    bookshelf_db::run_migrations(&pool, &registry.collect_migrations())
        .await
        .context("failed to run migrations")?;

    let ctx = InitCtx { settings };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;
    tracing::info!("bookshelf bootstrap complete");

    let served = bookshelf_http::start_server(&registry, settings, shutdown_signal()).await;

    registry.stop_modules().await?;
    pool.close().await;
    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
