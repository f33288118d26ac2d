//! SQLite connection pool factory and migration runner.

use anyhow::Context;
use bookshelf_kernel::{settings::DatabaseSettings, Migration};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub type Pool = SqlitePool;

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY (module, id)
    )
"#;

/// Open a connection pool for the configured database.
///
/// In-memory databases exist per connection, so they get exactly one
/// connection that is never recycled.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Pool> {
    let in_memory = settings.url.contains(":memory:");
    let options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(settings.max_connections)
    };

    let pool = options
        .connect(&settings.url)
        .await
        .with_context(|| format!("failed to connect to database '{}'", settings.url))?;

    tracing::info!(target: "bookshelf-db", url = %settings.url, in_memory, "database connected");
    Ok(pool)
}

/// Apply every migration not yet recorded in `_migrations`.
///
/// Each migration runs in its own transaction together with its bookkeeping
/// row. Returns the number of migrations applied.
pub async fn run_migrations(pool: &Pool, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
    sqlx::query(MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .context("failed to create migrations table")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let already: Option<String> =
            sqlx::query_scalar("SELECT id FROM _migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(pool)
                .await
                .with_context(|| format!("failed to check migration {}/{}", module, migration.id))?;
        if already.is_some() {
            tracing::debug!(target: "bookshelf-db", %module, id = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
        sqlx::query("INSERT INTO _migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(target: "bookshelf-db", %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}
