use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about = "Book record service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply migrations and serve HTTP (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Print every documented route with its HTTP methods
    Routes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = bookshelf_kernel::settings::Settings::load()
        .with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => bookshelf_app::app::serve(&settings).await,
        Command::Migrate => {
            let applied = bookshelf_app::app::migrate(&settings).await?;
            println!("applied {} migration(s)", applied);
            Ok(())
        }
        Command::Routes => {
            let (registry, pool) = bookshelf_app::app::build_registry(&settings).await?;
            let spec =
                bookshelf_http::router::merged_openapi(&registry, &settings.server.base_path);
            if let Some(paths) = spec["paths"].as_object() {
                for (path, item) in paths {
                    let methods: Vec<String> = item
                        .as_object()
                        .map(|ops| ops.keys().map(|m| m.to_uppercase()).collect())
                        .unwrap_or_default();
                    println!("{:<24} {}", path, methods.join(","));
                }
            }
            pool.close().await;
            Ok(())
        }
    }
}
