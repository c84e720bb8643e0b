use anyhow::Context;
use bookshelf_app::modules::books::models::BookCategory;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Command-line entrypoint for the bookshelf service.
#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
        /// Start with an empty catalog
        #[arg(long)]
        no_seed: bool,
    },
    /// Print the resolved settings as JSON
    Settings,
    /// List the book category labels
    Categories,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port, no_seed } => {
            let mut settings = load_settings()?;
            if let Some(port) = port {
                settings.server.port = port;
            }
            if no_seed {
                settings.database.seed_sample_data = false;
            }
            bookshelf_telemetry::init(&settings.telemetry)?;
            tracing::debug!(
                address = %settings.bind_address(),
                seed = settings.database.seed_sample_data,
                "serve settings resolved"
            );
            bookshelf_app::run(settings).await
        }
        Command::Settings => {
            let settings = load_settings()?;
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{}", rendered);
            Ok(())
        }
        Command::Categories => {
            for category in BookCategory::ALL {
                println!("{}", category);
            }
            Ok(())
        }
    }
}

fn load_settings() -> anyhow::Result<Settings> {
    Settings::load().context("failed to load bookshelf settings")
}
