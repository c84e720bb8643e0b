//! Bookshelf application library
//!
//! Wires the application modules into the kernel registry and runs the HTTP
//! server until shutdown.

pub mod modules;

use anyhow::Context;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Build a registry holding every application module.
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Run the service: init and start every module, serve HTTP until a shutdown
/// signal arrives, then stop modules in reverse order.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let registry = registry();
    let ctx = InitCtx {
        settings: &settings,
    };

    tracing::info!(
        env = ?settings.environment,
        modules = registry.module_count(),
        "bookshelf bootstrap starting"
    );

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings)
        .await
        .context("HTTP server exited with an error");

    registry.stop_modules().await?;
    served
}
