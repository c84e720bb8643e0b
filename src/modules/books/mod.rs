//! Book catalog module: CRUD, lookups, and per-category statistics.

pub mod dto;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod seed;
pub mod service;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Module};

use repository::{BookRepository, TableBookRepository};
use service::BookService;

pub struct BooksModule {
    repository: Arc<dyn BookRepository>,
    service: Arc<BookService>,
}

impl BooksModule {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        let service = Arc::new(BookService::new(repository.clone()));
        Self {
            repository,
            service,
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(routes::openapi_document())
    }

    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if ctx.settings.database.seed_sample_data {
            let inserted = seed::seed_sample_catalog(self.repository.as_ref())
                .await
                .context("failed to load sample books")?;
            tracing::debug!(module = self.name(), inserted, "sample data pass finished");
        }
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module over a fresh in-memory store.
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new(Arc::new(TableBookRepository::new())))
}
