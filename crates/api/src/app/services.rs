//! Service wiring: picks the product store and wraps it in the catalog facade.

use std::sync::Arc;

use anyhow::Context;

use catalog_infra::{CatalogService, InMemoryProductStore, ProductStore, SqliteProductStore};

use crate::config::ApiConfig;

/// Store handle shared by every request.
pub type SharedStore = Arc<dyn ProductStore>;

/// Catalog facade handed to handlers through an `Extension`.
pub type AppServices = Arc<CatalogService<SharedStore>>;

pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let store: SharedStore = match config.database_url.as_deref() {
        Some(url) => {
            let store = SqliteProductStore::connect(url)
                .await
                .with_context(|| format!("failed to open product database at {url}"))?;
            tracing::info!("using sqlite product store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory product store");
            Arc::new(InMemoryProductStore::new())
        }
    };

    Ok(Arc::new(CatalogService::new(store)))
}

