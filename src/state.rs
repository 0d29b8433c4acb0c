use crate::config::AppConfig;
use crate::db::Database;
use crate::domain::query::CatalogIndex;
use crate::whatsapp::WhatsAppClient;
use std::sync::Arc;

/// Everything a request handler needs. Cloned into each worker; clones are cheap.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub catalog: Arc<CatalogIndex>,
    pub config: Arc<AppConfig>,
    pub whatsapp: Option<Arc<WhatsAppClient>>,
}

impl AppState {
    pub fn new(db: Database, catalog: CatalogIndex, config: AppConfig) -> Self {
        let whatsapp = WhatsAppClient::from_config(&config.whatsapp).map(Arc::new);
        Self {
            db,
            catalog: Arc::new(catalog),
            config: Arc::new(config),
            whatsapp,
        }
    }
}
