use std::sync::Arc;

use bestbuy_core::{BestBuyService, CatalogRepository, ScanOptions};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BestBuyService>,
    /// Window and result limit used when a request does not override them
    pub scan_defaults: ScanOptions,
}

impl AppState {
    pub fn new(service: BestBuyService, scan_defaults: ScanOptions) -> Self {
        Self {
            service: Arc::new(service),
            scan_defaults,
        }
    }

    pub fn repo(&self) -> &Arc<dyn CatalogRepository> {
        self.service.repository()
    }
}
