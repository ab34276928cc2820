pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod memory_repo;
pub mod seed;

pub use catalog_repo::PgCatalogRepository;
pub use database::DbClient;
pub use memory_repo::InMemoryCatalogRepository;
pub use seed::{SeedData, SeedError};
