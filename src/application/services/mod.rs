mod data_service;
mod hybrid_store;

pub use data_service::DataService;
pub use hybrid_store::HybridStore;
