pub mod entity_cache;
pub mod mutation_queue;
pub mod remote_backend;

pub use entity_cache::EntityCache;
pub use mutation_queue::{MutationApplier, MutationQueue};
pub use remote_backend::RemoteBackend;
