mod rows;
mod sqlite_queue;

pub use sqlite_queue::SqliteMutationQueue;
