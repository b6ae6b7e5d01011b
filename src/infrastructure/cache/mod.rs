mod rows;
mod sqlite_cache;

pub use sqlite_cache::SqliteEntityCache;
