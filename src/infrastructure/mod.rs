pub mod cache;
pub mod connectivity;
pub mod database;
pub mod queue;
pub mod remote;
