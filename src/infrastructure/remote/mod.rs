mod error;
mod rest_backend;
pub mod wire;

pub use error::RemoteError;
pub use rest_backend::RestRemoteBackend;
