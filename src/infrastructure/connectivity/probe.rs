use crate::shared::error::AppError;
use async_trait::async_trait;

/// One reachability check against the configured remote endpoint.
/// `Ok` means the backend answered; any error reads as "offline".
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn check(&self) -> Result<(), AppError>;
}
