use crate::application::ports::RemoteBackend;
use crate::domain::entities::{Client, ExpenseRecord, ServiceRecord};
use crate::domain::value_objects::{EntityId, OwnerId};
use crate::infrastructure::connectivity::ReachabilityProbe;
use crate::infrastructure::remote::error::RemoteError;
use crate::infrastructure::remote::wire;
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Reference adapter for a REST-shaped relational backend. Requests carry
/// a bounded timeout so a hung call degrades into the offline path instead
/// of blocking a user action.
pub struct RestRemoteBackend {
    client: reqwest::Client,
    base_url: String,
}

impl RestRemoteBackend {
    pub fn new(config: &RemoteConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::ConfigurationError(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, RemoteError> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        let body: Value = response.json().await?;
        serde_json::from_value(wire::to_camel_case(body))
            .map_err(|err| RemoteError::Payload(err.to_string()))
    }

    async fn push_record<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        record: &T,
    ) -> Result<(), RemoteError> {
        let body = serde_json::to_value(record)
            .map_err(|err| RemoteError::Payload(err.to_string()))?;
        self.client
            .request(method, self.url(path))
            .json(&wire::to_snake_case(body))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete_record(&self, path: &str) -> Result<(), RemoteError> {
        self.client
            .delete(self.url(path))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn range_query(
        owner: &OwnerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![("owner_id", owner.to_string())];
        if let Some(start) = start {
            query.push(("start", start.to_string()));
        }
        if let Some(end) = end {
            query.push(("end", end.to_string()));
        }
        query
    }
}

#[async_trait]
impl RemoteBackend for RestRemoteBackend {
    async fn get_clients(&self, owner: &OwnerId) -> Result<Vec<Client>, AppError> {
        Ok(self
            .fetch_list("clients", &[("owner_id", owner.to_string())])
            .await?)
    }

    async fn save_client(&self, client: &Client) -> Result<(), AppError> {
        Ok(self.push_record(Method::POST, "clients", client).await?)
    }

    async fn delete_client(&self, id: &EntityId) -> Result<(), AppError> {
        Ok(self.delete_record(&format!("clients/{id}")).await?)
    }

    async fn get_services(
        &self,
        owner: &OwnerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<ServiceRecord>, AppError> {
        let query = Self::range_query(owner, start, end);
        Ok(self.fetch_list("services", &query).await?)
    }

    async fn save_service(&self, service: &ServiceRecord) -> Result<(), AppError> {
        Ok(self.push_record(Method::POST, "services", service).await?)
    }

    async fn update_service(&self, service: &ServiceRecord) -> Result<(), AppError> {
        let path = format!("services/{}", service.id);
        Ok(self.push_record(Method::PATCH, &path, service).await?)
    }

    async fn delete_service(&self, id: &EntityId) -> Result<(), AppError> {
        Ok(self.delete_record(&format!("services/{id}")).await?)
    }

    async fn get_expenses(
        &self,
        owner: &OwnerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<ExpenseRecord>, AppError> {
        let query = Self::range_query(owner, start, end);
        Ok(self.fetch_list("expenses", &query).await?)
    }

    async fn save_expense(&self, expense: &ExpenseRecord) -> Result<(), AppError> {
        Ok(self.push_record(Method::POST, "expenses", expense).await?)
    }

    async fn delete_expense(&self, id: &EntityId) -> Result<(), AppError> {
        Ok(self.delete_record(&format!("expenses/{id}")).await?)
    }
}

#[async_trait]
impl ReachabilityProbe for RestRemoteBackend {
    async fn check(&self) -> Result<(), AppError> {
        self.client
            .get(self.url("health"))
            .send()
            .await
            .map_err(RemoteError::from)?
            .error_for_status()
            .map_err(RemoteError::from)?;
        Ok(())
    }
}
