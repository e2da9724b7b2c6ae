//! DynamoDB-backed table store.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType, TableStatus, Tag,
};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::store::{StoreConfig, TableStore};
use crate::types::StateRow;

const ATTR_DEPLOYMENT_KEY: &str = "deployment_key";
const ATTR_ACTIVE_COLOR: &str = "active_color";
const ATTR_LAST_UPDATED: &str = "last_updated";
const ATTR_METADATA: &str = "metadata";

/// Table store backed by Amazon DynamoDB.
#[derive(Clone)]
pub struct DynamoStore {
    client: Client,
    config: StoreConfig,
}

impl std::fmt::Debug for DynamoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoStore")
            .field("table_name", &self.config.table_name)
            .finish()
    }
}

impl DynamoStore {
    /// Build a store from a shared SDK config plus our own settings.
    ///
    /// Inheriting from `SdkConfig` preserves the credentials, region and
    /// retry configuration resolved at the boundary; only the endpoint
    /// override is applied here.
    pub fn new(sdk_config: &aws_config::SdkConfig, config: StoreConfig) -> Self {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        let client = Client::from_conf(builder.build());
        Self { client, config }
    }

    /// Build from a pre-constructed client (for testing against a local
    /// stack).
    pub fn from_client(client: Client, config: StoreConfig) -> Self {
        Self { client, config }
    }

    fn row_from_item(item: &HashMap<String, AttributeValue>) -> Option<StateRow> {
        let deployment_key = item.get(ATTR_DEPLOYMENT_KEY)?.as_s().ok()?.clone();
        let active_color = item.get(ATTR_ACTIVE_COLOR)?.as_s().ok()?.clone();
        let last_updated = item
            .get(ATTR_LAST_UPDATED)
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default();
        let metadata = item
            .get(ATTR_METADATA)
            .and_then(|v| v.as_m().ok())
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| Some((k.clone(), v.as_s().ok()?.clone())))
                    .collect()
            })
            .unwrap_or_default();
        Some(StateRow {
            deployment_key,
            active_color,
            last_updated,
            metadata,
        })
    }

    /// Whether a DescribeTable error means the table simply does not exist.
    fn is_not_found(err: &SdkError<DescribeTableError>) -> bool {
        match err {
            SdkError::ServiceError(service_err) => {
                matches!(
                    service_err.err(),
                    DescribeTableError::ResourceNotFoundException(_)
                )
            }
            _ => false,
        }
    }
}

#[async_trait]
impl TableStore for DynamoStore {
    async fn table_exists(&self) -> Result<bool> {
        match self
            .client
            .describe_table()
            .table_name(&self.config.table_name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if Self::is_not_found(&err) => Ok(false),
            Err(err) => Err(Error::StoreUnavailable(format!(
                "DescribeTable failed: {err}"
            ))),
        }
    }

    async fn create_table(&self) -> Result<()> {
        let key_attribute = AttributeDefinition::builder()
            .attribute_name(ATTR_DEPLOYMENT_KEY)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let key_schema = KeySchemaElement::builder()
            .attribute_name(ATTR_DEPLOYMENT_KEY)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let purpose_tag = Tag::builder()
            .key("purpose")
            .value("blue-green deployment state")
            .build()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let managed_by_tag = Tag::builder()
            .key("managed-by")
            .value("bluegreen")
            .build()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

        self.client
            .create_table()
            .table_name(&self.config.table_name)
            .attribute_definitions(key_attribute)
            .key_schema(key_schema)
            .billing_mode(BillingMode::PayPerRequest)
            .tags(purpose_tag)
            .tags(managed_by_tag)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("CreateTable failed: {e}")))?;

        info!(table = %self.config.table_name, "table creation requested");
        Ok(())
    }

    async fn wait_until_active(&self) -> Result<()> {
        for attempt in 1..=self.config.active_poll_attempts {
            match self
                .client
                .describe_table()
                .table_name(&self.config.table_name)
                .send()
                .await
            {
                Ok(out) => {
                    let status = out.table().and_then(|t| t.table_status()).cloned();
                    if status == Some(TableStatus::Active) {
                        debug!(table = %self.config.table_name, attempt, "table active");
                        return Ok(());
                    }
                    debug!(
                        table = %self.config.table_name,
                        attempt,
                        ?status,
                        "table not active yet"
                    );
                }
                // Transient describe failures burn an attempt but do not
                // abort the wait.
                Err(err) => {
                    warn!(
                        table = %self.config.table_name,
                        attempt,
                        error = %err,
                        "describe failed while waiting for table"
                    );
                }
            }
            if attempt < self.config.active_poll_attempts {
                tokio::time::sleep(self.config.active_poll_interval).await;
            }
        }
        Err(Error::TableNotReady {
            table: self.config.table_name.clone(),
            attempts: self.config.active_poll_attempts,
        })
    }

    async fn get_item(&self, deployment_key: &str) -> Result<Option<StateRow>> {
        let response = self
            .client
            .get_item()
            .table_name(&self.config.table_name)
            .key(
                ATTR_DEPLOYMENT_KEY,
                AttributeValue::S(deployment_key.to_string()),
            )
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("GetItem failed: {e}")))?;

        Ok(response.item().and_then(Self::row_from_item))
    }

    async fn put_item(&self, row: StateRow) -> Result<()> {
        debug!(
            table = %self.config.table_name,
            key = %row.deployment_key,
            color = %row.active_color,
            "writing state row"
        );
        let metadata = row
            .metadata
            .into_iter()
            .map(|(k, v)| (k, AttributeValue::S(v)))
            .collect();
        self.client
            .put_item()
            .table_name(&self.config.table_name)
            .item(ATTR_DEPLOYMENT_KEY, AttributeValue::S(row.deployment_key))
            .item(ATTR_ACTIVE_COLOR, AttributeValue::S(row.active_color))
            .item(ATTR_LAST_UPDATED, AttributeValue::S(row.last_updated))
            .item(ATTR_METADATA, AttributeValue::M(metadata))
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("PutItem failed: {e}")))?;
        Ok(())
    }
}
