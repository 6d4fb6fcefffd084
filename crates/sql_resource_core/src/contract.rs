use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProvisionError, RequiredField};

pub type ResourceProperties = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

/// Lifecycle event as delivered by the provisioning engine.
///
/// Only `RequestType`, `ResourceProperties` and `PhysicalResourceId` drive
/// processing; the remaining envelope fields are echoed back in the
/// [`ResponseDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,
    #[serde(default, rename = "ResponseURL")]
    pub response_url: String,
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: String,
    #[serde(default)]
    pub resource_properties: ResourceProperties,
    #[serde(default)]
    pub old_resource_properties: ResourceProperties,
}

impl LifecycleEvent {
    pub fn new(request_type: RequestType, resource_properties: ResourceProperties) -> Self {
        Self {
            request_type,
            response_url: String::new(),
            stack_id: String::new(),
            request_id: String::new(),
            resource_type: String::new(),
            logical_resource_id: String::new(),
            physical_resource_id: String::new(),
            resource_properties,
            old_resource_properties: ResourceProperties::new(),
        }
    }

    pub fn with_physical_resource_id(mut self, physical_resource_id: impl Into<String>) -> Self {
        self.physical_resource_id = physical_resource_id.into();
        self
    }
}

/// Terminal outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionResponse {
    pub physical_resource_id: String,
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProvisionResponse {
    pub fn success(physical_resource_id: impl Into<String>) -> Self {
        Self {
            physical_resource_id: physical_resource_id.into(),
            data: Map::new(),
            error: None,
        }
    }

    pub fn failure(physical_resource_id: impl Into<String>, error: &ProvisionError) -> Self {
        Self {
            physical_resource_id: physical_resource_id.into(),
            data: Map::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Body uploaded to the event's presigned response URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseDocument {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    pub data: Map<String, Value>,
}

impl ResponseDocument {
    /// Builds the response for `event`.
    ///
    /// The engine rejects an empty physical id, so a failed Create falls back
    /// to `fallback_physical_id` (the function's log stream name).
    pub fn new(
        event: &LifecycleEvent,
        response: &ProvisionResponse,
        fallback_physical_id: &str,
    ) -> Self {
        let physical_resource_id = if response.physical_resource_id.is_empty() {
            fallback_physical_id.to_string()
        } else {
            response.physical_resource_id.clone()
        };
        let (status, reason) = match &response.error {
            Some(message) => (ResponseStatus::Failed, message.clone()),
            None => (ResponseStatus::Success, String::new()),
        };

        Self {
            status,
            reason,
            physical_resource_id,
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            no_echo: false,
            data: response.data.clone(),
        }
    }
}

/// Strongly typed view of a Create request's properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedProperties {
    pub database: String,
    pub sql_query: String,
    pub secret_id: String,
}

/// Checks the required properties in the order Database, SqlQuery, SecretId
/// and reports only the first one missing.
///
/// A property counts as missing when it is absent, not a JSON string, or blank.
/// A `SecretId` property overrides `configured_secret_id`.
pub fn validate_properties(
    properties: &ResourceProperties,
    configured_secret_id: Option<&str>,
) -> Result<ValidatedProperties, ProvisionError> {
    let database = required_string(properties, RequiredField::Database)?;
    let sql_query = required_string(properties, RequiredField::SqlQuery)?;
    let secret_id = required_string(properties, RequiredField::SecretId)
        .ok()
        .or_else(|| {
            configured_secret_id
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
        })
        .ok_or(ProvisionError::MissingParameter(RequiredField::SecretId))?;

    Ok(ValidatedProperties {
        database,
        sql_query,
        secret_id,
    })
}

/// Returns the JSON type name of a `SecretId` property that is present but
/// unusable (not a string, or blank), in which case validation falls back to
/// the configured reference.
pub fn unusable_secret_id(properties: &ResourceProperties) -> Option<&'static str> {
    let value = properties.get(RequiredField::SecretId.as_str())?;
    match value {
        Value::String(text) if !text.trim().is_empty() => None,
        Value::String(_) => Some("blank string"),
        Value::Null => Some("null"),
        Value::Bool(_) => Some("boolean"),
        Value::Number(_) => Some("number"),
        Value::Array(_) => Some("array"),
        Value::Object(_) => Some("object"),
    }
}

fn required_string(
    properties: &ResourceProperties,
    field: RequiredField,
) -> Result<String, ProvisionError> {
    properties
        .get(field.as_str())
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .ok_or(ProvisionError::MissingParameter(field))
}
