#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use sql_resource_core::contract::{
    LifecycleEvent, RequestType, ResourceProperties, ResponseDocument,
};
use sql_resource_core::credentials::ConnectionDescriptor;
use sql_resource_core::error::DriverError;
use sql_resource_lambda::adapters::connection::{Connection, ConnectionFactory};
use sql_resource_lambda::adapters::responder::ResponseSender;
use sql_resource_lambda::adapters::secret_store::SecretStore;

pub const SECRET_PAYLOAD: &str =
    "{\"host\": \"host\",\"username\": \"user\",\"password\": \"password\", \"port\":1344}";

pub fn create_event(properties: Value) -> LifecycleEvent {
    let properties: ResourceProperties = properties
        .as_object()
        .cloned()
        .expect("properties should be an object");
    LifecycleEvent::new(RequestType::Create, properties)
}

/// Secret store that always answers the same way and counts fetches.
pub struct StaticSecretStore {
    response: Result<Option<String>, String>,
    fetched: AtomicUsize,
}

impl StaticSecretStore {
    pub fn payload(payload: &str) -> Self {
        Self::new(Ok(Some(payload.to_string())))
    }

    pub fn new(response: Result<Option<String>, String>) -> Self {
        Self {
            response,
            fetched: AtomicUsize::new(0),
        }
    }

    pub fn fetched(&self) -> usize {
        self.fetched.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn fetch_secret(&self, _secret_id: &str) -> Result<Option<String>, DriverError> {
        self.fetched.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map_err(DriverError::from)
    }
}

/// Connection factory whose handles record every call and fail on demand.
#[derive(Default)]
pub struct ScriptedConnectionFactory {
    calls: Arc<Mutex<Vec<String>>>,
    connection_strings: Arc<Mutex<Vec<String>>>,
    statement_error: Option<String>,
}

impl ScriptedConnectionFactory {
    pub fn failing_statement(message: &str) -> Self {
        Self {
            statement_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    pub fn connection_strings(&self) -> Vec<String> {
        self.connection_strings
            .lock()
            .expect("poisoned mutex")
            .clone()
    }
}

#[async_trait]
impl ConnectionFactory for ScriptedConnectionFactory {
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn Connection>, DriverError> {
        self.calls.lock().expect("poisoned mutex").push("open".to_string());
        self.connection_strings
            .lock()
            .expect("poisoned mutex")
            .push(descriptor.connection_string().as_str().to_string());
        Ok(Box::new(ScriptedConnection {
            calls: Arc::clone(&self.calls),
            statement_error: self.statement_error.clone(),
        }))
    }
}

struct ScriptedConnection {
    calls: Arc<Mutex<Vec<String>>>,
    statement_error: Option<String>,
}

impl ScriptedConnection {
    fn record(&self, call: String) {
        self.calls.lock().expect("poisoned mutex").push(call);
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn begin(&mut self) -> Result<(), DriverError> {
        self.record("begin".to_string());
        Ok(())
    }

    async fn execute(&mut self, statement: &str) -> Result<u64, DriverError> {
        self.record(format!("execute:{statement}"));
        match &self.statement_error {
            Some(message) => Err(message.clone().into()),
            None => Ok(1),
        }
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.record("commit".to_string());
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        self.record("rollback".to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct CapturingResponseSender {
    sent: Mutex<Vec<(String, ResponseDocument)>>,
    fail: bool,
}

impl CapturingResponseSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, ResponseDocument)> {
        self.sent.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl ResponseSender for CapturingResponseSender {
    async fn send(
        &self,
        response_url: &str,
        document: &ResponseDocument,
    ) -> Result<(), DriverError> {
        if self.fail {
            return Err("response upload rejected: 403 Forbidden".into());
        }
        self.sent
            .lock()
            .expect("poisoned mutex")
            .push((response_url.to_string(), document.clone()));
        Ok(())
    }
}
