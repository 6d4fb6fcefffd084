pub mod connection;
pub mod mssql;
pub mod responder;
pub mod secret_store;
