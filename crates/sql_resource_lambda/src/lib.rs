//! AWS-oriented adapters and handlers for the SQL custom resource.
//!
//! This crate owns runtime integration details (the Lambda handler, secret
//! store and database seams, response delivery) on top of the contracts in
//! `sql_resource_core`.

pub mod adapters;
pub mod config;
pub mod deadline;
pub mod handlers;
