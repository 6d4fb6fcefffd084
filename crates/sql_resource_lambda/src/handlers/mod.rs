pub mod custom_resource;
pub mod invocation;
pub mod transaction;
