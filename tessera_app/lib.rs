pub mod audit_log;
pub mod auditable;
pub mod behaviors;
pub mod config;
pub mod context;
pub mod cqrs;
pub mod dispatcher;
pub mod queries_handlers;
pub mod repository;
pub mod services;
pub mod specification;
pub mod test_utils;
pub mod uow;
pub mod validation;

pub use context::{DispatchScope, RequestContext};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
