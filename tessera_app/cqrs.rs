mod handler;
mod reply;
mod request;

pub mod queries;

pub use handler::*;
pub use reply::*;
pub use request::*;
