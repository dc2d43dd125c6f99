pub mod audit;
pub mod error;
pub mod grid;
pub mod outcome;
pub mod validation;

pub use error::Error;
pub use outcome::{Outcome, OutcomeError};
pub use validation::{ValidationError, ValidationResult};
