use async_trait::async_trait;
use tessera_types::{ValidationError, ValidationResult};

use crate::{context::RequestContext, cqrs::Request};

/// Checks a request before it reaches its handler. A request type may have
/// any number of validators; they all run and their errors are combined.
#[async_trait]
pub trait Validator<R: Request>: Send + Sync {
    async fn validate(&self, request: &R, ctx: &RequestContext) -> ValidationResult;
}

type Rule<R> = Box<dyn Fn(&R) -> Option<ValidationError> + Send + Sync>;

/// Synchronous rules evaluated in the order they were added.
pub struct RuleSet<R> {
    rules: Vec<Rule<R>>,
}

impl<R> RuleSet<R> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds a rule producing at most one error.
    pub fn rule(mut self, rule: impl Fn(&R) -> Option<ValidationError> + Send + Sync + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Fails with `code`/`message` on `property` when `check` is false.
    pub fn ensure(
        self,
        property: &'static str,
        code: &'static str,
        message: impl Into<String>,
        check: impl Fn(&R) -> bool + Send + Sync + 'static,
    ) -> Self {
        let message = message.into();
        self.rule(move |r| {
            (!check(r)).then(|| ValidationError::new(code, message.clone(), property))
        })
    }

    pub fn not_empty(
        self,
        property: &'static str,
        value: impl Fn(&R) -> &str + Send + Sync + 'static,
    ) -> Self {
        self.ensure(
            property,
            "NotEmpty",
            format!("'{property}' must not be empty."),
            move |r| !value(r).trim().is_empty(),
        )
    }

    pub fn max_length(
        self,
        property: &'static str,
        max: usize,
        value: impl Fn(&R) -> &str + Send + Sync + 'static,
    ) -> Self {
        self.ensure(
            property,
            "MaximumLength",
            format!("The length of '{property}' must be {max} characters or fewer."),
            move |r| value(r).chars().count() <= max,
        )
    }

    pub fn check(&self, request: &R) -> ValidationResult {
        ValidationResult::with_errors(self.rules.iter().filter_map(|rule| rule(request)))
    }
}

#[async_trait]
impl<R: Request> Validator<R> for RuleSet<R> {
    async fn validate(&self, request: &R, _ctx: &RequestContext) -> ValidationResult {
        self.check(request)
    }
}
