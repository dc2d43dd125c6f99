use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use tessera_core::{AppError, ApplicationError};

use crate::{
    auditable::ChangeStamper,
    behaviors::Pipeline,
    config::Config,
    context::{DispatchScope, RequestContext},
    cqrs::{Request, RequestHandler},
    services::{AuditSink, Clock, SystemClock},
    uow::UnitOfWorkProvider,
    validation::Validator,
};

/// Handler and validators of one request type.
struct Registration<R: Request> {
    handler: Option<Arc<dyn RequestHandler<R>>>,
    validators: Vec<Arc<dyn Validator<R>>>,
}

/// Type-erased [`Registration`] plus what `build` needs to check it
/// without knowing the request type.
struct Slot {
    name: &'static str,
    has_handler: bool,
    validators: usize,
    entry: Box<dyn Any + Send + Sync>,
}

impl Slot {
    fn new<R: Request>() -> Self {
        Self {
            name: R::name(),
            has_handler: false,
            validators: 0,
            entry: Box::new(Registration::<R> {
                handler: None,
                validators: Vec::new(),
            }),
        }
    }
}

/// Registry from request type to its handler and validators, fixed once
/// the dispatcher is built.
pub struct HandlerRegistry {
    slots: HashMap<TypeId, Slot>,
}

impl HandlerRegistry {
    fn registration<R: Request>(&self) -> Option<&Registration<R>> {
        self.slots
            .get(&TypeId::of::<R>())
            .and_then(|slot| slot.entry.downcast_ref::<Registration<R>>())
    }

    pub fn contains<R: Request>(&self) -> bool {
        self.registration::<R>()
            .is_some_and(|r| r.handler.is_some())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn handler<R: Request>(&self) -> Result<Arc<dyn RequestHandler<R>>, ApplicationError> {
        self.registration::<R>()
            .and_then(|r| r.handler.clone())
            .ok_or_else(|| AppError::NoHandler(R::name()).into())
    }

    /// Validators of `R` in registration order.
    pub(crate) fn validators<R: Request>(&self) -> &[Arc<dyn Validator<R>>] {
        self.registration::<R>()
            .map(|r| r.validators.as_slice())
            .unwrap_or_default()
    }
}

/// Collects registrations; [`DispatcherBuilder::build`] rejects a bad
/// setup before anything is dispatched.
pub struct DispatcherBuilder {
    config: Config,
    uow_provider: Arc<dyn UnitOfWorkProvider>,
    audit_sink: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    slots: HashMap<TypeId, Slot>,
    required: Vec<(TypeId, &'static str)>,
    errors: Vec<AppError>,
}

impl DispatcherBuilder {
    pub fn handler<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let slot = self
            .slots
            .entry(TypeId::of::<R>())
            .or_insert_with(Slot::new::<R>);

        if slot.has_handler {
            self.errors.push(AppError::DuplicateHandler(R::name()));
            return self;
        }

        if let Some(registration) = slot.entry.downcast_mut::<Registration<R>>() {
            registration.handler = Some(Arc::new(handler));
            slot.has_handler = true;
        }
        self
    }

    /// Adds a validator for `R`. Validators run in the order they are added.
    pub fn validator<R, V>(mut self, validator: V) -> Self
    where
        R: Request,
        V: Validator<R> + 'static,
    {
        let slot = self
            .slots
            .entry(TypeId::of::<R>())
            .or_insert_with(Slot::new::<R>);

        if let Some(registration) = slot.entry.downcast_mut::<Registration<R>>() {
            registration.validators.push(Arc::new(validator));
            slot.validators += 1;
        }
        self
    }

    /// Makes `build` fail unless `R` has a handler.
    pub fn require<R: Request>(mut self) -> Self {
        self.required.push((TypeId::of::<R>(), R::name()));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<Dispatcher, ApplicationError> {
        let DispatcherBuilder {
            config,
            uow_provider,
            audit_sink,
            clock,
            slots,
            required,
            errors,
        } = self;

        if let Some(err) = errors.into_iter().next() {
            return Err(err.into());
        }

        if let Some(orphan) = slots
            .values()
            .find(|slot| !slot.has_handler && slot.validators > 0)
        {
            return Err(AppError::ValidatorWithoutHandler(orphan.name).into());
        }

        if let Some((_, name)) = required
            .iter()
            .find(|(id, _)| !slots.get(id).is_some_and(|slot| slot.has_handler))
        {
            return Err(AppError::NoHandler(name).into());
        }

        tracing::debug!(requests = slots.len(), "Dispatcher built");

        let registry = Arc::new(HandlerRegistry { slots });
        Ok(Dispatcher {
            pipeline: Pipeline::new(registry.clone(), audit_sink),
            registry,
            config: Arc::new(config),
            uow_provider,
            clock,
        })
    }
}

/// Routes each request to its handler through the behavior chain.
///
/// Stateless between calls: every dispatch gets its own unit of work, so
/// one dispatcher can serve concurrent requests.
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    pipeline: Pipeline,
    config: Arc<Config>,
    uow_provider: Arc<dyn UnitOfWorkProvider>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn builder(
        config: Config,
        uow_provider: Arc<dyn UnitOfWorkProvider>,
        audit_sink: Arc<dyn AuditSink>,
    ) -> DispatcherBuilder {
        DispatcherBuilder {
            config,
            uow_provider,
            audit_sink,
            clock: Arc::new(SystemClock),
            slots: HashMap::new(),
            required: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Dispatches as an anonymous user, without a way to cancel.
    pub async fn dispatch<R: Request>(&self, request: R) -> Result<R::Response, ApplicationError> {
        self.dispatch_with(request, DispatchScope::default()).await
    }

    pub async fn dispatch_with<R: Request>(
        &self,
        request: R,
        scope: DispatchScope,
    ) -> Result<R::Response, ApplicationError> {
        let handler = self.registry.handler::<R>()?;

        let ctx = RequestContext {
            uow: self
                .uow_provider
                .create(ChangeStamper::new(scope.user.clone(), self.clock.clone())),
            user: scope.user,
            cancellation: scope.cancellation,
            config: self.config.clone(),
            clock: self.clock.clone(),
        };

        let result = self.pipeline.run(request, &ctx, handler.as_ref()).await;

        if ctx.uow.has_active_transaction() {
            tracing::warn!(
                request = R::name(),
                "Rolling back a transaction left open after dispatch"
            );
            if let Err(err) = ctx.uow.rollback_transaction().await {
                tracing::error!(error = %err, "Rollback failed");
            }
        }

        result
    }
}
