#[cfg(any(test, feature = "test-utils"))]
#[cfg(not(tarpaulin_include))]
pub mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde::Serialize;
    use std::{
        any::{Any, TypeId},
        collections::HashMap,
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    use tessera_core::{AppError, ApplicationError};
    use tessera_types::{
        Outcome, ValidationError, ValidationResult,
        audit::AuditRecord,
        grid::{PagedAndSortedRequest, PagedResponse},
    };

    use crate::{
        audit_log::AuditLog,
        auditable::{Auditable, ChangeStamper},
        config::Config,
        context::RequestContext,
        cqrs::{Request, RequestHandler, RequestKind},
        repository::{CommandRepository, Entity, QueryRepository, Repositories},
        services::{AnonymousUser, AuditSink, Clock, SystemClock},
        specification::{
            FieldDescriptor, FieldValue, Fields, Predicate, Searchable, Specification,
            count_matching, evaluate,
        },
        uow::{TransactionHandle, UnitOfWork, UnitOfWorkProvider},
        validation::{RuleSet, Validator},
    };

    // ---------------------------------------------------------------
    // Widget fixture
    // ---------------------------------------------------------------

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct WidgetOwner {
        pub name: String,
        pub email: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Widget {
        pub id: Uuid,
        pub name: String,
        pub price: f64,
        pub description: Option<String>,
        pub owner: WidgetOwner,
        pub created_by: Option<String>,
        pub created_at: DateTime<Utc>,
        pub last_modified_by: Option<String>,
        pub last_modified_at: Option<DateTime<Utc>>,
    }

    static OWNER_FIELDS: [FieldDescriptor; 2] = [
        FieldDescriptor::column("name", "owner_name"),
        FieldDescriptor::column("email", "owner_email"),
    ];

    fn owner_fields() -> &'static [FieldDescriptor] {
        &OWNER_FIELDS
    }

    static WIDGET_FIELDS: [FieldDescriptor; 9] = [
        FieldDescriptor::scalar("id"),
        FieldDescriptor::scalar("name"),
        FieldDescriptor::scalar("price"),
        FieldDescriptor::scalar("description"),
        FieldDescriptor::scalar("created_by"),
        FieldDescriptor::scalar("created_at"),
        FieldDescriptor::scalar("last_modified_by"),
        FieldDescriptor::scalar("last_modified_at"),
        FieldDescriptor::nested("owner", owner_fields),
    ];

    impl Fields for Widget {
        fn fields() -> &'static [FieldDescriptor] {
            &WIDGET_FIELDS
        }

        fn field_value(&self, path: &[&str]) -> Option<FieldValue> {
            let value: FieldValue = match path {
                ["id"] => self.id.into(),
                ["name"] => self.name.as_str().into(),
                ["price"] => self.price.into(),
                ["description"] => self.description.as_deref().into(),
                ["created_by"] => self.created_by.as_deref().into(),
                ["created_at"] => self.created_at.into(),
                ["last_modified_by"] => self.last_modified_by.as_deref().into(),
                ["last_modified_at"] => self.last_modified_at.into(),
                ["owner", "name"] => self.owner.name.as_str().into(),
                ["owner", "email"] => self.owner.email.as_str().into(),
                _ => return None,
            };
            Some(value)
        }
    }

    impl Entity for Widget {
        type Id = Uuid;

        const NAME: &'static str = "Widget";

        fn id(&self) -> &Uuid {
            &self.id
        }

        fn as_auditable_mut(&mut self) -> Option<&mut dyn Auditable> {
            Some(self)
        }
    }

    impl Auditable for Widget {
        fn stamp_created(&mut self, by: Option<String>, at: DateTime<Utc>) {
            self.created_by = by;
            self.created_at = at;
        }

        fn stamp_modified(&mut self, by: Option<String>, at: DateTime<Utc>) {
            self.last_modified_by = by;
            self.last_modified_at = Some(at);
        }
    }

    impl Searchable for Widget {
        fn search_predicate(term: &str) -> Predicate {
            Predicate::contains("name", term).or(Predicate::contains("owner.name", term))
        }
    }

    pub struct WidgetFactory {
        widget: Widget,
    }

    impl WidgetFactory {
        pub fn new() -> Self {
            let id = Uuid::new_v4();
            Self {
                widget: Widget {
                    id,
                    name: format!("widget-{}", &id.simple().to_string()[..8]),
                    price: 1.0,
                    description: None,
                    owner: WidgetOwner {
                        name: "ada".to_string(),
                        email: "ada@example.com".to_string(),
                    },
                    created_by: None,
                    created_at: Utc::now(),
                    last_modified_by: None,
                    last_modified_at: None,
                },
            }
        }

        pub fn name(mut self, name: &str) -> Self {
            self.widget.name = name.to_string();
            self
        }

        pub fn price(mut self, price: f64) -> Self {
            self.widget.price = price;
            self
        }

        pub fn description(mut self, description: &str) -> Self {
            self.widget.description = Some(description.to_string());
            self
        }

        pub fn owner(mut self, name: &str, email: &str) -> Self {
            self.widget.owner = WidgetOwner {
                name: name.to_string(),
                email: email.to_string(),
            };
            self
        }

        pub fn build(self) -> Widget {
            self.widget
        }
    }

    // ---------------------------------------------------------------
    // In-memory persistence
    // ---------------------------------------------------------------

    type Tables = HashMap<TypeId, Box<dyn Any + Send>>;
    type Change = Box<dyn FnOnce(&mut Tables) + Send>;
    type Registrar = fn(Repositories, &Arc<InMemorySession>) -> Repositories;

    fn rows_mut<T: Entity>(tables: &mut Tables) -> Option<&mut Vec<T>> {
        tables
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Vec::<T>::new()))
            .downcast_mut::<Vec<T>>()
    }

    fn ensure_live(cancel: &CancellationToken) -> Result<(), ApplicationError> {
        if cancel.is_cancelled() {
            return Err(ApplicationError::Cancelled);
        }
        Ok(())
    }

    /// Counts unit-of-work calls across every unit of work of a database.
    #[derive(Debug, Default)]
    pub struct UowStats {
        begins: AtomicUsize,
        saves: AtomicUsize,
        commits: AtomicUsize,
        rollbacks: AtomicUsize,
    }

    impl UowStats {
        pub fn begins(&self) -> usize {
            self.begins.load(Ordering::SeqCst)
        }

        pub fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        pub fn commits(&self) -> usize {
            self.commits.load(Ordering::SeqCst)
        }

        pub fn rollbacks(&self) -> usize {
            self.rollbacks.load(Ordering::SeqCst)
        }
    }

    /// Committed rows shared by every unit of work created from it.
    /// Widgets and audit logs are registered out of the box.
    #[derive(Clone)]
    pub struct InMemoryDatabase {
        tables: Arc<Mutex<Tables>>,
        registrars: Arc<Mutex<Vec<Registrar>>>,
        stats: Arc<UowStats>,
    }

    impl InMemoryDatabase {
        pub fn new() -> Self {
            let db = Self {
                tables: Arc::new(Mutex::new(HashMap::new())),
                registrars: Arc::new(Mutex::new(Vec::new())),
                stats: Arc::new(UowStats::default()),
            };
            db.register::<Widget>();
            db.register::<AuditLog>();
            db
        }

        pub fn register<T: Entity>(&self) {
            self.registrars.lock().unwrap().push(register_entity::<T>);
        }

        pub fn seed<T: Entity>(&self, items: impl IntoIterator<Item = T>) {
            let mut tables = self.tables.lock().unwrap();
            if let Some(rows) = rows_mut::<T>(&mut tables) {
                rows.extend(items);
            }
        }

        /// Committed rows of `T`, in insertion order.
        pub fn rows<T: Entity>(&self) -> Vec<T> {
            self.tables
                .lock()
                .unwrap()
                .get(&TypeId::of::<T>())
                .and_then(|t| t.downcast_ref::<Vec<T>>())
                .cloned()
                .unwrap_or_default()
        }

        pub fn stats(&self) -> &UowStats {
            &self.stats
        }

        pub fn provider(&self) -> Arc<InMemoryUnitOfWorkProvider> {
            Arc::new(InMemoryUnitOfWorkProvider { db: self.clone() })
        }

        /// A unit of work acting as an anonymous user.
        pub fn unit_of_work(&self) -> Arc<InMemoryUnitOfWork> {
            self.unit_of_work_as(ChangeStamper::default())
        }

        pub fn unit_of_work_as(&self, stamper: ChangeStamper) -> Arc<InMemoryUnitOfWork> {
            let session = Arc::new(InMemorySession {
                db: self.clone(),
                stamper,
                staged: Mutex::new(Vec::new()),
                flushed: Mutex::new(Vec::new()),
                transaction: Mutex::new(None),
            });
            let registrars = self.registrars.lock().unwrap().clone();
            let repositories = registrars
                .iter()
                .fold(Repositories::new(), |repos, register| register(repos, &session));
            Arc::new(InMemoryUnitOfWork {
                session,
                repositories,
            })
        }

        fn apply(&self, changes: Vec<Change>) {
            let mut tables = self.tables.lock().unwrap();
            for change in changes {
                change(&mut tables);
            }
        }
    }

    fn register_entity<T: Entity>(
        repos: Repositories,
        session: &Arc<InMemorySession>,
    ) -> Repositories {
        repos
            .with_commands::<T>(Arc::new(InMemoryCommandRepository::<T> {
                session: session.clone(),
                _entity: std::marker::PhantomData,
            }))
            .with_queries::<T>(Arc::new(InMemoryQueryRepository::<T> {
                db: session.db.clone(),
                _entity: std::marker::PhantomData,
            }))
    }

    /// Pending state of one unit of work. Changes are staged until saved;
    /// inside an explicit transaction saved changes wait for the commit.
    pub struct InMemorySession {
        db: InMemoryDatabase,
        stamper: ChangeStamper,
        staged: Mutex<Vec<Change>>,
        flushed: Mutex<Vec<Change>>,
        transaction: Mutex<Option<TransactionHandle>>,
    }

    impl InMemorySession {
        fn stage(&self, change: Change) {
            self.staged.lock().unwrap().push(change);
        }

        fn save(&self) -> u64 {
            let staged: Vec<Change> = self.staged.lock().unwrap().drain(..).collect();
            let written = staged.len() as u64;
            if self.transaction.lock().unwrap().is_some() {
                self.flushed.lock().unwrap().extend(staged);
            } else {
                self.db.apply(staged);
            }
            self.db.stats.saves.fetch_add(1, Ordering::SeqCst);
            written
        }

        fn discard(&self) {
            self.staged.lock().unwrap().clear();
            self.flushed.lock().unwrap().clear();
            *self.transaction.lock().unwrap() = None;
        }
    }

    pub struct InMemoryCommandRepository<T> {
        session: Arc<InMemorySession>,
        _entity: std::marker::PhantomData<fn() -> T>,
    }

    #[async_trait]
    impl<T: Entity> CommandRepository<T> for InMemoryCommandRepository<T> {
        async fn add(&self, mut entity: T, cancel: &CancellationToken) -> Result<T, ApplicationError> {
            ensure_live(cancel)?;
            self.session.stamper.on_added(&mut entity);
            let row = entity.clone();
            self.session.stage(Box::new(move |tables| {
                if let Some(rows) = rows_mut::<T>(tables) {
                    rows.push(row);
                }
            }));
            Ok(entity)
        }

        async fn add_range(
            &self,
            entities: Vec<T>,
            cancel: &CancellationToken,
        ) -> Result<Vec<T>, ApplicationError> {
            let mut added = Vec::with_capacity(entities.len());
            for entity in entities {
                added.push(self.add(entity, cancel).await?);
            }
            Ok(added)
        }

        async fn update(&self, mut entity: T, cancel: &CancellationToken) -> Result<(), ApplicationError> {
            ensure_live(cancel)?;
            self.session.stamper.on_modified(&mut entity);
            self.session.stage(Box::new(move |tables| {
                if let Some(rows) = rows_mut::<T>(tables) {
                    if let Some(slot) = rows.iter_mut().find(|r| r.id() == entity.id()) {
                        *slot = entity;
                    }
                }
            }));
            Ok(())
        }

        async fn update_range(
            &self,
            entities: Vec<T>,
            cancel: &CancellationToken,
        ) -> Result<(), ApplicationError> {
            for entity in entities {
                self.update(entity, cancel).await?;
            }
            Ok(())
        }

        async fn delete(&self, entity: T, cancel: &CancellationToken) -> Result<(), ApplicationError> {
            ensure_live(cancel)?;
            self.session.stage(Box::new(move |tables| {
                if let Some(rows) = rows_mut::<T>(tables) {
                    rows.retain(|r| r.id() != entity.id());
                }
            }));
            Ok(())
        }

        async fn delete_range(
            &self,
            entities: Vec<T>,
            cancel: &CancellationToken,
        ) -> Result<(), ApplicationError> {
            for entity in entities {
                self.delete(entity, cancel).await?;
            }
            Ok(())
        }

        async fn save_entities(&self, cancel: &CancellationToken) -> Result<u64, ApplicationError> {
            ensure_live(cancel)?;
            Ok(self.session.save())
        }
    }

    /// Reads committed rows only.
    pub struct InMemoryQueryRepository<T> {
        db: InMemoryDatabase,
        _entity: std::marker::PhantomData<fn() -> T>,
    }

    #[async_trait]
    impl<T: Entity> QueryRepository<T> for InMemoryQueryRepository<T> {
        async fn get_by_id(
            &self,
            id: &T::Id,
            cancel: &CancellationToken,
        ) -> Result<Option<T>, ApplicationError> {
            ensure_live(cancel)?;
            Ok(self.db.rows::<T>().into_iter().find(|r| r.id() == id))
        }

        async fn list(
            &self,
            spec: &Specification<T>,
            cancel: &CancellationToken,
        ) -> Result<Vec<T>, ApplicationError> {
            ensure_live(cancel)?;
            evaluate(spec, self.db.rows::<T>(), T::NAME)
        }

        async fn count(
            &self,
            spec: &Specification<T>,
            cancel: &CancellationToken,
        ) -> Result<u64, ApplicationError> {
            ensure_live(cancel)?;
            count_matching(&spec.criteria(), &self.db.rows::<T>(), T::NAME)
        }
    }

    pub struct InMemoryUnitOfWork {
        session: Arc<InMemorySession>,
        repositories: Repositories,
    }

    #[async_trait]
    impl UnitOfWork for InMemoryUnitOfWork {
        async fn begin_transaction(
            &self,
            cancel: &CancellationToken,
        ) -> Result<TransactionHandle, ApplicationError> {
            ensure_live(cancel)?;
            let mut current = self.session.transaction.lock().unwrap();
            if let Some(handle) = *current {
                tracing::warn!(%handle, "Transaction already in progress");
                return Ok(handle);
            }
            let handle = TransactionHandle::new();
            *current = Some(handle);
            self.session.db.stats.begins.fetch_add(1, Ordering::SeqCst);
            Ok(handle)
        }

        async fn commit_transaction(
            &self,
            handle: TransactionHandle,
            cancel: &CancellationToken,
        ) -> Result<(), ApplicationError> {
            match self.current_transaction() {
                None => return Err(AppError::NoActiveTransaction.into()),
                Some(current) if current != handle => {
                    return Err(AppError::TransactionNotCurrent(handle.id()).into());
                }
                Some(_) => {}
            }

            if let Err(err) = ensure_live(cancel) {
                self.rollback_transaction().await?;
                return Err(err);
            }

            self.session.save();
            let flushed: Vec<Change> = self.session.flushed.lock().unwrap().drain(..).collect();
            self.session.db.apply(flushed);
            *self.session.transaction.lock().unwrap() = None;
            self.session.db.stats.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback_transaction(&self) -> Result<(), ApplicationError> {
            if self.current_transaction().is_none() {
                tracing::warn!("No transaction to roll back");
                return Ok(());
            }
            self.session.discard();
            self.session.db.stats.rollbacks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn current_transaction(&self) -> Option<TransactionHandle> {
            *self.session.transaction.lock().unwrap()
        }

        async fn save_changes(&self, cancel: &CancellationToken) -> Result<u64, ApplicationError> {
            ensure_live(cancel)?;
            Ok(self.session.save())
        }

        fn repositories(&self) -> &Repositories {
            &self.repositories
        }
    }

    pub struct InMemoryUnitOfWorkProvider {
        db: InMemoryDatabase,
    }

    impl UnitOfWorkProvider for InMemoryUnitOfWorkProvider {
        fn create(&self, stamper: ChangeStamper) -> Arc<dyn UnitOfWork> {
            self.db.unit_of_work_as(stamper)
        }
    }

    /// A context over a fresh unit of work of `db`, for calling handlers
    /// directly.
    pub fn request_context(db: &InMemoryDatabase) -> RequestContext {
        RequestContext {
            uow: db.unit_of_work(),
            user: Arc::new(AnonymousUser),
            cancellation: CancellationToken::new(),
            config: Arc::new(Config::default()),
            clock: Arc::new(SystemClock),
        }
    }

    // ---------------------------------------------------------------
    // Collaborators
    // ---------------------------------------------------------------

    /// Forwards every record to a channel.
    pub struct ChannelAuditSink {
        sender: mpsc::UnboundedSender<AuditRecord>,
    }

    impl ChannelAuditSink {
        pub fn new() -> (Self, mpsc::UnboundedReceiver<AuditRecord>) {
            let (sender, receiver) = mpsc::unbounded_channel();
            (Self { sender }, receiver)
        }
    }

    #[async_trait]
    impl AuditSink for ChannelAuditSink {
        async fn record(&self, record: AuditRecord) -> Result<(), ApplicationError> {
            self.sender
                .send(record)
                .map_err(|e| ApplicationError::Infrastructure(e.to_string()))
        }
    }

    pub struct FailingAuditSink;

    #[async_trait]
    impl AuditSink for FailingAuditSink {
        async fn record(&self, _record: AuditRecord) -> Result<(), ApplicationError> {
            Err(ApplicationError::Infrastructure(
                "audit store unavailable".to_string(),
            ))
        }
    }

    pub struct FixedClock(pub DateTime<Utc>);

    impl Clock for FixedClock {
        fn now_utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    // ---------------------------------------------------------------
    // Widget requests and handlers
    // ---------------------------------------------------------------

    #[derive(Debug, Clone, Serialize)]
    pub struct CreateWidget {
        pub name: String,
        pub price: f64,
    }

    impl Request for CreateWidget {
        type Response = Outcome<Uuid>;
        const KIND: RequestKind = RequestKind::Command;

        fn entity_type() -> &'static str {
            Widget::NAME
        }
    }

    /// Raw-response command: failures come back as `Err`.
    #[derive(Debug, Clone, Serialize)]
    pub struct ImportWidgets {
        pub names: Vec<String>,
    }

    impl Request for ImportWidgets {
        type Response = u64;
        const KIND: RequestKind = RequestKind::Command;
    }

    #[derive(Debug, Clone, Default, Serialize)]
    pub struct GetWidgets {
        pub page: PagedAndSortedRequest,
        pub search: Option<String>,
    }

    impl Request for GetWidgets {
        type Response = Outcome<PagedResponse<Widget>>;
        const KIND: RequestKind = RequestKind::Query;
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CountWidgets;

    impl Request for CountWidgets {
        type Response = u64;
        const KIND: RequestKind = RequestKind::Query;
    }

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mode {
        Succeed,
        Fail,
        CancelMidway,
    }

    /// Stages a new widget owned by the current user; can be told to fail
    /// or to cancel its own request after staging.
    #[derive(Clone)]
    pub struct CreateWidgetHandler {
        calls: Arc<AtomicUsize>,
        mode: Mode,
        message: String,
    }

    impl CreateWidgetHandler {
        pub fn new() -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                mode: Mode::Succeed,
                message: String::new(),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                mode: Mode::Fail,
                message: message.to_string(),
                ..Self::new()
            }
        }

        pub fn cancelling() -> Self {
            Self {
                mode: Mode::CancelMidway,
                ..Self::new()
            }
        }

        /// Shared call counter; clones see the same count.
        pub fn calls(&self) -> Arc<AtomicUsize> {
            self.calls.clone()
        }
    }

    #[async_trait]
    impl RequestHandler<CreateWidget> for CreateWidgetHandler {
        async fn handle(
            &self,
            command: CreateWidget,
            ctx: &RequestContext,
        ) -> Result<Outcome<Uuid>, ApplicationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let owner = ctx.user.user_name().unwrap_or_else(|| "anonymous".into());
            let widget = WidgetFactory::new()
                .name(&command.name)
                .price(command.price)
                .owner(&owner, "")
                .build();
            let widget = ctx
                .commands::<Widget>()?
                .add(widget, &ctx.cancellation)
                .await?;

            match self.mode {
                Mode::Succeed => Ok(Outcome::success(widget.id)),
                Mode::Fail => Err(ApplicationError::Infrastructure(self.message.clone())),
                Mode::CancelMidway => {
                    ctx.cancellation.cancel();
                    Ok(Outcome::success(widget.id))
                }
            }
        }
    }

    pub struct ImportWidgetsHandler;

    #[async_trait]
    impl RequestHandler<ImportWidgets> for ImportWidgetsHandler {
        async fn handle(
            &self,
            command: ImportWidgets,
            ctx: &RequestContext,
        ) -> Result<u64, ApplicationError> {
            let widgets = command
                .names
                .iter()
                .map(|name| WidgetFactory::new().name(name).build())
                .collect();
            let added = ctx
                .commands::<Widget>()?
                .add_range(widgets, &ctx.cancellation)
                .await?;
            Ok(added.len() as u64)
        }
    }

    pub struct GetWidgetsHandler;

    #[async_trait]
    impl RequestHandler<GetWidgets> for GetWidgetsHandler {
        async fn handle(
            &self,
            query: GetWidgets,
            ctx: &RequestContext,
        ) -> Result<Outcome<PagedResponse<Widget>>, ApplicationError> {
            let page = query.page.page();
            let spec = Specification::<Widget>::new().compose(&query.page, query.search.as_deref());

            let (items, total) = ctx
                .queries::<Widget>()?
                .page(&spec, page, &ctx.cancellation)
                .await?;

            Ok(Outcome::success(PagedResponse::new(items, page, total)))
        }
    }

    pub struct CountWidgetsHandler;

    #[async_trait]
    impl RequestHandler<CountWidgets> for CountWidgetsHandler {
        async fn handle(
            &self,
            _query: CountWidgets,
            ctx: &RequestContext,
        ) -> Result<u64, ApplicationError> {
            ctx.queries::<Widget>()?
                .count_all(&ctx.cancellation)
                .await
        }
    }

    pub fn create_widget_rules() -> RuleSet<CreateWidget> {
        RuleSet::new()
            .not_empty("name", |c: &CreateWidget| c.name.as_str())
            .max_length("name", 50, |c: &CreateWidget| c.name.as_str())
            .ensure("price", "GreaterThanOrEqual", "'price' must not be negative.", |c: &CreateWidget| {
                c.price >= 0.0
            })
    }

    /// Answers with fixed errors after a delay, to exercise ordering of
    /// concurrently running validators.
    pub struct DelayedValidator {
        delay: Duration,
        errors: Vec<ValidationError>,
    }

    impl DelayedValidator {
        pub fn new(delay: Duration, errors: Vec<ValidationError>) -> Self {
            Self { delay, errors }
        }
    }

    #[async_trait]
    impl<R: Request> Validator<R> for DelayedValidator {
        async fn validate(&self, _request: &R, _ctx: &RequestContext) -> ValidationResult {
            tokio::time::sleep(self.delay).await;
            ValidationResult::with_errors(self.errors.clone())
        }
    }

    /// Fails the test if it's ever called.
    pub struct UnreachableHandler;

    #[async_trait]
    impl<R: Request> RequestHandler<R> for UnreachableHandler {
        async fn handle(&self, _request: R, _ctx: &RequestContext) -> Result<R::Response, ApplicationError> {
            panic!("{} should not have reached its handler", R::name());
        }
    }
}
