use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::{
    sync::{Arc, atomic::Ordering},
    time::Duration,
};
use tokio_util::sync::CancellationToken;

use tessera_app::{
    DispatchScope, Dispatcher, DispatcherBuilder,
    auditable::ChangeStamper,
    config::Config,
    services::{AuditSink, StaticUser, TracingAuditSink},
    test_utils::tests::*,
    uow::UnitOfWork,
    validation::RuleSet,
};
use tessera_core::{AppError, ApplicationError};
use tessera_types::{
    Error, ValidationError,
    audit::AuditStatus,
    grid::PagedAndSortedRequest,
};

fn builder(db: &InMemoryDatabase, sink: Arc<dyn AuditSink>) -> DispatcherBuilder {
    Dispatcher::builder(Config::default(), db.provider(), sink)
}

fn widget_dispatcher(db: &InMemoryDatabase, handler: CreateWidgetHandler) -> Dispatcher {
    builder(db, Arc::new(TracingAuditSink))
        .handler::<CreateWidget, _>(handler)
        .validator::<CreateWidget, _>(create_widget_rules())
        .handler::<GetWidgets, _>(GetWidgetsHandler)
        .build()
        .unwrap()
}

fn create(name: &str) -> CreateWidget {
    CreateWidget {
        name: name.to_string(),
        price: 4.5,
    }
}

#[tokio::test]
async fn invalid_command_never_reaches_handler_or_transaction() {
    let db = InMemoryDatabase::new();
    let handler = CreateWidgetHandler::new();
    let calls = handler.calls();
    let dispatcher = widget_dispatcher(&db, handler);

    let outcome = dispatcher.dispatch(create("")).await.unwrap();

    assert!(outcome.is_failure());
    assert_eq!(outcome.error().code(), Error::VALIDATION_FAILED.code());
    assert_eq!(outcome.validation_errors().len(), 1);
    assert_eq!(outcome.validation_errors()[0].property_name, "name");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(db.stats().begins(), 0);
}

#[tokio::test]
async fn valid_command_is_saved_and_committed() {
    let db = InMemoryDatabase::new();
    let dispatcher = widget_dispatcher(&db, CreateWidgetHandler::new());

    let scope = DispatchScope::new(StaticUser::new("7", "ada"));
    let outcome = dispatcher.dispatch_with(create("gear"), scope).await.unwrap();

    let id = outcome.into_value().unwrap();
    let rows = db.rows::<Widget>();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, id);
    assert_eq!(rows[0].owner.name, "ada");
    assert_eq!(db.stats().begins(), 1);
    assert_eq!(db.stats().commits(), 1);
    assert_eq!(db.stats().rollbacks(), 0);
}

#[tokio::test]
async fn writes_stamp_the_acting_user_and_clock() {
    let db = InMemoryDatabase::new();
    let created = Utc.with_ymd_and_hms(2025, 5, 4, 8, 30, 0).unwrap();
    let dispatcher = builder(&db, Arc::new(TracingAuditSink))
        .clock(Arc::new(FixedClock(created)))
        .handler::<CreateWidget, _>(CreateWidgetHandler::new())
        .build()
        .unwrap();

    let scope = DispatchScope::new(StaticUser::new("7", "ada"));
    dispatcher.dispatch_with(create("gear"), scope).await.unwrap();

    let mut widget = db.rows::<Widget>().remove(0);
    assert_eq!(widget.created_by.as_deref(), Some("7"));
    assert_eq!(widget.created_at, created);
    assert_eq!(widget.last_modified_by, None);
    assert_eq!(widget.last_modified_at, None);

    let modified = created + ChronoDuration::hours(2);
    let uow = db.unit_of_work_as(ChangeStamper::new(
        Arc::new(StaticUser::new("9", "grace")),
        Arc::new(FixedClock(modified)),
    ));
    let cancel = CancellationToken::new();
    widget.price = 9.0;
    uow.repositories()
        .commands::<Widget>()
        .unwrap()
        .update(widget, &cancel)
        .await
        .unwrap();
    uow.save_changes(&cancel).await.unwrap();

    let widget = db.rows::<Widget>().remove(0);
    assert_eq!(widget.price, 9.0);
    assert_eq!(widget.created_by.as_deref(), Some("7"));
    assert_eq!(widget.created_at, created);
    assert_eq!(widget.last_modified_by.as_deref(), Some("9"));
    assert_eq!(widget.last_modified_at, Some(modified));
}

#[tokio::test]
async fn second_page_of_twenty_five_widgets() {
    let db = InMemoryDatabase::new();
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    db.seed((0..25).map(|i| {
        let mut widget = WidgetFactory::new().name(&format!("w{i:02}")).build();
        widget.created_at = start + ChronoDuration::seconds(i);
        widget
    }));
    let dispatcher = widget_dispatcher(&db, CreateWidgetHandler::new());

    let outcome = dispatcher
        .dispatch(GetWidgets {
            page: PagedAndSortedRequest::new(2, 10, None, None),
            search: None,
        })
        .await
        .unwrap();

    let page = outcome.into_value().unwrap();
    assert_eq!(page.items().len(), 10);
    assert_eq!(page.page_index(), 2);
    assert_eq!(page.total_count(), 25);
    assert_eq!(page.total_pages(), 3);
    assert!(page.has_next_page());
    assert!(page.has_previous_page());
    assert_eq!(page.items()[0].name, "w10");
}

#[tokio::test]
async fn search_and_sort_narrow_the_page() {
    let db = InMemoryDatabase::new();
    db.seed([
        WidgetFactory::new().name("cog").owner("bob", "b@x.io").price(3.0).build(),
        WidgetFactory::new().name("gear").owner("amy", "a@x.io").price(2.0).build(),
        WidgetFactory::new().name("big gear").owner("zed", "z@x.io").price(9.0).build(),
    ]);
    let dispatcher = widget_dispatcher(&db, CreateWidgetHandler::new());

    let outcome = dispatcher
        .dispatch(GetWidgets {
            page: PagedAndSortedRequest::new(1, 10, Some("price"), Some("DESC")),
            search: Some("GEAR".into()),
        })
        .await
        .unwrap();

    let page = outcome.into_value().unwrap();
    let names: Vec<_> = page.items().iter().map(|w| w.name.as_str()).collect();
    assert_eq!(page.total_count(), 2);
    assert_eq!(names, ["big gear", "gear"]);
}

#[tokio::test]
async fn handler_error_becomes_operation_failed_without_saving() {
    let db = InMemoryDatabase::new();
    let dispatcher = widget_dispatcher(&db, CreateWidgetHandler::failing("disk full"));

    let outcome = dispatcher.dispatch(create("gear")).await.unwrap();

    assert!(outcome.is_failure());
    assert_eq!(outcome.error().code(), Error::OPERATION_FAILED.code());
    assert!(outcome.error().details().contains("disk full"));
    assert_eq!(db.stats().saves(), 0);
    assert_eq!(db.stats().rollbacks(), 1);
    assert!(db.rows::<Widget>().is_empty());
}

#[tokio::test]
async fn cancelled_command_never_commits() {
    let db = InMemoryDatabase::new();
    let dispatcher = widget_dispatcher(&db, CreateWidgetHandler::cancelling());

    let outcome = dispatcher.dispatch(create("gear")).await.unwrap();

    assert_eq!(outcome.error().code(), Error::OPERATION_FAILED.code());
    assert_eq!(outcome.error().details(), "The operation was cancelled");
    assert_eq!(db.stats().commits(), 0);
    assert!(db.rows::<Widget>().is_empty());
}

#[tokio::test]
async fn command_cancelled_up_front_skips_the_handler() {
    let db = InMemoryDatabase::new();
    let handler = CreateWidgetHandler::new();
    let calls = handler.calls();
    let dispatcher = widget_dispatcher(&db, handler);

    let token = CancellationToken::new();
    token.cancel();
    let scope = DispatchScope::default().with_cancellation(token);
    let outcome = dispatcher.dispatch_with(create("gear"), scope).await.unwrap();

    assert!(outcome.is_failure());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(db.rows::<Widget>().is_empty());
}

#[tokio::test]
async fn audit_records_successful_commands() {
    let db = InMemoryDatabase::new();
    let (sink, mut records) = ChannelAuditSink::new();
    let at = Utc.with_ymd_and_hms(2025, 5, 4, 3, 2, 1).unwrap();
    let dispatcher = builder(&db, Arc::new(sink))
        .handler::<CreateWidget, _>(CreateWidgetHandler::new())
        .handler::<GetWidgets, _>(GetWidgetsHandler)
        .clock(Arc::new(FixedClock(at)))
        .build()
        .unwrap();

    let user = StaticUser::new("7", "ada").with_ip_address("10.0.0.1");
    // queries are never audited, so the first record is the command's
    dispatcher
        .dispatch_with(GetWidgets::default(), DispatchScope::new(user.clone()))
        .await
        .unwrap();
    dispatcher
        .dispatch_with(create("gear"), DispatchScope::new(user))
        .await
        .unwrap();

    let record = records.recv().await.unwrap();
    assert_eq!(record.action, "CreateWidget");
    assert_eq!(record.entity_type, "Widget");
    assert_eq!(record.user_id.as_deref(), Some("7"));
    assert_eq!(record.user_name.as_deref(), Some("ada"));
    assert_eq!(record.ip_address.as_deref(), Some("10.0.0.1"));
    assert_eq!(record.timestamp, at);
    assert_eq!(record.status, AuditStatus::Success);
    assert!(record.data.unwrap().contains("\"name\":\"gear\""));
}

#[tokio::test]
async fn audit_records_failed_commands() {
    let db = InMemoryDatabase::new();
    let (sink, mut records) = ChannelAuditSink::new();
    let dispatcher = builder(&db, Arc::new(sink))
        .handler::<CreateWidget, _>(CreateWidgetHandler::failing("disk full"))
        .build()
        .unwrap();

    dispatcher.dispatch(create("gear")).await.unwrap();

    let record = records.recv().await.unwrap();
    assert_eq!(record.status, AuditStatus::Failure);
    assert!(record.error_message.unwrap().contains("disk full"));
}

#[tokio::test]
async fn audit_redacts_configured_fields() {
    let db = InMemoryDatabase::new();
    let (sink, mut records) = ChannelAuditSink::new();
    let config = Config {
        audit_redacted_fields: vec!["Name".to_string()],
        ..Config::default()
    };
    let dispatcher = Dispatcher::builder(config, db.provider(), Arc::new(sink))
        .handler::<CreateWidget, _>(CreateWidgetHandler::new())
        .build()
        .unwrap();

    dispatcher.dispatch(create("secret")).await.unwrap();

    let data = records.recv().await.unwrap().data.unwrap();
    assert!(data.contains("\"name\":\"***\""));
    assert!(!data.contains("secret"));
}

#[tokio::test]
async fn disabled_audit_records_nothing() {
    let db = InMemoryDatabase::new();
    let (sink, mut records) = ChannelAuditSink::new();
    let config = Config {
        audit_enabled: false,
        ..Config::default()
    };
    let dispatcher = Dispatcher::builder(config, db.provider(), Arc::new(sink))
        .handler::<CreateWidget, _>(CreateWidgetHandler::new())
        .build()
        .unwrap();

    dispatcher.dispatch(create("gear")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(records.try_recv().is_err());
}

#[tokio::test]
async fn failing_audit_sink_does_not_change_the_response() {
    let db = InMemoryDatabase::new();
    let dispatcher = builder(&db, Arc::new(FailingAuditSink))
        .handler::<CreateWidget, _>(CreateWidgetHandler::new())
        .build()
        .unwrap();

    let outcome = dispatcher.dispatch(create("gear")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(outcome.is_success());
    assert_eq!(db.rows::<Widget>().len(), 1);
}

#[tokio::test]
async fn validator_errors_keep_registration_order() {
    let db = InMemoryDatabase::new();
    let slow = DelayedValidator::new(
        Duration::from_millis(30),
        vec![ValidationError::new("Slow", "first", "name")],
    );
    let fast = DelayedValidator::new(
        Duration::ZERO,
        vec![
            ValidationError::new("Fast", "second", "price"),
            ValidationError::new("Fast", "third", "price"),
        ],
    );
    let dispatcher = builder(&db, Arc::new(TracingAuditSink))
        .handler::<CreateWidget, _>(CreateWidgetHandler::new())
        .validator::<CreateWidget, _>(slow)
        .validator::<CreateWidget, _>(fast)
        .build()
        .unwrap();

    let outcome = dispatcher.dispatch(create("gear")).await.unwrap();

    let messages: Vec<_> = outcome
        .validation_errors()
        .iter()
        .map(|e| e.message.as_str())
        .collect();
    assert_eq!(messages, ["first", "second", "third"]);
}

#[tokio::test]
async fn validation_errors_are_capped_when_configured() {
    let db = InMemoryDatabase::new();
    let config = Config {
        max_validation_errors: Some(1),
        ..Config::default()
    };
    let dispatcher = Dispatcher::builder(config, db.provider(), Arc::new(TracingAuditSink))
        .handler::<CreateWidget, _>(CreateWidgetHandler::new())
        .validator::<CreateWidget, _>(create_widget_rules())
        .build()
        .unwrap();

    let outcome = dispatcher
        .dispatch(CreateWidget {
            name: String::new(),
            price: -1.0,
        })
        .await
        .unwrap();

    assert_eq!(outcome.validation_errors().len(), 1);
    assert_eq!(outcome.validation_errors()[0].property_name, "name");
}

#[tokio::test]
async fn raw_responses_surface_errors() {
    let db = InMemoryDatabase::new();
    let rules = RuleSet::new().ensure(
        "names",
        "NotEmpty",
        "'names' must not be empty.",
        |c: &ImportWidgets| !c.names.is_empty(),
    );
    let dispatcher = builder(&db, Arc::new(TracingAuditSink))
        .handler::<ImportWidgets, _>(ImportWidgetsHandler)
        .validator::<ImportWidgets, _>(rules)
        .handler::<CountWidgets, _>(CountWidgetsHandler)
        .build()
        .unwrap();

    let err = dispatcher
        .dispatch(ImportWidgets { names: Vec::new() })
        .await
        .unwrap_err();
    match err {
        ApplicationError::Validation(errors) => assert_eq!(errors[0].property_name, "names"),
        other => panic!("expected a validation error, got {other}"),
    }

    let imported = dispatcher
        .dispatch(ImportWidgets {
            names: vec!["a".into(), "b".into()],
        })
        .await
        .unwrap();
    assert_eq!(imported, 2);
    assert_eq!(dispatcher.dispatch(CountWidgets).await.unwrap(), 2);
}

#[tokio::test]
async fn unregistered_request_is_an_error() {
    let db = InMemoryDatabase::new();
    let dispatcher = builder(&db, Arc::new(TracingAuditSink)).build().unwrap();

    let err = dispatcher.dispatch(CountWidgets).await.unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::App(AppError::NoHandler("CountWidgets"))
    ));
}

#[test]
fn build_rejects_duplicate_handlers() {
    let db = InMemoryDatabase::new();
    let result = builder(&db, Arc::new(TracingAuditSink))
        .handler::<CreateWidget, _>(CreateWidgetHandler::new())
        .handler::<CreateWidget, _>(UnreachableHandler)
        .build();

    assert!(matches!(
        result,
        Err(ApplicationError::App(AppError::DuplicateHandler("CreateWidget")))
    ));
}

#[test]
fn build_rejects_validators_without_handler() {
    let db = InMemoryDatabase::new();
    let result = builder(&db, Arc::new(TracingAuditSink))
        .validator::<CreateWidget, _>(create_widget_rules())
        .build();

    assert!(matches!(
        result,
        Err(ApplicationError::App(AppError::ValidatorWithoutHandler("CreateWidget")))
    ));
}

#[test]
fn build_rejects_missing_required_handlers() {
    let db = InMemoryDatabase::new();
    let result = builder(&db, Arc::new(TracingAuditSink))
        .handler::<CreateWidget, _>(CreateWidgetHandler::new())
        .require::<CreateWidget>()
        .require::<GetWidgets>()
        .build();

    assert!(matches!(
        result,
        Err(ApplicationError::App(AppError::NoHandler("GetWidgets")))
    ));
}
