//! Query execution, parameter binding and result lifetime

#[path = "testutils/mod.rs"]
mod testutils;

use graphtx::{
    BackendError, BackendErrorKind, BackendEvent, EngineConfig, EngineError, Row,
    TransactionDefinition, Value,
};
use testutils::test_fixture::TestFixture;

const PEOPLE: &str = "MATCH (p:Person) RETURN p.name AS name, p.age AS age";

#[test]
fn test_execute_outside_transaction_auto_begins() {
    let fixture = TestFixture::new();
    let mut session = fixture.session();

    session
        .execute("MATCH (n) RETURN n")
        .expect("execute should open a transaction");

    assert_eq!(session.depth(), 1);
    assert!(session.has_connection());
    assert_eq!(fixture.backend.commits(), 0);
    assert_eq!(fixture.stats().auto_begins, 1);

    session.commit().unwrap();
    assert_eq!(fixture.backend.commits(), 1);
    fixture.assert_no_leaks();
}

#[test]
fn test_auto_begin_uses_configured_definition() {
    let config = EngineConfig::default()
        .with_default_definition(TransactionDefinition::requires_new().with_name("implicit"));
    let fixture = TestFixture::with_config(config);
    let mut session = fixture.session();

    session.execute("RETURN 1").unwrap();
    assert_eq!(
        session.current_definition().and_then(|d| d.name()),
        Some("implicit")
    );
    session.rollback().unwrap();
}

#[test]
fn test_strict_config_rejects_execute_outside_transaction() {
    let fixture = TestFixture::strict();
    let mut session = fixture.session();

    let err = session.execute("MATCH (n) RETURN n").unwrap_err();
    assert!(matches!(err, EngineError::NoActiveTransaction(_)));
    assert_eq!(session.depth(), 0);
    assert_eq!(fixture.backend.acquisitions(), 0);

    session.begin_default().unwrap();
    session.execute("MATCH (n) RETURN n").unwrap();
    session.commit().unwrap();
    assert_eq!(fixture.backend.commits(), 1);
}

#[test]
fn test_rows_are_fetched_lazily() {
    let fixture = TestFixture::with_people();
    let mut session = fixture.session();
    session.begin_default().unwrap();

    let mut result = session.execute(PEOPLE).unwrap();
    assert_eq!(result.columns(), &["name".to_string(), "age".to_string()]);
    assert_eq!(result.rows_read(), 0);

    let first = result.next_row().unwrap().expect("first row");
    assert_eq!(first.get("name"), Some(&Value::from("Ada")));
    assert_eq!(first.get("age").and_then(Value::as_integer), Some(36));
    assert_eq!(result.rows_read(), 1);

    let rest: Vec<Row> = result.collect_rows().unwrap();
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[1].get("name"), Some(&Value::from("Grace")));

    session.commit().unwrap();
}

#[test]
fn test_params_are_bound_positionally() {
    let fixture = TestFixture::new();
    let mut session = fixture.session();
    let query = "MATCH (p:Person {name: $1}) WHERE p.age > $2 RETURN p";
    let params = vec![Value::from("Ada"), Value::from(30)];

    session.begin_default().unwrap();
    session.execute_params(query, &params).unwrap();
    session.execute("MATCH (n) RETURN count(n)").unwrap();
    session.commit().unwrap();

    let executed: Vec<BackendEvent> = fixture
        .events()
        .into_iter()
        .filter(|e| matches!(e, BackendEvent::Executed { .. }))
        .collect();
    assert_eq!(
        executed,
        vec![
            BackendEvent::Executed {
                connection: 1,
                query: query.to_string(),
                params,
            },
            BackendEvent::Executed {
                connection: 1,
                query: "MATCH (n) RETURN count(n)".to_string(),
                params: vec![],
            },
        ]
    );
    assert_eq!(fixture.stats().queries_executed, 2);
}

#[test]
fn test_parameter_mismatch_leaves_transaction_open() {
    let fixture = TestFixture::new();
    let mut session = fixture.session();
    session.begin_default().unwrap();

    let query = "MATCH (a {id: $1}), (b {id: $2}) RETURN a, b";
    let err = session
        .execute_params(query, &[Value::from(1)])
        .unwrap_err();
    match &err {
        EngineError::QueryExecution { source, .. } => {
            assert_eq!(source.kind(), BackendErrorKind::Parameter)
        }
        other => panic!("expected query execution error, got {:?}", other),
    }
    assert_eq!(session.depth(), 1);
    assert!(session.has_connection());

    // The caller decides how to end the transaction
    session.commit().unwrap();
    assert_eq!(fixture.backend.commits(), 1);
    fixture.assert_no_leaks();
}

#[test]
fn test_backend_rejection_carries_query_text() {
    let fixture = TestFixture::new();
    fixture
        .backend
        .fail_query("RETRUN", BackendError::syntax("unexpected token RETRUN"))
        .unwrap();
    let mut session = fixture.session();
    session.begin_default().unwrap();

    let err = session.execute("MATCH (n) RETRUN n").unwrap_err();
    match err {
        EngineError::QueryExecution { query, source } => {
            assert_eq!(query, "MATCH (n) RETRUN n");
            assert_eq!(source.kind(), BackendErrorKind::Syntax);
        }
        other => panic!("expected query execution error, got {:?}", other),
    }

    session.rollback().unwrap();
    assert_eq!(fixture.stats().queries_executed, 0);
}

#[test]
fn test_result_fails_after_transaction_finishes() {
    let fixture = TestFixture::with_people();
    let mut session = fixture.session();
    session.begin_default().unwrap();

    let mut result = session.execute(PEOPLE).unwrap();
    assert!(result.next_row().unwrap().is_some());
    session.commit().unwrap();

    assert!(!result.is_attached());
    let err = result.next_row().unwrap_err();
    assert!(matches!(err, EngineError::ResultDetached));
}

#[test]
fn test_result_survives_inner_commit() {
    let fixture = TestFixture::with_people();
    let mut session = fixture.session();
    session.begin_default().unwrap();
    session.begin_default().unwrap();

    let mut result = session.execute(PEOPLE).unwrap();
    session.commit().unwrap();

    // Still the same physical transaction
    assert!(result.is_attached());
    assert!(result.next_row().unwrap().is_some());

    session.commit().unwrap();
    let next = result.next();
    assert!(matches!(next, Some(Err(EngineError::ResultDetached))));
    assert!(result.next().is_none());
}

#[test]
fn test_result_from_previous_transaction_stays_detached() {
    let fixture = TestFixture::with_people();
    let mut session = fixture.session();

    session.begin_default().unwrap();
    let mut stale = session.execute(PEOPLE).unwrap();
    session.commit().unwrap();

    session.begin_default().unwrap();
    assert!(matches!(stale.next_row(), Err(EngineError::ResultDetached)));
    let mut fresh = session.execute(PEOPLE).unwrap();
    assert!(fresh.next_row().unwrap().is_some());
    session.commit().unwrap();
}

#[test]
fn test_connection_closed_by_backend_surfaces_as_query_error() {
    let fixture = TestFixture::new();
    let mut session = fixture.session();
    session.begin_default().unwrap();
    session.execute("RETURN 1").unwrap();

    let connection = fixture.backend.live_connections()[0];
    assert!(fixture.backend.kill_connection(connection));

    let err = session.execute("RETURN 2").unwrap_err();
    assert_eq!(
        err.backend_error().map(BackendError::kind),
        Some(BackendErrorKind::Closed)
    );
    assert_eq!(session.depth(), 1);

    // Committing on a dead connection fails but still releases it
    let err = session.commit().unwrap_err();
    assert!(matches!(err, EngineError::Finish { .. }));
    assert!(!session.has_connection());
    fixture.assert_no_leaks();
}
