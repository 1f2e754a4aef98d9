//! Transaction guards
//!
//! This module provides RAII transaction scopes over a [`Session`]:
//! - Scopes automatically roll back when dropped (unless finished)
//! - Nested scopes join the enclosing transaction
//! - A rollback in any scope makes the whole transaction roll back

use crate::error::{Error, Result};
use crate::result::TypedResult;
use graphtx::{QueryResult, Session, TransactionDefinition, Value};

/// An open transaction scope on a session
///
/// Scopes borrow the session mutably, so an inner scope must end before the
/// outer one can be used again. The physical transaction ends when the
/// outermost scope ends.
///
/// # Examples
///
/// ```no_run
/// use graphtx_sdk::{MemoryBackend, QueryEngine, SessionExt, TransactionDefinition};
///
/// # fn main() -> Result<(), graphtx_sdk::Error> {
/// let engine = QueryEngine::new(MemoryBackend::new());
/// let mut session = engine.session();
///
/// let mut tx = session.transaction()?;
/// tx.execute("CREATE (p:Person {name: 'Alice'})")?;
/// {
///     let mut inner = tx.nested(&TransactionDefinition::nested())?;
///     inner.execute("CREATE (p:Person {name: 'Bob'})")?;
///     // inner is dropped here and rolls back, poisoning the outer scope
/// }
/// tx.commit()?; // physically rolls back
/// # Ok(())
/// # }
/// ```
pub struct Transaction<'s> {
    session: &'s mut Session,
    /// Session depth right after this scope began
    depth: usize,
    finished: bool,
    drop_behavior: DropBehavior,
}

/// Behavior when a transaction is dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropBehavior {
    /// Rollback the transaction when dropped (default)
    #[default]
    Rollback,
    /// Commit the transaction when dropped
    Commit,
    /// Panic if the transaction is dropped without explicit commit/rollback
    Panic,
    /// Do nothing when dropped (dangerous - for special cases only)
    Ignore,
}

impl<'s> Transaction<'s> {
    /// Begin a scope with the given definition
    pub fn begin(session: &'s mut Session, definition: &TransactionDefinition) -> Result<Self> {
        session.begin(definition)?;
        Ok(Self::opened(session))
    }

    /// Begin a scope with the engine's default definition
    pub fn begin_default(session: &'s mut Session) -> Result<Self> {
        session.begin_default()?;
        Ok(Self::opened(session))
    }

    fn opened(session: &'s mut Session) -> Self {
        let depth = session.depth();
        Transaction {
            session,
            depth,
            finished: false,
            drop_behavior: DropBehavior::default(),
        }
    }

    /// Nesting depth of this scope (1 for the outermost)
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_rollback_only(&self) -> bool {
        self.session.is_rollback_only()
    }

    /// Execute a query within this scope
    pub fn execute(&mut self, query: &str) -> Result<QueryResult> {
        self.ensure_current()?;
        Ok(self.session.execute(query)?)
    }

    /// Execute a query with positional parameters within this scope
    pub fn execute_params(&mut self, query: &str, params: &[Value]) -> Result<QueryResult> {
        self.ensure_current()?;
        Ok(self.session.execute_params(query, params)?)
    }

    /// Execute a query and materialize its rows
    pub fn query(&mut self, query: &str) -> Result<TypedResult> {
        TypedResult::collect(self.execute(query)?)
    }

    /// Open an inner scope joining this transaction
    pub fn nested(&mut self, definition: &TransactionDefinition) -> Result<Transaction<'_>> {
        self.ensure_current()?;
        Transaction::begin(&mut *self.session, definition)
    }

    /// Force the whole transaction to roll back when it ends
    pub fn set_rollback_only(&mut self) {
        self.session.mark_rollback_only();
    }

    /// End this scope; the outermost scope physically commits
    pub fn commit(mut self) -> Result<()> {
        self.commit_internal()
    }

    /// End this scope and mark the whole transaction rollback-only
    pub fn rollback(mut self) -> Result<()> {
        self.rollback_internal()
    }

    /// Set the behavior when this transaction is dropped
    pub fn set_drop_behavior(&mut self, behavior: DropBehavior) {
        self.drop_behavior = behavior;
    }

    fn ensure_current(&self) -> Result<()> {
        if self.finished {
            return Err(Error::Transaction(
                "Transaction already finished".to_string(),
            ));
        }
        if self.session.depth() != self.depth {
            return Err(Error::Transaction(format!(
                "Scope at depth {} used while session is at depth {}",
                self.depth,
                self.session.depth()
            )));
        }
        Ok(())
    }

    fn commit_internal(&mut self) -> Result<()> {
        self.ensure_current()?;
        self.finished = true;
        Ok(self.session.commit()?)
    }

    fn rollback_internal(&mut self) -> Result<()> {
        self.ensure_current()?;
        self.finished = true;
        Ok(self.session.rollback()?)
    }
}

impl<'s> Drop for Transaction<'s> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        match self.drop_behavior {
            DropBehavior::Rollback => {
                if let Err(e) = self.rollback_internal() {
                    log::warn!("Failed to rollback transaction on drop: {}", e);
                }
            }
            DropBehavior::Commit => {
                if let Err(e) = self.commit_internal() {
                    log::warn!("Failed to commit transaction on drop: {}", e);
                }
            }
            DropBehavior::Panic => {
                if !std::thread::panicking() {
                    panic!("Transaction dropped without explicit commit or rollback");
                }
            }
            DropBehavior::Ignore => {}
        }
    }
}

/// Transaction entry points on [`Session`]
pub trait SessionExt {
    /// Begin a scope with the engine's default definition
    fn transaction(&mut self) -> Result<Transaction<'_>>;

    fn transaction_with(&mut self, definition: &TransactionDefinition) -> Result<Transaction<'_>>;
}

impl SessionExt for Session {
    fn transaction(&mut self) -> Result<Transaction<'_>> {
        Transaction::begin_default(self)
    }

    fn transaction_with(&mut self, definition: &TransactionDefinition) -> Result<Transaction<'_>> {
        Transaction::begin(self, definition)
    }
}

/// Run `f` inside a transaction scope
///
/// The scope commits when `f` returns `Ok` and rolls back when it returns
/// `Err`; the closure's error is returned unchanged.
pub fn with_transaction<T, F>(
    session: &mut Session,
    definition: &TransactionDefinition,
    f: F,
) -> Result<T>
where
    F: FnOnce(&mut Transaction<'_>) -> Result<T>,
{
    let mut tx = Transaction::begin(session, definition)?;
    match f(&mut tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_error) = tx.rollback() {
                log::warn!(
                    "Rollback after failed transaction body failed: {}",
                    rollback_error
                );
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphtx::{MemoryBackend, QueryEngine};

    fn engine() -> (QueryEngine, MemoryBackend) {
        let backend = MemoryBackend::new();
        (QueryEngine::new(backend.clone()), backend)
    }

    #[test]
    fn test_drop_behavior() {
        assert_eq!(DropBehavior::default(), DropBehavior::Rollback);
        assert_ne!(DropBehavior::Rollback, DropBehavior::Commit);
    }

    #[test]
    fn test_explicit_commit() {
        let (engine, backend) = engine();
        let mut session = engine.session();

        let mut tx = session.transaction().unwrap();
        assert_eq!(tx.depth(), 1);
        tx.execute("CREATE (p:Person {name: 'Alice'})").unwrap();
        tx.commit().unwrap();

        assert_eq!(backend.commits(), 1);
        assert_eq!(session.depth(), 0);
    }

    #[test]
    fn test_drop_rolls_back() {
        let (engine, backend) = engine();
        let mut session = engine.session();
        {
            let mut tx = session.transaction().unwrap();
            tx.execute("CREATE (p:Person {name: 'Charlie'})").unwrap();
        }

        assert_eq!(backend.rollbacks(), 1);
        assert_eq!(backend.commits(), 0);
        assert_eq!(session.depth(), 0);
    }

    #[test]
    fn test_drop_behavior_commit() {
        let (engine, backend) = engine();
        let mut session = engine.session();
        {
            let mut tx = session.transaction().unwrap();
            tx.set_drop_behavior(DropBehavior::Commit);
        }
        assert_eq!(backend.commits(), 1);
    }

    #[test]
    fn test_dropped_inner_scope_poisons_outer() {
        let (engine, backend) = engine();
        let mut session = engine.session();

        let mut tx = session.transaction().unwrap();
        {
            let mut inner = tx.nested(&TransactionDefinition::nested()).unwrap();
            assert_eq!(inner.depth(), 2);
            inner.execute("CREATE (n:Temp)").unwrap();
        }
        assert!(tx.is_rollback_only());
        tx.commit().unwrap();

        assert_eq!(backend.commits(), 0);
        assert_eq!(backend.rollbacks(), 1);
    }

    #[test]
    fn test_inner_commit_then_outer_commit() {
        let (engine, backend) = engine();
        let mut session = engine.session();

        let mut tx = session.transaction().unwrap();
        let inner = tx.nested(&TransactionDefinition::required()).unwrap();
        inner.commit().unwrap();
        tx.execute("RETURN 1").unwrap();
        tx.commit().unwrap();

        assert_eq!(backend.commits(), 1);
        assert_eq!(backend.acquisitions(), 1);
    }

    #[test]
    fn test_stale_scope_is_rejected() {
        let (engine, backend) = engine();
        let mut session = engine.session();

        let mut tx = session.transaction().unwrap();
        let mut inner = tx.nested(&TransactionDefinition::required()).unwrap();
        inner.set_drop_behavior(DropBehavior::Ignore);
        drop(inner);

        // The ignored inner scope is still open on the session
        let err = tx.execute("RETURN 1").unwrap_err();
        assert!(matches!(err, Error::Transaction(_)));
        tx.set_drop_behavior(DropBehavior::Ignore);
        drop(tx);

        session.commit().unwrap();
        session.commit().unwrap();
        assert_eq!(backend.commits(), 1);
    }

    #[test]
    fn test_with_transaction() {
        let (engine, backend) = engine();
        let mut session = engine.session();
        let definition = TransactionDefinition::required();

        let value = with_transaction(&mut session, &definition, |tx| {
            tx.execute("CREATE (n:Ok)")?;
            Ok(7)
        })
        .unwrap();
        assert_eq!(value, 7);

        let err = with_transaction(&mut session, &definition, |tx| -> Result<()> {
            tx.execute("CREATE (n:Bad)")?;
            Err(Error::Transaction("validation failed".to_string()))
        })
        .unwrap_err();
        assert!(matches!(err, Error::Transaction(_)));

        assert_eq!(backend.commits(), 1);
        assert_eq!(backend.rollbacks(), 1);
        assert_eq!(session.depth(), 0);
    }
}
