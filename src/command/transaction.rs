//! Commit-or-rollback wrapper for commands that touch a persistent store.

use crate::command::error::CommandError;
use crate::result::HierarchicalResult;

/// The store side of a transaction. Implemented by whatever persistence
/// layer a command writes to.
pub trait TransactionStore {
    fn open_transactions(&self) -> usize;
    fn begin(&mut self);
    fn commit(&mut self);
    fn rollback(&mut self);
}

/// Run `body` inside a transaction unless one is already open, in which case
/// the enclosing transaction owns commit/rollback. A not-ok result or an
/// error from `body` rolls back.
pub fn execute_in_transaction<S, F>(
    store: &mut S,
    result: &mut HierarchicalResult,
    body: F,
) -> Result<(), CommandError>
where
    S: TransactionStore + ?Sized,
    F: FnOnce(&mut S, &mut HierarchicalResult) -> Result<(), CommandError>,
{
    if store.open_transactions() >= 1 {
        return body(store, result);
    }

    result.info("start_transaction");
    store.begin();
    let outcome = body(store, result);
    if outcome.is_ok() && result.is_ok() {
        result.info("end_transaction");
        store.commit();
    } else {
        result.info("rollback_transaction");
        store.rollback();
    }
    outcome
}
