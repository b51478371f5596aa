use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("No account with id {0}")]
    UnknownAccount(i64),

    #[error("No import batch with id {0}")]
    UnknownBatch(i64),

    #[error("No transaction with id {0}")]
    UnknownTransaction(i64),

    #[error("Batch {0} has no remaining entities to infer a target account from")]
    NoAccountToInfer(i64),
}
