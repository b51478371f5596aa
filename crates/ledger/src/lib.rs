//! The merge engine: everything that happens between a reviewed
//! [`StagedImport`](ledgerport_core::StagedImport) and durable rows.
//!
//! All operations are synchronous functions over the in-memory [`Ledger`]
//! arena; persistence is the storage crate's problem. Each mutating
//! operation reports what changed via [`ChangeEvent`]s so callers can
//! refresh whatever they are showing.

pub mod commit;
pub mod delete;
pub mod edit;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod replace;
pub mod resolve;
pub mod store;
pub mod transfer;

pub use commit::{commit_import, CommitOutcome};
pub use delete::{delete_batch, DeleteOutcome};
pub use edit::{apply_user_edit, TransactionEdit};
pub use error::LedgerError;
pub use events::ChangeEvent;
pub use fingerprint::{fingerprint, staged_fingerprint, transaction_fingerprint};
pub use replace::{replace_batch, ForceKeys, ReplaceCounts, ReplaceOutcome};
pub use resolve::{resolve_accounts, ResolvedAccounts};
pub use store::Ledger;
pub use transfer::TransferReconciler;
