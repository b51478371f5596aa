pub mod db;
pub mod error;

pub use db::{create_db, load_ledger, save_ledger, DbPool};
pub use error::StorageError;
