//! Batch commit engine: atomically turns confirmed candidate batches into
//! ledger rows, with idempotent replay and category resolution.

pub use categories::Category;
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder};
pub use transactions::Transaction;
pub use wallets::Wallet;

mod batches;
mod categories;
mod error;
mod ops;
mod transactions;
mod users;
mod util;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
