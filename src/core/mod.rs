//! Financial context aggregation: provider abstraction, fan-out, summary
//! derivation and the context cache.

pub mod cache;
pub mod clock;
pub mod config;
pub mod context;
pub mod fanout;
pub mod log;
pub mod models;
pub mod provider;
pub mod summary;

// Re-export main types for cleaner imports
pub use cache::{CacheEntry, ContextCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{AggregateView, AggregationOptions, ContextService};
pub use models::{Account, Credentials, DateRange, Flow, IncomeStream, Owner, Transaction};
pub use provider::{BankingDataProvider, FetchError, FetchFailure, ResourceKind};
pub use summary::FinancialSummary;
