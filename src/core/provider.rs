//! Remote banking data abstractions

use super::models::{
    Account, Credentials, DateRange, IncomeStream, Owner, RecurringExpense, Transaction,
};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Owners,
    Accounts,
    Transactions,
    Incomes,
    RecurringExpenses,
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ResourceKind::Owners => "owners",
                ResourceKind::Accounts => "accounts",
                ResourceKind::Transactions => "transactions",
                ResourceKind::Incomes => "incomes",
                ResourceKind::RecurringExpenses => "recurring expenses",
            }
        )
    }
}

/// Why a single resource could not be retrieved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchFailure {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("fetch task panicked: {0}")]
    Panicked(String),
}

/// A resource was unavailable. Every failure mode maps to this one error so
/// callers can degrade uniformly; the kind is kept for logging.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{resource} unavailable: {reason}")]
pub struct FetchError {
    pub resource: ResourceKind,
    pub reason: FetchFailure,
}

impl FetchError {
    pub fn new(resource: ResourceKind, reason: FetchFailure) -> Self {
        Self { resource, reason }
    }
}

pub type FetchResult<T> = std::result::Result<Vec<T>, FetchError>;

/// One authenticated call per method against the banking data provider.
#[async_trait]
pub trait BankingDataProvider: Send + Sync {
    async fn list_accounts(&self, link_id: &str, credentials: &Credentials)
    -> FetchResult<Account>;

    async fn list_transactions(
        &self,
        link_id: &str,
        credentials: &Credentials,
        range: Option<DateRange>,
    ) -> FetchResult<Transaction>;

    async fn list_owners(&self, link_id: &str, credentials: &Credentials) -> FetchResult<Owner>;

    async fn list_incomes(
        &self,
        link_id: &str,
        credentials: &Credentials,
    ) -> FetchResult<IncomeStream>;

    async fn list_recurring_expenses(
        &self,
        link_id: &str,
        credentials: &Credentials,
    ) -> FetchResult<RecurringExpense>;
}
