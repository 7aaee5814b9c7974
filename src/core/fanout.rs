//! Concurrent retrieval of every resource of a link.

use super::models::{
    Account, Credentials, DateRange, IncomeStream, Owner, RecurringExpense, Transaction,
};
use super::provider::{BankingDataProvider, FetchError, FetchFailure, FetchResult, ResourceKind};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FanOutOptions {
    /// Upper bound for each individual fetch.
    pub fetch_timeout: Duration,
    pub transaction_window: DateRange,
    pub include_recurring_expenses: bool,
}

/// Outcome of every fetch issued for one link. Each field succeeded or failed
/// on its own.
#[derive(Debug, Clone)]
pub struct LinkResources {
    pub owners: FetchResult<Owner>,
    pub accounts: FetchResult<Account>,
    pub transactions: FetchResult<Transaction>,
    pub incomes: FetchResult<IncomeStream>,
    /// `None` when recurring expenses were not requested.
    pub recurring_expenses: Option<FetchResult<RecurringExpense>>,
}

impl LinkResources {
    pub fn failures(&self) -> Vec<&FetchError> {
        [
            self.owners.as_ref().err(),
            self.accounts.as_ref().err(),
            self.transactions.as_ref().err(),
            self.incomes.as_ref().err(),
            self.recurring_expenses.as_ref().and_then(|r| r.as_ref().err()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn unavailable(&self) -> Vec<ResourceKind> {
        self.failures().iter().map(|e| e.resource).collect()
    }
}

/// Issues one fetch per resource kind for `link_id` and waits for all of them.
///
/// No fetch can cut the others short: a failure, timeout or panic becomes
/// that resource's error while the remaining fetches run to completion.
pub async fn fetch_link_resources(
    provider: &dyn BankingDataProvider,
    link_id: &str,
    credentials: &Credentials,
    options: &FanOutOptions,
) -> LinkResources {
    let timeout = options.fetch_timeout;
    let window = options.transaction_window;

    let recurring = async {
        if options.include_recurring_expenses {
            Some(
                guarded(
                    ResourceKind::RecurringExpenses,
                    timeout,
                    provider.list_recurring_expenses(link_id, credentials),
                )
                .await,
            )
        } else {
            None
        }
    };

    let (owners, accounts, transactions, incomes, recurring_expenses) = futures::join!(
        guarded(
            ResourceKind::Owners,
            timeout,
            provider.list_owners(link_id, credentials)
        ),
        guarded(
            ResourceKind::Accounts,
            timeout,
            provider.list_accounts(link_id, credentials)
        ),
        guarded(
            ResourceKind::Transactions,
            timeout,
            provider.list_transactions(link_id, credentials, Some(window))
        ),
        guarded(
            ResourceKind::Incomes,
            timeout,
            provider.list_incomes(link_id, credentials)
        ),
        recurring,
    );

    LinkResources {
        owners,
        accounts,
        transactions,
        incomes,
        recurring_expenses,
    }
}

async fn guarded<T, F>(resource: ResourceKind, timeout: Duration, fetch: F) -> FetchResult<T>
where
    F: Future<Output = FetchResult<T>>,
{
    let started = Instant::now();
    let result = match tokio::time::timeout(timeout, AssertUnwindSafe(fetch).catch_unwind()).await
    {
        Ok(Ok(result)) => result,
        Ok(Err(panic)) => Err(FetchError::new(
            resource,
            FetchFailure::Panicked(panic_message(panic.as_ref())),
        )),
        Err(_) => Err(FetchError::new(resource, FetchFailure::TimedOut(timeout))),
    };

    match &result {
        Ok(items) => debug!(
            %resource,
            count = items.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched resource"
        ),
        Err(e) => warn!(
            %resource,
            error = %e,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Resource fetch failed"
        ),
    }
    result
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
