//! Detailed financial context of a link: fetch everything, summarize, cache.

use super::cache::ContextCache;
use super::clock::Clock;
use super::fanout::{FanOutOptions, LinkResources, fetch_link_resources};
use super::models::{Account, Credentials, DateRange, Transaction, owner_display_name};
use super::provider::{BankingDataProvider, ResourceKind};
use super::summary::{FinancialSummary, SummaryInputs, SummaryOptions, build_summary};
use anyhow::{Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct AggregationOptions {
    pub transaction_months: u32,
    pub fetch_timeout: Duration,
    pub include_recurring_expenses: bool,
    pub default_currency: String,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            transaction_months: 3,
            fetch_timeout: Duration::from_secs(30),
            include_recurring_expenses: false,
            default_currency: super::summary::DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Everything learned about a link in one aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateView {
    pub link_id: String,
    pub owner_name: String,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub summary: Arc<FinancialSummary>,
    /// At least one account or transaction was retrieved.
    pub has_data: bool,
    pub unavailable: Vec<ResourceKind>,
    pub account_categories: BTreeMap<String, usize>,
}

impl AggregateView {
    /// Single-line digest handed to the conversational layer.
    pub fn context_line(&self) -> String {
        let s = &self.summary;
        let currency = s.currency();
        let short_link: String = self.link_id.chars().take(8).collect();
        format!(
            "Customer: {} | Link: {} | Total Balance: {:.2} {currency} | Accounts: {} | \
             Transactions: {} | Monthly Income: {:.2} {currency} | Monthly Expenses: {:.2} {currency} | \
             Net Flow: {:.2} {currency}",
            self.owner_name,
            short_link,
            s.total_balance(),
            self.accounts.len(),
            self.transactions.len(),
            s.monthly_income(),
            s.monthly_expenses(),
            s.monthly_surplus(),
        )
    }
}

pub struct ContextService {
    provider: Arc<dyn BankingDataProvider>,
    cache: Arc<ContextCache>,
    clock: Arc<dyn Clock>,
    options: AggregationOptions,
}

impl ContextService {
    pub fn new(
        provider: Arc<dyn BankingDataProvider>,
        cache: Arc<ContextCache>,
        clock: Arc<dyn Clock>,
        options: AggregationOptions,
    ) -> Self {
        Self {
            provider,
            cache,
            clock,
            options,
        }
    }

    pub fn cache(&self) -> &Arc<ContextCache> {
        &self.cache
    }

    /// Fetches, summarizes and caches the financial context of `link_id`.
    ///
    /// Only input rejected before any fetch is an error. Unavailable resources
    /// are treated as empty and listed in [`AggregateView::unavailable`].
    #[instrument(name = "DetailedContext", skip(self, credentials), fields(link_id = %link_id))]
    pub async fn detailed_context(
        &self,
        link_id: &str,
        credentials: &Credentials,
    ) -> Result<AggregateView> {
        if link_id.trim().is_empty() {
            bail!("link_id is required");
        }

        let window = DateRange::trailing_months(self.clock.today(), self.options.transaction_months);
        let fan_out = FanOutOptions {
            fetch_timeout: self.options.fetch_timeout,
            transaction_window: window,
            include_recurring_expenses: self.options.include_recurring_expenses,
        };
        let resources =
            fetch_link_resources(self.provider.as_ref(), link_id, credentials, &fan_out).await;
        let unavailable = resources.unavailable();

        let LinkResources {
            owners,
            accounts,
            transactions,
            incomes,
            recurring_expenses,
        } = resources;
        let owners = owners.unwrap_or_default();
        let accounts = accounts.unwrap_or_default();
        let transactions = transactions.unwrap_or_default();
        let incomes = incomes.unwrap_or_default();
        let recurring_expenses = recurring_expenses.and_then(Result::ok);

        let owner_name = owner_display_name(&owners);
        let summary_options = SummaryOptions {
            // Nominal length: a start clamped to month end still spans
            // `transaction_months` months.
            window_months: f64::from(self.options.transaction_months),
            default_currency: self.options.default_currency.clone(),
        };
        let summary = Arc::new(build_summary(
            link_id,
            self.clock.now(),
            SummaryInputs {
                accounts: &accounts,
                transactions: &transactions,
                income_streams: &incomes,
                recurring_expenses: recurring_expenses.as_deref(),
            },
            &summary_options,
        ));

        self.cache
            .put(link_id, Arc::clone(&summary), &owner_name)
            .await;

        let mut account_categories = BTreeMap::new();
        for account in &accounts {
            *account_categories
                .entry(account.category.clone())
                .or_insert(0) += 1;
        }
        let has_data = !accounts.is_empty() || !transactions.is_empty();

        info!(
            owner = %owner_name,
            accounts = accounts.len(),
            transactions = transactions.len(),
            has_data,
            unavailable = unavailable.len(),
            "Aggregated link context"
        );

        Ok(AggregateView {
            link_id: link_id.to_string(),
            owner_name,
            accounts,
            transactions,
            summary,
            has_data,
            unavailable,
            account_categories,
        })
    }

    /// Previously aggregated summary for `link_id`, if still fresh.
    pub async fn cached_summary(&self, link_id: &str) -> Option<Arc<FinancialSummary>> {
        self.cache.get(link_id).await
    }

    /// Cached summary when fresh, otherwise a new aggregation.
    pub async fn summary_for(
        &self,
        link_id: &str,
        credentials: &Credentials,
    ) -> Result<Arc<FinancialSummary>> {
        if let Some(summary) = self.cached_summary(link_id).await {
            return Ok(summary);
        }
        Ok(self.detailed_context(link_id, credentials).await?.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::DEFAULT_TTL_HOURS;
    use crate::core::clock::ManualClock;
    use crate::core::fanout::mock::MockProvider;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::Ordering;

    struct Harness {
        service: ContextService,
        provider: Arc<MockProvider>,
        clock: Arc<ManualClock>,
    }

    fn harness(provider: MockProvider, options: AggregationOptions) -> Harness {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap(),
        ));
        let cache = Arc::new(ContextCache::new(
            chrono::Duration::hours(DEFAULT_TTL_HOURS),
            clock.clone(),
        ));
        let provider = Arc::new(provider);
        let service = ContextService::new(provider.clone(), cache, clock.clone(), options);
        Harness {
            service,
            provider,
            clock,
        }
    }

    fn creds() -> Credentials {
        Credentials::new("id", "key").unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[tokio::test]
    async fn test_detailed_context_full_data() {
        let h = harness(MockProvider::with_sample_data(), AggregationOptions::default());
        let view = h
            .service
            .detailed_context("8f2c9a1e-link", &creds())
            .await
            .unwrap();

        assert!(view.has_data);
        assert!(view.unavailable.is_empty());
        assert_eq!(view.owner_name, "Ana");
        assert_close(view.summary.total_balance(), 1250.5);
        assert_close(view.summary.monthly_income(), 2000.0);
        assert_close(view.summary.monthly_variable_expenses(), 1500.0);
        assert_close(view.summary.monthly_surplus(), 500.0);
        assert_eq!(view.account_categories.get("CHECKING_ACCOUNT"), Some(&2));
        assert_eq!(
            view.summary.generated_at(),
            Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap()
        );

        let range = h.provider.last_range.lock().unwrap().unwrap();
        assert_eq!(range.to.to_string(), "2025-06-15");
        assert_eq!(range.from.to_string(), "2025-03-15");
    }

    #[tokio::test]
    async fn test_result_is_cached_for_lookup() {
        let h = harness(MockProvider::with_sample_data(), AggregationOptions::default());
        assert!(h.service.cached_summary("link-1").await.is_none());

        let view = h.service.detailed_context("link-1", &creds()).await.unwrap();
        let cached = h.service.cached_summary("link-1").await.unwrap();
        assert!(Arc::ptr_eq(&cached, &view.summary));

        let entry = h.service.cache().entry("link-1").await.unwrap();
        assert_eq!(entry.owner_name, "Ana");

        h.clock.advance(chrono::Duration::hours(25));
        assert!(h.service.cached_summary("link-1").await.is_none());
    }

    #[tokio::test]
    async fn test_summary_for_reuses_cache() {
        let h = harness(MockProvider::with_sample_data(), AggregationOptions::default());

        h.service.summary_for("link-1", &creds()).await.unwrap();
        h.service.summary_for("link-1", &creds()).await.unwrap();
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 4);

        h.clock.advance(chrono::Duration::hours(25));
        h.service.summary_for("link-1", &creds()).await.unwrap();
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_transactions_failure_degrades_gracefully() {
        let provider = MockProvider::with_sample_data().failing(&[ResourceKind::Transactions]);
        let h = harness(provider, AggregationOptions::default());
        let view = h.service.detailed_context("link-1", &creds()).await.unwrap();

        assert!(view.has_data);
        assert!(view.transactions.is_empty());
        assert_eq!(view.unavailable, vec![ResourceKind::Transactions]);
        assert_close(view.summary.total_balance(), 1250.5);
        assert_eq!(view.summary.monthly_income(), 0.0);
        assert_eq!(view.summary.monthly_variable_expenses(), 0.0);
    }

    #[tokio::test]
    async fn test_all_fetches_failing_yields_empty_summary() {
        let provider = MockProvider::with_sample_data().failing(&[
            ResourceKind::Owners,
            ResourceKind::Accounts,
            ResourceKind::Transactions,
            ResourceKind::Incomes,
        ]);
        let h = harness(provider, AggregationOptions::default());
        let view = h.service.detailed_context("link-1", &creds()).await.unwrap();

        assert!(!view.has_data);
        assert_eq!(view.owner_name, "Unknown Customer");
        assert_eq!(view.unavailable.len(), 4);
        assert_eq!(view.summary.total_balance(), 0.0);
        assert_eq!(view.summary.monthly_income(), 0.0);
        assert_eq!(view.summary.monthly_surplus(), 0.0);
        assert_eq!(view.summary.currency(), "BRL");
        // Still cached, so the conversation layer sees the empty picture
        assert!(h.service.cached_summary("link-1").await.is_some());
    }

    #[tokio::test]
    async fn test_owner_and_income_failures_do_not_block_summary() {
        let mut provider = MockProvider::with_sample_data()
            .failing(&[ResourceKind::Owners, ResourceKind::Incomes]);
        provider.incomes = vec![crate::core::summary::fixtures::income("i1", 9000.0)];
        let h = harness(provider, AggregationOptions::default());
        let view = h.service.detailed_context("link-1", &creds()).await.unwrap();

        assert_eq!(view.owner_name, "Unknown Customer");
        // Incomes failed, so income falls back to transactions
        assert_close(view.summary.monthly_income(), 2000.0);
    }

    #[tokio::test]
    async fn test_recurring_expenses_refinement() {
        let options = AggregationOptions {
            include_recurring_expenses: true,
            ..Default::default()
        };
        let h = harness(MockProvider::with_sample_data(), options);
        let view = h.service.detailed_context("link-1", &creds()).await.unwrap();

        assert_close(view.summary.monthly_fixed_expenses(), 120.0);
        assert_close(view.summary.monthly_surplus(), 2000.0 - 120.0 - 1500.0);
    }

    #[tokio::test]
    async fn test_empty_link_id_rejected_before_fetching() {
        let h = harness(MockProvider::with_sample_data(), AggregationOptions::default());
        assert!(h.service.detailed_context("  ", &creds()).await.is_err());
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_month_end_window_keeps_nominal_length() {
        for day in [28, 30, 31] {
            let h = harness(MockProvider::with_sample_data(), AggregationOptions::default());
            h.clock
                .set(Utc.with_ymd_and_hms(2025, 5, day, 9, 0, 0).unwrap());
            let view = h.service.detailed_context("link-1", &creds()).await.unwrap();

            let range = h.provider.last_range.lock().unwrap().unwrap();
            assert_eq!(range.from.to_string(), "2025-02-28");
            assert_close(view.summary.monthly_income(), 2000.0);
            assert_close(view.summary.monthly_variable_expenses(), 1500.0);
            assert_close(view.summary.monthly_surplus(), 500.0);
        }
    }

    #[tokio::test]
    async fn test_view_serializes_with_embedded_summary() {
        let h = harness(MockProvider::with_sample_data(), AggregationOptions::default());
        let view = h.service.detailed_context("link-1", &creds()).await.unwrap();

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["owner_name"], "Ana");
        assert_eq!(json["summary"]["total_balance"], 1250.5);
        assert_eq!(json["summary"]["monthly_income"], 2000.0);
        assert_eq!(json["account_categories"]["CHECKING_ACCOUNT"], 2);
        assert_eq!(json["unavailable"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_context_line() {
        let h = harness(MockProvider::with_sample_data(), AggregationOptions::default());
        let view = h
            .service
            .detailed_context("8f2c9a1e-4b7d-link", &creds())
            .await
            .unwrap();

        assert_eq!(
            view.context_line(),
            "Customer: Ana | Link: 8f2c9a1e | Total Balance: 1250.50 BRL | Accounts: 2 | \
             Transactions: 2 | Monthly Income: 2000.00 BRL | Monthly Expenses: 1500.00 BRL | \
             Net Flow: 500.00 BRL"
        );
    }
}
