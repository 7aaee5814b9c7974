use crate::core::models::{
    Account, Balance, Credentials, DateRange, Flow, IncomeStream, Owner, RecurringExpense,
    Transaction,
};
use crate::core::provider::{
    BankingDataProvider, FetchError, FetchFailure, FetchResult, ResourceKind,
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Pages followed for paginated listings before giving up on `next`.
const MAX_PAGES: usize = 20;
/// Longest error body kept in a [`FetchFailure::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Deserialize)]
struct BelvoAccount {
    id: String,
    link: Option<String>,
    category: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    currency: Option<String>,
    balance: Option<BelvoBalance>,
    institution: Option<BelvoInstitution>,
}

#[derive(Debug, Deserialize)]
struct BelvoBalance {
    current: Option<f64>,
    available: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BelvoInstitution {
    name: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BelvoTransaction {
    id: String,
    account: Option<Value>,
    amount: Option<f64>,
    currency: Option<String>,
    description: Option<String>,
    category: Option<String>,
    #[serde(rename = "type")]
    flow: Option<String>,
    accounting_date: Option<String>,
    value_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BelvoOwner {
    id: String,
    link: Option<String>,
    display_name: Option<String>,
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BelvoIncome {
    id: String,
    account: Option<Value>,
    monthly_average: Option<f64>,
    frequency: Option<String>,
    currency: Option<String>,
    income_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BelvoRecurringExpense {
    id: String,
    account: Option<Value>,
    average_transaction_amount: Option<f64>,
    frequency: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page {
    next: Option<String>,
    #[serde(default)]
    results: Vec<Value>,
}

impl From<BelvoAccount> for Account {
    fn from(a: BelvoAccount) -> Self {
        let balance = a.balance.map_or_else(Balance::default, |b| Balance {
            current: b.current.unwrap_or_default(),
            available: b.available.unwrap_or_default(),
        });
        Account {
            id: a.id,
            link_id: a.link,
            category: a.category.unwrap_or_default(),
            kind: a.kind,
            name: a.name.unwrap_or_default(),
            currency: a.currency.unwrap_or_default(),
            balance,
            institution: a.institution.and_then(|i| i.display_name.or(i.name)),
        }
    }
}

impl From<BelvoTransaction> for Transaction {
    fn from(t: BelvoTransaction) -> Self {
        Transaction {
            id: t.id,
            account_id: t.account.as_ref().and_then(reference_id),
            flow: t.flow.as_deref().map_or(Flow::Unknown, Flow::parse),
            amount: t.amount.unwrap_or_default(),
            currency: t.currency.unwrap_or_default(),
            description: t.description.unwrap_or_default(),
            category: t.category,
            accounting_date: t
                .accounting_date
                .as_deref()
                .or(t.value_date.as_deref())
                .and_then(parse_timestamp),
        }
    }
}

impl From<BelvoOwner> for Owner {
    fn from(o: BelvoOwner) -> Self {
        Owner {
            id: o.id,
            link_id: o.link,
            display_name: o.display_name,
            full_name: o.full_name,
        }
    }
}

impl From<BelvoIncome> for IncomeStream {
    fn from(i: BelvoIncome) -> Self {
        IncomeStream {
            id: i.id,
            account_id: i.account.as_ref().and_then(reference_id),
            monthly_average: i.monthly_average.unwrap_or_default(),
            frequency: i.frequency,
            currency: i.currency,
            income_type: i.income_type,
        }
    }
}

impl From<BelvoRecurringExpense> for RecurringExpense {
    fn from(e: BelvoRecurringExpense) -> Self {
        RecurringExpense {
            id: e.id,
            account_id: e.account.as_ref().and_then(reference_id),
            average_transaction_amount: e.average_transaction_amount.unwrap_or_default(),
            frequency: e.frequency,
            category: e.category,
        }
    }
}

/// Account references arrive either as a bare id or as a nested account object.
fn reference_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Object(obj) => obj.get("id").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Parses provider timestamps, which may or may not carry a timezone.
/// Naive values are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Client for a Belvo-compatible banking data API.
pub struct BelvoProvider {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl BelvoProvider {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("finctx/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    fn transport_error(&self, resource: ResourceKind, e: reqwest::Error) -> FetchError {
        let reason = if e.is_timeout() {
            FetchFailure::TimedOut(self.timeout)
        } else {
            FetchFailure::Transport(e.to_string())
        };
        FetchError::new(resource, reason)
    }

    /// Sends an authenticated request and returns the body of a successful
    /// response.
    async fn send(
        &self,
        resource: ResourceKind,
        request: RequestBuilder,
        credentials: &Credentials,
    ) -> Result<String, FetchError> {
        let response = request
            .basic_auth(credentials.secret_id(), Some(credentials.secret_key()))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(resource, e))?;

        let status = response.status();
        debug!(%resource, %status, "Received provider response");
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(resource, e))?;

        if !status.is_success() {
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(FetchError::new(
                resource,
                FetchFailure::Status {
                    status: status.as_u16(),
                    body,
                },
            ));
        }
        Ok(body)
    }

    /// `POST {path}` with a JSON body; the response is a bare array.
    async fn post_list<W: DeserializeOwned>(
        &self,
        resource: ResourceKind,
        path: &str,
        body: Value,
        credentials: &Credentials,
    ) -> Result<Vec<W>, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Requesting {resource} from {url}");

        let request = self.client.post(&url).json(&body);
        let response_text = self.send(resource, request, credentials).await?;

        match serde_json::from_str(&response_text) {
            Ok(items) => Ok(items),
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse {resource} response"
                );
                Err(FetchError::new(resource, FetchFailure::Decode(e.to_string())))
            }
        }
    }

    /// `GET {path}?link=...` following `next` links of the paginated
    /// envelope. Records that do not decode are skipped.
    async fn get_paginated<W: DeserializeOwned>(
        &self,
        resource: ResourceKind,
        path: &str,
        link_id: &str,
        credentials: &Credentials,
    ) -> Result<Vec<W>, FetchError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path)).map_err(|e| {
            FetchError::new(resource, FetchFailure::Transport(format!("invalid URL: {e}")))
        })?;
        url.query_pairs_mut().append_pair("link", link_id);

        let mut items = Vec::new();
        let mut next = Some(url.to_string());
        let mut pages = 0;

        while let Some(page_url) = next.take() {
            if pages == MAX_PAGES {
                warn!(%resource, pages, "Stopped following pagination");
                break;
            }
            pages += 1;
            debug!("Requesting {resource} page {pages} from {page_url}");

            let request = self.client.get(&page_url);
            let response_text = self.send(resource, request, credentials).await?;
            let page: Page = serde_json::from_str(&response_text).map_err(|e| {
                error!(error = ?e, response = %response_text, "Failed to parse {resource} page");
                FetchError::new(resource, FetchFailure::Decode(e.to_string()))
            })?;

            for record in page.results {
                match serde_json::from_value::<W>(record) {
                    Ok(item) => items.push(item),
                    Err(e) => warn!(%resource, error = %e, "Skipping malformed record"),
                }
            }
            next = page
                .next
                .filter(|n| !n.is_empty())
                .and_then(|n| same_origin_page(resource, &url, &n));
        }
        Ok(items)
    }
}

/// Resolves a `next` link against `base`. Links to another origin are
/// dropped since every request carries the caller's credentials.
fn same_origin_page(resource: ResourceKind, base: &Url, next: &str) -> Option<String> {
    match base.join(next) {
        Ok(url) if url.origin() == base.origin() => Some(url.to_string()),
        Ok(url) => {
            warn!(
                %resource,
                next_origin = %url.origin().ascii_serialization(),
                "Not following pagination to another origin"
            );
            None
        }
        Err(e) => {
            warn!(%resource, error = %e, "Ignoring malformed pagination link");
            None
        }
    }
}

#[async_trait]
impl BankingDataProvider for BelvoProvider {
    #[instrument(name = "BelvoAccounts", skip(self, credentials), fields(link_id = %link_id))]
    async fn list_accounts(
        &self,
        link_id: &str,
        credentials: &Credentials,
    ) -> FetchResult<Account> {
        let accounts: Vec<BelvoAccount> = self
            .post_list(
                ResourceKind::Accounts,
                "/api/accounts/",
                json!({ "link": link_id }),
                credentials,
            )
            .await?;
        Ok(accounts.into_iter().map(Account::from).collect())
    }

    #[instrument(name = "BelvoTransactions", skip(self, credentials), fields(link_id = %link_id))]
    async fn list_transactions(
        &self,
        link_id: &str,
        credentials: &Credentials,
        range: Option<DateRange>,
    ) -> FetchResult<Transaction> {
        let mut body = json!({ "link": link_id });
        if let Some(range) = range {
            body["date_from"] = json!(range.from.format("%Y-%m-%d").to_string());
            body["date_to"] = json!(range.to.format("%Y-%m-%d").to_string());
        }
        let transactions: Vec<BelvoTransaction> = self
            .post_list(
                ResourceKind::Transactions,
                "/api/transactions/",
                body,
                credentials,
            )
            .await?;
        Ok(transactions.into_iter().map(Transaction::from).collect())
    }

    #[instrument(name = "BelvoOwners", skip(self, credentials), fields(link_id = %link_id))]
    async fn list_owners(&self, link_id: &str, credentials: &Credentials) -> FetchResult<Owner> {
        let owners: Vec<BelvoOwner> = self
            .post_list(
                ResourceKind::Owners,
                "/api/owners/",
                json!({ "link": link_id }),
                credentials,
            )
            .await?;
        Ok(owners.into_iter().map(Owner::from).collect())
    }

    #[instrument(name = "BelvoIncomes", skip(self, credentials), fields(link_id = %link_id))]
    async fn list_incomes(
        &self,
        link_id: &str,
        credentials: &Credentials,
    ) -> FetchResult<IncomeStream> {
        let incomes: Vec<BelvoIncome> = self
            .get_paginated(ResourceKind::Incomes, "/api/incomes/", link_id, credentials)
            .await?;
        Ok(incomes.into_iter().map(IncomeStream::from).collect())
    }

    #[instrument(name = "BelvoRecurringExpenses", skip(self, credentials), fields(link_id = %link_id))]
    async fn list_recurring_expenses(
        &self,
        link_id: &str,
        credentials: &Credentials,
    ) -> FetchResult<RecurringExpense> {
        let expenses: Vec<BelvoRecurringExpense> = self
            .get_paginated(
                ResourceKind::RecurringExpenses,
                "/api/recurring-expenses/",
                link_id,
                credentials,
            )
            .await?;
        Ok(expenses.into_iter().map(RecurringExpense::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LINK_ID: &str = "8f2c9a1e-4b7d-4c1a-9e55-0a1b2c3d4e5f";

    const ACCOUNTS_JSON: &str = r#"[
        {
            "id": "acc-1",
            "link": "8f2c9a1e-4b7d-4c1a-9e55-0a1b2c3d4e5f",
            "institution": {"name": "ofmockbank_br_retail", "type": "bank", "display_name": "Mock Bank"},
            "collected_at": "2025-06-01T10:00:00.000000Z",
            "category": "CHECKING_ACCOUNT",
            "type": "Conta Corrente",
            "name": "Conta Principal",
            "currency": "BRL",
            "balance": {"current": 1200.0, "available": 1000.0}
        },
        {
            "id": "acc-2",
            "link": "8f2c9a1e-4b7d-4c1a-9e55-0a1b2c3d4e5f",
            "institution": {"name": "ofmockbank_br_retail", "type": "bank"},
            "category": "SAVINGS_ACCOUNT",
            "type": "Poupanca",
            "name": "Reserva",
            "currency": "BRL",
            "balance": {"current": 250.5, "available": null}
        }
    ]"#;

    const TRANSACTIONS_JSON: &str = r#"[
        {
            "id": "tx-1",
            "account": {"id": "acc-1", "name": "Conta Principal"},
            "accounting_date": "2025-05-20T00:00:00",
            "value_date": "2025-05-20",
            "amount": 6000.0,
            "currency": "BRL",
            "description": "SALARIO",
            "category": "Income & Payments",
            "type": "INFLOW",
            "status": "PROCESSED"
        },
        {
            "id": "tx-2",
            "account": {"id": "acc-1"},
            "accounting_date": null,
            "value_date": "2025-05-22",
            "amount": 4500.0,
            "currency": "BRL",
            "description": "ALUGUEL",
            "category": null,
            "type": "OUTFLOW"
        }
    ]"#;

    fn creds() -> Credentials {
        Credentials::new("secret-id", "secret-key").unwrap()
    }

    async fn provider_for(server: &MockServer) -> BelvoProvider {
        BelvoProvider::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_list_accounts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/accounts/"))
            .and(basic_auth("secret-id", "secret-key"))
            .and(body_json(json!({ "link": LINK_ID })))
            .respond_with(ResponseTemplate::new(200).set_body_string(ACCOUNTS_JSON))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let accounts = provider.list_accounts(LINK_ID, &creds()).await.unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].id, "acc-1");
        assert_eq!(accounts[0].category, "CHECKING_ACCOUNT");
        assert_eq!(accounts[0].balance.available, 1000.0);
        assert_eq!(accounts[0].institution.as_deref(), Some("Mock Bank"));
        assert_eq!(accounts[1].balance.available, 0.0);
        assert_eq!(accounts[1].balance.current, 250.5);
        assert_eq!(accounts[1].institution.as_deref(), Some("ofmockbank_br_retail"));
    }

    #[tokio::test]
    async fn test_list_transactions_sends_date_range() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/transactions/"))
            .and(body_json(json!({
                "link": LINK_ID,
                "date_from": "2025-03-01",
                "date_to": "2025-06-01",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_string(TRANSACTIONS_JSON))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let range = DateRange::trailing_months(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), 3);
        let transactions = provider
            .list_transactions(LINK_ID, &creds(), Some(range))
            .await
            .unwrap();

        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].flow, Flow::Inflow);
        assert_eq!(transactions[0].account_id.as_deref(), Some("acc-1"));
        assert_eq!(transactions[0].accounting_date.unwrap().day(), 20);
        assert_eq!(transactions[1].flow, Flow::Outflow);
        assert_eq!(transactions[1].amount, 4500.0);
        // Falls back to the value date
        assert_eq!(transactions[1].accounting_date.unwrap().day(), 22);
    }

    #[tokio::test]
    async fn test_list_owners() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/owners/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"id": "own-1", "link": "l", "display_name": "", "full_name": "Ana Souza", "email": "ana@example.com"}]"#,
            ))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let owners = provider.list_owners(LINK_ID, &creds()).await.unwrap();

        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].full_name.as_deref(), Some("Ana Souza"));
        assert_eq!(owners[0].display_name.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_list_incomes_follows_pagination() {
        let server = MockServer::start().await;
        let page_two = format!("{}/api/incomes/?link={LINK_ID}&page=2", server.uri());

        Mock::given(method("GET"))
            .and(path("/api/incomes/"))
            .and(query_param("link", LINK_ID))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 3,
                "next": null,
                "results": [
                    {"id": "inc-3", "account": "acc-2", "monthly_average": 500.0}
                ]
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/incomes/"))
            .and(query_param("link", LINK_ID))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 3,
                "next": page_two,
                "results": [
                    {"id": "inc-1", "account": {"id": "acc-1"}, "monthly_average": 4500.0, "frequency": "MONTHLY", "currency": "BRL", "income_type": "SALARY"},
                    {"account": "acc-1", "monthly_average": 1.0}
                ]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let incomes = provider.list_incomes(LINK_ID, &creds()).await.unwrap();

        // The record without an id is skipped
        assert_eq!(incomes.len(), 2);
        assert_eq!(incomes[0].account_id.as_deref(), Some("acc-1"));
        assert_eq!(incomes[0].monthly_average, 4500.0);
        assert_eq!(incomes[1].id, "inc-3");
        assert_eq!(incomes[1].account_id.as_deref(), Some("acc-2"));
    }

    #[tokio::test]
    async fn test_pagination_stays_on_provider_origin() {
        let server = MockServer::start().await;
        let elsewhere = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 0, "next": null, "results": []
            })))
            .expect(0)
            .mount(&elsewhere)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/incomes/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 2,
                "next": format!("{}/api/incomes/?page=2", elsewhere.uri()),
                "results": [{"id": "inc-1", "account": "acc-1", "monthly_average": 10.0}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let incomes = provider.list_incomes(LINK_ID, &creds()).await.unwrap();

        assert_eq!(incomes.len(), 1);
        assert!(elsewhere.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_relative_next_resolves_against_base() {
        let base = Url::parse("https://sandbox.belvo.com/api/incomes/?link=l").unwrap();
        assert_eq!(
            same_origin_page(ResourceKind::Incomes, &base, "/api/incomes/?link=l&page=2").as_deref(),
            Some("https://sandbox.belvo.com/api/incomes/?link=l&page=2")
        );
        assert!(
            same_origin_page(ResourceKind::Incomes, &base, "http://sandbox.belvo.com/api/incomes/")
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_list_recurring_expenses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/recurring-expenses/"))
            .and(query_param("link", LINK_ID))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "next": null,
                "results": [
                    {"id": "re-1", "account": "acc-1", "average_transaction_amount": 89.9, "frequency": "MONTHLY", "category": "Subscriptions"}
                ]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let expenses = provider
            .list_recurring_expenses(LINK_ID, &creds())
            .await
            .unwrap();

        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].average_transaction_amount, 89.9);
        assert_eq!(expenses[0].category.as_deref(), Some("Subscriptions"));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/accounts/"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"[{"code": "authentication_failed"}]"#),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let err = provider.list_accounts(LINK_ID, &creds()).await.unwrap_err();

        assert_eq!(err.resource, ResourceKind::Accounts);
        assert!(matches!(err.reason, FetchFailure::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_malformed_payload_maps_to_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/owners/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"detail": "oops"}"#))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let err = provider.list_owners(LINK_ID, &creds()).await.unwrap_err();

        assert_eq!(err.resource, ResourceKind::Owners);
        assert!(matches!(err.reason, FetchFailure::Decode(_)));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/accounts/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("[]")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let provider = BelvoProvider::new(&server.uri(), Duration::from_millis(200)).unwrap();
        let err = provider.list_accounts(LINK_ID, &creds()).await.unwrap_err();

        assert_eq!(
            err.reason,
            FetchFailure::TimedOut(Duration::from_millis(200))
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_maps_to_transport_error() {
        let provider = BelvoProvider::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = provider.list_accounts(LINK_ID, &creds()).await.unwrap_err();
        assert_eq!(err.resource, ResourceKind::Accounts);
        assert!(matches!(
            err.reason,
            FetchFailure::Transport(_) | FetchFailure::TimedOut(_)
        ));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let with_zone = parse_timestamp("2025-05-20T14:30:00.123456Z").unwrap();
        assert_eq!(with_zone.hour(), 14);

        let offset = parse_timestamp("2025-05-20T14:30:00-03:00").unwrap();
        assert_eq!(offset.hour(), 17);

        let naive = parse_timestamp("2025-05-20T14:30:00.000000").unwrap();
        assert_eq!(naive.minute(), 30);

        let no_fraction = parse_timestamp("2025-05-20T14:30:00").unwrap();
        assert_eq!(no_fraction.hour(), 14);

        let date_only = parse_timestamp("2025-05-20").unwrap();
        assert_eq!(date_only.day(), 20);

        assert!(parse_timestamp("20/05/2025").is_none());
    }
}
