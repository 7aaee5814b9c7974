//! Banking resources fetched for a link, normalized away from any provider's
//! wire format.

use anyhow::{Result, bail};
use chrono::{DateTime, Months, NaiveDate, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Balance snapshot of an account at collection time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub current: f64,
    pub available: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub link_id: Option<String>,
    pub category: String,
    pub kind: Option<String>,
    pub name: String,
    pub currency: String,
    pub balance: Balance,
    pub institution: Option<String>,
}

/// Direction of money movement as classified by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Flow {
    Inflow,
    Outflow,
    Unknown,
}

impl Flow {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "INFLOW" => Flow::Inflow,
            "OUTFLOW" => Flow::Outflow,
            _ => Flow::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: Option<String>,
    pub flow: Flow,
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub category: Option<String>,
    pub accounting_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    pub link_id: Option<String>,
    pub display_name: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStream {
    pub id: String,
    pub account_id: Option<String>,
    pub monthly_average: f64,
    pub frequency: Option<String>,
    pub currency: Option<String>,
    pub income_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringExpense {
    pub id: String,
    pub account_id: Option<String>,
    pub average_transaction_amount: f64,
    pub frequency: Option<String>,
    pub category: Option<String>,
}

/// Shown when no owner record carries a usable name.
pub const UNKNOWN_OWNER: &str = "Unknown Customer";

/// Picks the name to show for a link's owner: the first non-empty display
/// name, else the first non-empty full name, else [`UNKNOWN_OWNER`].
pub fn owner_display_name(owners: &[Owner]) -> String {
    fn non_empty(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    owners
        .iter()
        .find_map(|o| non_empty(&o.display_name))
        .or_else(|| owners.iter().find_map(|o| non_empty(&o.full_name)))
        .unwrap_or(UNKNOWN_OWNER)
        .to_string()
}

/// Closed interval of calendar dates used to restrict transaction listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            bail!("Invalid date range: {from} is after {to}");
        }
        Ok(Self { from, to })
    }

    /// The `months` calendar months ending on `today`. The start is clamped
    /// to the end of its month when that day does not exist (May 31 minus
    /// three months starts on February 28).
    pub fn trailing_months(today: NaiveDate, months: u32) -> Self {
        let from = today
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        Self { from, to: today }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.from, self.to)
    }
}

/// Provider API credentials, passed through to every remote call.
#[derive(Clone)]
pub struct Credentials {
    secret_id: String,
    secret_key: SecretString,
}

impl Credentials {
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        let secret_id = secret_id.into();
        let secret_key = secret_key.into();
        if secret_id.trim().is_empty() || secret_key.trim().is_empty() {
            bail!("secret_id and secret_key are required");
        }
        Ok(Self {
            secret_id,
            secret_key: SecretString::from(secret_key),
        })
    }

    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}
