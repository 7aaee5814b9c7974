//! Derives a link's monthly financial picture from whatever resources were
//! fetched. Everything here is a pure calculation: no I/O, no clock reads.

use super::models::{Account, Flow, IncomeStream, RecurringExpense, Transaction};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// Months of transactions assumed when the fetch window is degenerate.
pub const DEFAULT_WINDOW_MONTHS: f64 = 3.0;

pub const DEFAULT_CURRENCY: &str = "BRL";

/// Resources available to the builder. Missing resources are empty slices.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryInputs<'a> {
    pub accounts: &'a [Account],
    pub transactions: &'a [Transaction],
    pub income_streams: &'a [IncomeStream],
    /// `Some` only when recurring expense data was requested and arrived.
    pub recurring_expenses: Option<&'a [RecurringExpense]>,
}

#[derive(Debug, Clone)]
pub struct SummaryOptions {
    /// Months spanned by the transaction fetch window.
    pub window_months: f64,
    pub default_currency: String,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            window_months: DEFAULT_WINDOW_MONTHS,
            default_currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Financial summary of one link. Only [`build_summary`] creates these, so the
/// derived totals always agree with the embedded accounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    link_id: String,
    generated_at: DateTime<Utc>,
    monthly_income: f64,
    monthly_fixed_expenses: f64,
    monthly_variable_expenses: f64,
    monthly_surplus: f64,
    total_balance: f64,
    currency: String,
    accounts: Vec<Account>,
    recent_transactions: Vec<Transaction>,
    income_streams: Vec<IncomeStream>,
    recurring_expenses: Vec<RecurringExpense>,
}

impl FinancialSummary {
    pub fn link_id(&self) -> &str {
        &self.link_id
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn monthly_income(&self) -> f64 {
        self.monthly_income
    }

    pub fn monthly_fixed_expenses(&self) -> f64 {
        self.monthly_fixed_expenses
    }

    pub fn monthly_variable_expenses(&self) -> f64 {
        self.monthly_variable_expenses
    }

    pub fn monthly_expenses(&self) -> f64 {
        self.monthly_fixed_expenses + self.monthly_variable_expenses
    }

    pub fn monthly_surplus(&self) -> f64 {
        self.monthly_surplus
    }

    pub fn total_balance(&self) -> f64 {
        self.total_balance
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn recent_transactions(&self) -> &[Transaction] {
        &self.recent_transactions
    }

    pub fn income_streams(&self) -> &[IncomeStream] {
        &self.income_streams
    }

    pub fn recurring_expenses(&self) -> &[RecurringExpense] {
        &self.recurring_expenses
    }
}

/// Builds the summary for `link_id`.
///
/// Income streams are preferred over income inferred from transactions: when
/// their monthly averages sum to zero (or none arrived) income falls back to
/// the windowed average of inflows. Variable expenses are always the windowed
/// average of outflows. Fixed expenses are the sum of recurring expense
/// averages when that data is supplied, zero otherwise.
pub fn build_summary(
    link_id: &str,
    generated_at: DateTime<Utc>,
    inputs: SummaryInputs<'_>,
    options: &SummaryOptions,
) -> FinancialSummary {
    let total_balance: f64 = inputs.accounts.iter().map(|a| a.balance.available).sum();

    let (total_inflow, total_outflow) =
        inputs
            .transactions
            .iter()
            .fold((0.0, 0.0), |(inflow, outflow), tx| match tx.flow {
                Flow::Inflow => (inflow + tx.amount, outflow),
                Flow::Outflow => (inflow, outflow + tx.amount),
                Flow::Unknown => (inflow, outflow),
            });

    let window_months = if options.window_months.is_finite() && options.window_months > 0.0 {
        options.window_months
    } else {
        warn!(
            window_months = options.window_months,
            "Degenerate transaction window, assuming {DEFAULT_WINDOW_MONTHS} months"
        );
        DEFAULT_WINDOW_MONTHS
    };
    let monthly_income_from_transactions = total_inflow / window_months;
    let monthly_variable_expenses = total_outflow / window_months;

    let stream_income: f64 = inputs.income_streams.iter().map(|i| i.monthly_average).sum();
    let monthly_income = if stream_income != 0.0 {
        stream_income
    } else {
        monthly_income_from_transactions
    };

    let recurring_expenses = inputs.recurring_expenses.unwrap_or_default();
    let monthly_fixed_expenses: f64 = recurring_expenses
        .iter()
        .map(|e| e.average_transaction_amount)
        .sum();

    let monthly_surplus = monthly_income - monthly_fixed_expenses - monthly_variable_expenses;

    let currency = inputs
        .accounts
        .first()
        .map(|a| a.currency.clone())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| options.default_currency.clone());

    debug!(
        link_id,
        total_inflow,
        total_outflow,
        window_months,
        stream_income,
        monthly_income,
        monthly_surplus,
        "Built financial summary"
    );

    FinancialSummary {
        link_id: link_id.to_string(),
        generated_at,
        monthly_income,
        monthly_fixed_expenses,
        monthly_variable_expenses,
        monthly_surplus,
        total_balance,
        currency,
        accounts: inputs.accounts.to_vec(),
        recent_transactions: inputs.transactions.to_vec(),
        income_streams: inputs.income_streams.to_vec(),
        recurring_expenses: recurring_expenses.to_vec(),
    }
}
