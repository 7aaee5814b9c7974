use super::ui;
use crate::core::{AggregateView, ContextService, Credentials};
use anyhow::Result;
use comfy_table::Cell;
use futures::future::join_all;
use tracing::error;

impl AggregateView {
    pub fn display_as_table(&self) -> String {
        let summary = &self.summary;
        let currency = summary.currency();

        let mut accounts =
            ui::report_table(&["Account", "Category", "Institution", "Current", "Available"]);
        for account in &self.accounts {
            accounts.add_row(vec![
                Cell::new(&account.name),
                Cell::new(&account.category),
                Cell::new(account.institution.as_deref().unwrap_or("N/A")),
                ui::money_cell(account.balance.current, &account.currency),
                ui::money_cell(account.balance.available, &account.currency),
            ]);
        }

        let mut monthly = ui::report_table(&["Monthly", "Amount"]);
        for (label, value) in [
            ("Income", summary.monthly_income()),
            ("Fixed expenses", summary.monthly_fixed_expenses()),
            ("Variable expenses", summary.monthly_variable_expenses()),
        ] {
            monthly.add_row(vec![Cell::new(label), ui::money_cell(value, currency)]);
        }
        monthly.add_row(vec![
            Cell::new("Surplus"),
            ui::net_money_cell(summary.monthly_surplus(), currency),
        ]);

        let mut notices = Vec::new();
        if !self.has_data {
            notices.push("No financial data available for this link yet.".to_string());
        }
        if !self.unavailable.is_empty() {
            let names: Vec<String> = self.unavailable.iter().map(|r| r.to_string()).collect();
            notices.push(format!("Unavailable: {}", names.join(", ")));
        }

        let mut output = format!(
            "Customer: {} {}\n\n",
            ui::paint(&self.owner_name, ui::Tone::Heading),
            ui::paint(&format!("({})", self.link_id), ui::Tone::Muted),
        );
        for notice in notices {
            output.push_str(&ui::paint(&notice, ui::Tone::Alert));
            output.push_str("\n\n");
        }
        output.push_str(&format!(
            "{accounts}\n\n{monthly}\n\nTransactions analysed: {}\nTotal Balance ({currency}): {}",
            self.transactions.len(),
            ui::paint(&format!("{:.2}", summary.total_balance()), ui::Tone::Figure)
        ));

        output
    }
}

/// Aggregates every link concurrently and prints the results.
pub async fn run(
    service: &ContextService,
    link_ids: &[String],
    credentials: &Credentials,
    json: bool,
) -> Result<()> {
    let pb = ui::fetch_spinner(link_ids.len());
    let results = join_all(
        link_ids
            .iter()
            .map(|link_id| service.detailed_context(link_id, credentials)),
    )
    .await;
    pb.finish_and_clear();

    let mut views = Vec::with_capacity(results.len());
    for (link_id, result) in link_ids.iter().zip(results) {
        match result {
            Ok(view) => views.push(view),
            Err(e) => {
                error!(%link_id, error = %e, "Aggregation failed");
                return Err(e);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    let reports: Vec<String> = views
        .iter()
        .map(|view| {
            format!(
                "{}\n\n{}",
                view.display_as_table(),
                ui::paint(&view.context_line(), ui::Tone::Muted)
            )
        })
        .collect();
    println!("{}", reports.join(&format!("\n\n{}\n\n", ui::link_divider())));
    Ok(())
}
