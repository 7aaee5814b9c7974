use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// How a piece of report text should stand out.
pub enum Tone {
    /// Customer names and section titles.
    Heading,
    /// Identifiers and the one-line digest.
    Muted,
    /// Missing data notices.
    Alert,
    /// The headline balance figure.
    Figure,
}

pub fn paint(text: &str, tone: Tone) -> String {
    let styled = match tone {
        Tone::Heading => style(text).bold().underlined(),
        Tone::Muted => style(text).dim(),
        Tone::Alert => style(text).yellow(),
        Tone::Figure => style(text).green().bold(),
    };
    styled.to_string()
}

/// Rounded table with a bold cyan header row.
pub fn report_table(columns: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(columns.iter().map(|c| {
            Cell::new(*c)
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold)
        }));
    table
}

pub fn money_cell(value: f64, currency: &str) -> Cell {
    Cell::new(format!("{value:.2} {currency}")).set_alignment(CellAlignment::Right)
}

/// Money cell in green when the link is in surplus, red when in deficit.
pub fn net_money_cell(value: f64, currency: &str) -> Cell {
    let color = if value < 0.0 { Color::Red } else { Color::Green };
    money_cell(value, currency).fg(color)
}

pub fn fetch_spinner(links: usize) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(format!("Fetching financial context for {links} link(s)..."));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Full-width rule between two links' reports.
pub fn link_divider() -> String {
    let width = console::Term::stdout()
        .size_checked()
        .map_or(80, |(_, w)| w as usize);
    "─".repeat(width)
}
