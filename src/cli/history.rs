use super::ui;
use crate::app::App;
use crate::core::model::{AccountId, HistoryPage};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};

pub async fn run(app: &App, account: &AccountId, page: usize) -> Result<()> {
    let history = app.history.list(account, page).await?;
    println!("{}", display_history(&history, &app.currency));
    Ok(())
}

pub fn display_history(history: &HistoryPage, currency: &str) -> String {
    let footer = ui::style_text(
        &format!(
            "Page {} of {} ({} transactions)",
            history.page, history.total_pages, history.total_count
        ),
        ui::StyleType::Subtle,
    );
    if history.records.is_empty() {
        return format!("No transactions yet.\n\n{footer}");
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Date"),
        ui::header_cell("Type"),
        ui::header_cell("Amount (g)"),
        ui::header_cell(&format!("Price ({currency})")),
        ui::header_cell(&format!("Total ({currency})")),
    ]);
    for record in &history.records {
        table.add_row(vec![
            Cell::new(record.id).set_alignment(CellAlignment::Right),
            Cell::new(record.timestamp.format("%Y-%m-%d %H:%M:%S")),
            ui::kind_cell(record.kind),
            Cell::new(record.amount).set_alignment(CellAlignment::Right),
            ui::money_cell(record.unit_price),
            ui::money_cell(record.total()),
        ]);
    }

    format!("{table}\n\n{footer}")
}
