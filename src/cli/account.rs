use super::ui;
use crate::app::App;
use crate::core::model::{Account, AccountId};
use crate::trading::Quote;
use anyhow::Result;
use comfy_table::Cell;

pub async fn open(app: &App, id: &AccountId) -> Result<()> {
    let account = app.ledger.open_account(id).await?;
    println!(
        "Opened account {} with {}",
        ui::style_text(account.id.as_str(), ui::StyleType::TotalLabel),
        ui::style_text(
            &ui::format_money(account.balance, &app.currency),
            ui::StyleType::TotalValue
        )
    );
    Ok(())
}

/// Shows the balance next to the current prices. A provider outage only
/// blanks out the price rows.
pub async fn balance(app: &App, id: &AccountId) -> Result<()> {
    let (account, quote) = futures::join!(app.ledger.account(id), app.pricing.quote());
    let account = account?;
    if let Err(e) = &quote {
        tracing::warn!(error = %e, "Showing balance without prices");
    }
    println!(
        "{}",
        display_balance(&account, quote.ok().as_ref(), &app.currency)
    );
    Ok(())
}

pub fn display_balance(account: &Account, quote: Option<&Quote>, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Field"),
        ui::header_cell(&format!("Value ({currency})")),
    ]);
    table.add_row(vec![Cell::new("Balance"), ui::money_cell(account.balance)]);
    for (label, value) in [
        ("Buy price / g", quote.map(|q| q.buy)),
        ("Sell price / g", quote.map(|q| q.sell)),
    ] {
        let value_cell = match value {
            Some(v) => ui::money_cell(v),
            None => ui::na_cell(true),
        };
        table.add_row(vec![Cell::new(label), value_cell]);
    }

    let last_trade = account.last_trade_at.map_or("never".to_string(), |t| {
        t.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    });
    format!(
        "Account: {}\n\n{}\n\n{}",
        ui::style_text(account.id.as_str(), ui::StyleType::Title),
        table,
        ui::style_text(
            &format!("{} trades, last {}", account.trade_count, last_trade),
            ui::StyleType::Subtle
        )
    )
}
