use super::ui;
use crate::app::App;
use crate::core::model::{AccountId, TradeKind, TransactionRecord};
use anyhow::Result;
use rust_decimal::Decimal;

pub async fn run(app: &App, account: &AccountId, kind: TradeKind, amount: Decimal) -> Result<()> {
    let spinner = ui::new_spinner("Executing trade...");
    let result = app.ledger.execute(account, kind, amount).await;
    spinner.finish_and_clear();

    let record = result?;
    // The trade is committed at this point; a failed balance read only blanks
    // out the balance line
    let balance = match app.ledger.account(account).await {
        Ok(current) => Some(current.balance),
        Err(e) => {
            tracing::warn!(error = %e, "Trade applied but the balance could not be read");
            None
        }
    };
    println!("{}", display_trade(&record, balance, &app.currency));
    Ok(())
}

pub fn display_trade(
    record: &TransactionRecord,
    balance: Option<Decimal>,
    currency: &str,
) -> String {
    let headline = match record.kind {
        TradeKind::Buy => "Gold buy transaction successful!",
        TradeKind::Sell => "Gold sell transaction successful!",
    };

    let mut output = format!("{}\n\n", ui::style_text(headline, ui::StyleType::Success));
    output.push_str(&format!("Transaction: #{}\n", record.id));
    output.push_str(&format!(
        "Time:        {}\n",
        record.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("Amount:      {} g\n", record.amount));
    output.push_str(&format!(
        "Price:       {} per gram\n",
        ui::format_money(record.unit_price, currency)
    ));
    output.push_str(&format!(
        "Total:       {}\n",
        ui::format_money(record.total(), currency)
    ));
    let balance = match balance {
        Some(balance) => ui::style_text(
            &ui::format_money(balance, currency),
            ui::StyleType::TotalValue,
        ),
        None => ui::style_text("N/A", ui::StyleType::Error),
    };
    output.push_str(&format!(
        "\n{}: {}",
        ui::style_text("Balance", ui::StyleType::TotalLabel),
        balance
    ));
    output
}
