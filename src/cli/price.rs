use super::ui;
use crate::app::App;
use crate::trading::Quote;
use anyhow::Result;
use comfy_table::Cell;

pub async fn run(app: &App) -> Result<()> {
    let spinner = ui::new_spinner("Fetching gold price...");
    let quote = app.pricing.quote().await;
    spinner.finish_and_clear();

    println!("{}", display_quote(&quote?, &app.currency));
    Ok(())
}

pub fn display_quote(quote: &Quote, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Price"),
        ui::header_cell(&format!("Per gram ({currency})")),
    ]);
    for (label, value) in [
        ("Market", quote.market),
        ("Buy", quote.buy),
        ("Sell", quote.sell),
    ] {
        table.add_row(vec![Cell::new(label), ui::money_cell(value)]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Gold Price", ui::StyleType::Title),
        table
    )
}
