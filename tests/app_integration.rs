use aurum::AppCommand;
use aurum::app::App;
use aurum::core::config::AppConfig;
use aurum::core::model::{AccountId, TradeKind};
use rust_decimal_macros::dec;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Metals API mock answering `expected_calls` times with `response`.
    pub async fn create_mock_server(response: ResponseTemplate, expected_calls: u64) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("currencies", "XAU"))
            .respond_with(response)
            .expect(expected_calls)
            .mount(&mock_server)
            .await;

        mock_server
    }
}

/// Writes a config pointing at the mock server and a private data directory.
fn write_config(dir: &Path, base_url: &str) -> String {
    let config_path = dir.join("config.yaml");
    let config_content = format!(
        r#"
        provider:
          base_url: "{base_url}/v1/latest"
          api_key: "test-key"
          timeout_secs: 5
          retries: 0
        trading:
          commission_rate: 0.02
          starting_balance: 10000.00
        data_path: "{}"
    "#,
        dir.join("data").display()
    );
    fs::write(&config_path, config_content).expect("Failed to write config file");
    config_path.to_str().unwrap().to_string()
}

#[test_log::test(tokio::test)]
async fn test_full_trading_flow_with_mock() {
    let temp_dir = TempDir::new().unwrap();
    let response = wiremock::ResponseTemplate::new(200)
        .set_body_string(r#"{"success": true, "base": "USD", "rates": {"XAU": 0.0005}}"#);
    // One fetch serves every command: the price is cached on disk between runs
    let mock_server = test_utils::create_mock_server(response, 1).await;
    let config_path = write_config(temp_dir.path(), &mock_server.uri());
    let user: AccountId = "alice".parse().unwrap();

    let commands = vec![
        AppCommand::Open,
        AppCommand::Trade {
            kind: TradeKind::Buy,
            amount: dec!(1),
        },
        AppCommand::History { page: 1 },
        AppCommand::Balance,
        AppCommand::Price,
    ];
    for command in commands {
        let result = aurum::run_command(command, Some(&user), Some(&config_path)).await;
        assert!(result.is_ok(), "Command failed with: {:?}", result.err());
    }

    let config = AppConfig::load_from_path(&config_path).unwrap();
    let app = App::open(&config).await.unwrap();
    let account = app.ledger.account(&user).await.unwrap();
    info!(balance = %account.balance, "Balance after buying 1 g");
    assert_eq!(account.balance.to_string(), "7960.00");
    assert_eq!(account.trade_count, 1);

    let history = app.history.list(&user, 1).await.unwrap();
    assert_eq!(history.total_count, 1);
    assert_eq!(history.records[0].kind, TradeKind::Buy);
    assert_eq!(history.records[0].unit_price, dec!(2040.00));
    app.shutdown().unwrap();
}

#[test_log::test(tokio::test)]
async fn test_insufficient_balance_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let response =
        wiremock::ResponseTemplate::new(200).set_body_string(r#"{"rates": {"XAU": 0.0005}}"#);
    let mock_server = test_utils::create_mock_server(response, 1).await;
    let config_path = write_config(temp_dir.path(), &mock_server.uri());
    let user: AccountId = "bob".parse().unwrap();

    aurum::run_command(AppCommand::Open, Some(&user), Some(&config_path))
        .await
        .unwrap();
    let result = aurum::run_command(
        AppCommand::Trade {
            kind: TradeKind::Buy,
            amount: dec!(10),
        },
        Some(&user),
        Some(&config_path),
    )
    .await;

    let err = result.expect_err("Buying 20400.00 worth of gold should fail");
    assert!(
        err.to_string().contains("Insufficient balance"),
        "Unexpected error: {err}"
    );

    let config = AppConfig::load_from_path(&config_path).unwrap();
    let app = App::open(&config).await.unwrap();
    assert_eq!(
        app.ledger.account(&user).await.unwrap().balance,
        dec!(10000.00)
    );
    app.shutdown().unwrap();
}

#[test_log::test(tokio::test)]
async fn test_provider_outage_fails_trade() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server =
        test_utils::create_mock_server(wiremock::ResponseTemplate::new(500), 1).await;
    let config_path = write_config(temp_dir.path(), &mock_server.uri());
    let user: AccountId = "carol".parse().unwrap();

    aurum::run_command(AppCommand::Open, Some(&user), Some(&config_path))
        .await
        .unwrap();
    let result = aurum::run_command(
        AppCommand::Trade {
            kind: TradeKind::Sell,
            amount: dec!(1),
        },
        Some(&user),
        Some(&config_path),
    )
    .await;

    let err = result.expect_err("Trade should fail without a price");
    assert!(
        err.to_string().contains("Gold price unavailable"),
        "Unexpected error: {err}"
    );
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_concurrent_trade_commands_are_all_applied() {
    let temp_dir = TempDir::new().unwrap();
    let response =
        wiremock::ResponseTemplate::new(200).set_body_string(r#"{"rates": {"XAU": 0.0005}}"#);
    let mock_server = test_utils::create_mock_server(response, 1).await;
    let config_path = write_config(temp_dir.path(), &mock_server.uri());
    let user: AccountId = "dave".parse().unwrap();

    aurum::run_command(AppCommand::Open, Some(&user), Some(&config_path))
        .await
        .unwrap();

    // Every command opens the data directory itself, like separate CLI runs
    let runs = (0..10).map(|_| {
        aurum::run_command(
            AppCommand::Trade {
                kind: TradeKind::Sell,
                amount: dec!(1),
            },
            Some(&user),
            Some(&config_path),
        )
    });
    for result in futures::future::join_all(runs).await {
        assert!(result.is_ok(), "Trade failed with: {:?}", result.err());
    }

    let config = AppConfig::load_from_path(&config_path).unwrap();
    let app = App::open(&config).await.unwrap();
    let account = app.ledger.account(&user).await.unwrap();
    assert_eq!(account.trade_count, 10);
    assert_eq!(account.balance, dec!(29600.00));
    assert_eq!(app.history.list(&user, 1).await.unwrap().total_count, 10);
    app.shutdown().unwrap();
}

#[test_log::test(tokio::test)]
async fn test_account_commands_need_a_user() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server =
        test_utils::create_mock_server(wiremock::ResponseTemplate::new(500), 0).await;
    let config_path = write_config(temp_dir.path(), &mock_server.uri());

    let result = aurum::run_command(AppCommand::Balance, None, Some(&config_path)).await;
    let err = result.expect_err("Balance without an account should fail");
    assert!(err.to_string().contains("--user"), "Unexpected error: {err}");
}
