use pivotfx::core::rate::RateStore;
use pivotfx::core::{ConversionError, CurrencyCode, RateConverter, RatePipeline};
use pivotfx::providers::CurrencyFreaksProvider;
use pivotfx::store::MemoryRateStore;
use rust_decimal::Decimal;
use std::fs;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing::info;

const LATEST_BODY: &str = r#"{
    "date": "2024-01-10 00:00:00+00",
    "base": "RUB",
    "rates": {"USD": "0.011", "EUR": "0.01", "JPY": "1.6"}
}"#;

mod test_utils {
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(endpoint: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    /// Writes a config pointing at `base_url` with the rate store inside `dir`.
    pub fn write_config(dir: &TempDir, base_url: &str) -> PathBuf {
        let config_path = dir.path().join("config.yaml");
        let data_path = dir.path().join("rates");
        let config_content = format!(
            r#"
provider:
  base_url: "{}"
  api_key: "test-key"
  timeout_secs: 5
pivot: RUB
symbols: [EUR, USD, JPY]
fetch_timeout_secs: 5
schedule:
  every_minutes: 60
data_path: "{}"
"#,
            base_url,
            data_path.display()
        );
        fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path
    }
}

#[test_log::test(tokio::test)]
async fn test_fetch_then_rate_flow() {
    let mock_server = test_utils::create_mock_server("/rates/latest", 200, LATEST_BODY).await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &mock_server.uri());
    let config_path = config_path.to_str().unwrap();

    let result = pivotfx::run_command(pivotfx::AppCommand::Fetch, Some(config_path)).await;
    assert!(result.is_ok(), "Fetch failed with: {:?}", result.err());

    for (base, quote) in [("USD", "RUB"), ("RUB", "EUR"), ("eur", "usd"), ("JPY", "USD")] {
        let result = pivotfx::run_command(
            pivotfx::AppCommand::Rate {
                base: base.to_string(),
                quote: quote.to_string(),
                json: false,
            },
            Some(config_path),
        )
        .await;
        assert!(result.is_ok(), "Rate {base}/{quote} failed with: {:?}", result.err());
    }

    let result = pivotfx::run_command(pivotfx::AppCommand::Rates, Some(config_path)).await;
    assert!(result.is_ok(), "Rates failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_setup_config_drives_commands() {
    let mock_server = test_utils::create_mock_server("/rates/latest", 200, LATEST_BODY).await;
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    pivotfx::cli::setup::setup_at_path(&config_path).unwrap();

    // Point the generated config at the mock server and a temp store, keep the rest.
    let generated = fs::read_to_string(&config_path).unwrap();
    assert!(generated.contains("daily_at"));
    let patched = generated
        .replace("https://api.currencyfreaks.com/v2.0", &mock_server.uri())
        .replace("# api_key: \"your-key\"", "api_key: \"test-key\"")
        .replace(
            "# data_path: \"/var/lib/pivotfx\"",
            &format!("data_path: \"{}\"", dir.path().join("rates").display()),
        );
    fs::write(&config_path, patched).unwrap();
    let config_path = config_path.to_str().unwrap();

    let result = pivotfx::run_command(pivotfx::AppCommand::Fetch, Some(config_path)).await;
    assert!(result.is_ok(), "Fetch failed with: {:?}", result.err());

    let result = pivotfx::run_command(pivotfx::AppCommand::Rates, Some(config_path)).await;
    assert!(result.is_ok(), "Rates failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_rate_business_errors() {
    let mock_server = test_utils::create_mock_server("/rates/latest", 200, LATEST_BODY).await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &mock_server.uri());
    let config_path = config_path.to_str().unwrap();

    let rate = |base: &str, quote: &str| pivotfx::AppCommand::Rate {
        base: base.to_string(),
        quote: quote.to_string(),
        json: true,
    };

    // Nothing stored yet.
    let err = pivotfx::run_command(rate("USD", "RUB"), Some(config_path))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConversionError>(),
        Some(ConversionError::RateNotAvailable { .. })
    ));

    let err = pivotfx::run_command(rate("RUB", "RUB"), Some(config_path))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConversionError>(),
        Some(ConversionError::SameCurrency(CurrencyCode::RUB))
    ));

    let err = pivotfx::run_command(rate("GBP", "RUB"), Some(config_path))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConversionError>(),
        Some(ConversionError::UnsupportedCurrency(_))
    ));
}

#[test_log::test(tokio::test)]
async fn test_provider_failure_stores_nothing() {
    let mock_server =
        test_utils::create_mock_server("/rates/latest", 500, r#"{"error":"down"}"#).await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &mock_server.uri());
    let config_path = config_path.to_str().unwrap();

    let err = pivotfx::run_command(pivotfx::AppCommand::Fetch, Some(config_path))
        .await
        .unwrap_err();
    info!(error = %format!("{err:#}"), "Fetch failed as expected");
    assert!(format!("{err:#}").contains("provider http 500"));

    let err = pivotfx::run_command(
        pivotfx::AppCommand::Rate {
            base: "RUB".to_string(),
            quote: "USD".to_string(),
            json: false,
        },
        Some(config_path),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("not available"));
}

#[test_log::test(tokio::test)]
async fn test_historical_is_not_persisted() {
    let body = r#"{
        "date": "2023-03-01 00:00:00+00",
        "base": "USD",
        "rates": {"RUB": "75.4", "EUR": "0.94", "JPY": "136.2"}
    }"#;
    let mock_server = test_utils::create_mock_server("/rates/historical", 200, body).await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &mock_server.uri());
    let config_path = config_path.to_str().unwrap();

    let result = pivotfx::run_command(
        pivotfx::AppCommand::Historical {
            date: "2023-03-01".to_string(),
            base: Some("usd".to_string()),
        },
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Historical failed with: {:?}", result.err());

    let err = pivotfx::run_command(
        pivotfx::AppCommand::Rate {
            base: "USD".to_string(),
            quote: "RUB".to_string(),
            json: false,
        },
        Some(config_path),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("not available"));

    let err = pivotfx::run_command(
        pivotfx::AppCommand::Historical {
            date: "".to_string(),
            base: None,
        },
        Some(config_path),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("date is required"));
}

#[test_log::test(tokio::test)]
async fn test_pipeline_and_converter_through_library_api() {
    let mock_server = test_utils::create_mock_server("/rates/latest", 200, LATEST_BODY).await;
    let provider =
        CurrencyFreaksProvider::new(&mock_server.uri(), "test-key", Duration::from_secs(5))
            .unwrap();
    let store = Arc::new(MemoryRateStore::new());
    let pipeline = RatePipeline::new(Arc::new(provider), store.clone());

    let symbols = [CurrencyCode::EUR, CurrencyCode::USD, CurrencyCode::JPY];
    let resp = pipeline
        .fetch_and_save(CurrencyCode::RUB, &symbols)
        .await
        .unwrap();
    assert_eq!(resp.base, "RUB");

    let stored = store.get_latest(CurrencyCode::RUB, &[]).await.unwrap();
    assert_eq!(stored.len(), 3);

    let converter = RateConverter::new(store);
    let dec = |s: &str| Decimal::from_str(s).unwrap();

    let pair = converter
        .get_pair_rate(CurrencyCode::USD, CurrencyCode::RUB)
        .await
        .unwrap();
    assert_eq!(pair.rounded(2).rate, dec("90.91"));

    let pair = converter
        .get_pair_rate(CurrencyCode::EUR, CurrencyCode::USD)
        .await
        .unwrap();
    assert_eq!(pair.rate, dec("1.1"));
    assert_eq!(pair.date.to_string(), "2024-01-10");
}
