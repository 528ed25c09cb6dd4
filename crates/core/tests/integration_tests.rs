use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Mutex;

use wallet_ledger_core::errors::CoreError;
use wallet_ledger_core::models::chart::RenderedArtifact;
use wallet_ledger_core::models::settings::{DirectionPolicy, WalletSettings, WindowMode};
use wallet_ledger_core::models::transaction::RawTransaction;
use wallet_ledger_core::providers::etherscan::EtherscanProvider;
use wallet_ledger_core::providers::json_renderer::JsonSeriesRenderer;
use wallet_ledger_core::providers::registry::OracleRegistry;
use wallet_ledger_core::providers::traits::{DeliveryChannel, LedgerSource, PriceOracle};
use wallet_ledger_core::WalletTracker;

// ═══════════════════════════════════════════════════════════════════
// Mock collaborators (for testing without real API calls)
// ═══════════════════════════════════════════════════════════════════

const WALLET: &str = "0xD22849fcB4C83389E65a1c40748a9b67157638A3";
const TOKEN: u128 = 1_000_000_000_000_000_000;

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_720_000_000, 0).unwrap()
}

fn days_ago(days: i64) -> i64 {
    (now() - Duration::days(days)).timestamp()
}

/// Explorer pages shaped like real `tokentx` / `txlistinternal` responses.
fn external_page() -> String {
    format!(
        r#"{{"status":"1","message":"OK","result":[
            {{"hash":"0x01","timeStamp":"{}","from":"0xaaaa000000000000000000000000000000000001","to":"{}","value":"{}","gasUsed":"60000","gasPrice":"20000000000"}},
            {{"hash":"0x02","timeStamp":"{}","from":"{}","to":"0xbbbb000000000000000000000000000000000002","value":"{}","gasUsed":"50000","gasPrice":"20000000000"}},
            {{"hash":"0x03","timeStamp":"{}","from":"0xaaaa000000000000000000000000000000000001","to":"{}","value":"{}","gasUsed":"60000","gasPrice":"20000000000"}}
        ]}}"#,
        days_ago(200),
        WALLET.to_lowercase(),
        1_000 * TOKEN,
        days_ago(30),
        WALLET.to_lowercase(),
        100 * TOKEN,
        days_ago(10),
        WALLET.to_lowercase(),
        50 * TOKEN,
    )
}

fn internal_page() -> String {
    format!(
        r#"{{"status":"1","message":"OK","result":[
            {{"hash":"0x04","timeStamp":"{}","from":"0xcccc000000000000000000000000000000000003","to":"{}","value":"{}","gasUsed":"0"}}
        ]}}"#,
        days_ago(5),
        WALLET,
        TOKEN / 2,
    )
}

struct ExplorerFixture {
    external: Vec<RawTransaction>,
    internal: Vec<RawTransaction>,
    balance: u128,
}

impl ExplorerFixture {
    fn new() -> Self {
        Self {
            external: EtherscanProvider::parse_transactions(&external_page()).unwrap(),
            internal: EtherscanProvider::parse_transactions(&internal_page()).unwrap(),
            balance: 2_500_000_000_000_000_000,
        }
    }

    fn empty() -> Self {
        let none = r#"{"status":"0","message":"No transactions found","result":[]}"#;
        Self {
            external: EtherscanProvider::parse_transactions(none).unwrap(),
            internal: EtherscanProvider::parse_transactions(none).unwrap(),
            balance: 0,
        }
    }
}

#[async_trait]
impl LedgerSource for ExplorerFixture {
    fn name(&self) -> &str {
        "ExplorerFixture"
    }

    async fn fetch_external_transfers(
        &self,
        _contract: &str,
        _address: &str,
    ) -> Result<Vec<RawTransaction>, CoreError> {
        Ok(self.external.clone())
    }

    async fn fetch_internal_transfers(
        &self,
        _contract: &str,
        _address: &str,
    ) -> Result<Vec<RawTransaction>, CoreError> {
        Ok(self.internal.clone())
    }

    async fn fetch_token_balance(&self, _contract: &str, _address: &str) -> Result<u128, CoreError> {
        Ok(self.balance)
    }
}

struct StaticOracle(&'static str);

#[async_trait]
impl PriceOracle for StaticOracle {
    fn name(&self) -> &str {
        "StaticOracle"
    }

    async fn get_unit_price(&self, _token: &str, _currency: &str) -> Result<Decimal, CoreError> {
        Ok(Decimal::from_str(self.0).unwrap())
    }
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(RenderedArtifact, String)>>,
}

#[async_trait]
impl DeliveryChannel for Outbox {
    async fn deliver(&self, artifact: RenderedArtifact, caption: &str) -> Result<(), CoreError> {
        self.sent
            .lock()
            .unwrap()
            .push((artifact, caption.to_string()));
        Ok(())
    }
}

fn tracker(settings: WalletSettings, fixture: ExplorerFixture, price: &'static str) -> WalletTracker {
    let mut registry = OracleRegistry::new();
    registry.register(Box::new(StaticOracle(price)));
    WalletTracker::with_collaborators(settings, Box::new(fixture), registry).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════

#[test]
fn new_wires_default_collaborators() {
    let tracker = WalletTracker::new(WalletSettings::default()).unwrap();
    let debug = format!("{tracker:?}");
    assert!(debug.contains("Etherscan"));
    assert!(debug.contains("CoinGecko"));
    assert_eq!(tracker.settings().window_days, 90);
}

#[test]
fn invalid_settings_are_rejected() {
    let settings = WalletSettings {
        window_days: 0,
        ..WalletSettings::default()
    };
    let result =
        WalletTracker::with_collaborators(settings, Box::new(ExplorerFixture::empty()), OracleRegistry::new());
    assert!(matches!(result, Err(CoreError::ValidationError(_))));
}

// ═══════════════════════════════════════════════════════════════════
// Prices & balance
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn unit_price_comes_from_oracle() {
    let tracker = tracker(WalletSettings::default(), ExplorerFixture::new(), "0.0000095");
    assert_eq!(tracker.unit_price().await.unwrap(), dec("0.0000095"));
}

#[tokio::test]
async fn current_token_balance_is_scaled() {
    let tracker = tracker(WalletSettings::default(), ExplorerFixture::new(), "1");
    assert_eq!(tracker.current_token_balance().await.unwrap(), dec("2.5"));
}

// ═══════════════════════════════════════════════════════════════════
// Balance history end to end
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn continuous_history_carries_pre_window_holdings() {
    let tracker = tracker(WalletSettings::default(), ExplorerFixture::new(), "2");
    let series = tracker.balance_history(now()).await.unwrap();

    // The 200-day-old deposit is outside the 90-day window but still counted.
    assert_eq!(series.len(), 3);
    // 1000 in, then 100 out plus 50000 * 20 gwei = 0.001 fee
    assert_eq!(series.points[0].token_balance, dec("899.999"));
    assert_eq!(series.points[1].token_balance, dec("949.999"));
    assert_eq!(series.points[2].token_balance, dec("950.499"));
    assert_eq!(series.points[2].usd_value, dec("1900.998"));
    assert!(series.rejected.is_empty());
}

#[tokio::test]
async fn reset_history_starts_at_window_edge() {
    let settings = WalletSettings {
        window_mode: WindowMode::ResetAtWindowStart,
        ..WalletSettings::default()
    };
    let tracker = tracker(settings, ExplorerFixture::new(), "1");
    let series = tracker.balance_history(now()).await.unwrap();
    assert_eq!(series.points[0].token_balance, dec("-100.001"));
    assert_eq!(series.closing_balance, dec("-49.501"));
}

#[tokio::test]
async fn strict_policy_from_settings() {
    let mut fixture = ExplorerFixture::new();
    fixture.external.push(RawTransaction::external(
        "0xaaaa000000000000000000000000000000000001",
        "0xbbbb000000000000000000000000000000000002",
        TOKEN,
        days_ago(1),
        0,
        0,
    ));
    let settings = WalletSettings {
        direction_policy: DirectionPolicy::Strict,
        ..WalletSettings::default()
    };
    let tracker = tracker(settings, fixture, "1");
    let series = tracker.balance_history(now()).await.unwrap();
    assert_eq!(series.ignored, 1);
    assert_eq!(series.closing_balance, dec("950.499"));
}

#[tokio::test]
async fn empty_ledger_is_an_empty_series() {
    let tracker = tracker(WalletSettings::default(), ExplorerFixture::empty(), "1");
    let series = tracker.balance_history(now()).await.unwrap();
    assert!(series.is_empty());
}

// ═══════════════════════════════════════════════════════════════════
// Publishing
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn publish_chart_delivers_json_with_address_link() {
    let tracker = tracker(WalletSettings::default(), ExplorerFixture::new(), "2");
    let outbox = Outbox::default();
    let sent = tracker
        .publish_chart(now(), &JsonSeriesRenderer::new(), &outbox)
        .await
        .unwrap();
    assert!(sent);

    let delivered = outbox.sent.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(
        delivered[0].1,
        "https://etherscan.io/address/0xd22849fcb4c83389e65a1c40748a9b67157638a3"
    );
    let body: serde_json::Value = serde_json::from_slice(&delivered[0].0.bytes).unwrap();
    assert_eq!(
        body["title"],
        "Community Wallet Balance | Total Price: $1,901.00"
    );
    assert_eq!(body["series"]["points"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn publish_chart_aborts_on_zero_price() {
    let tracker = tracker(WalletSettings::default(), ExplorerFixture::new(), "0");
    let outbox = Outbox::default();
    let result = tracker
        .publish_chart(now(), &JsonSeriesRenderer::new(), &outbox)
        .await;
    assert!(matches!(result, Err(CoreError::PricingUnavailable(_))));
    assert!(outbox.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn publish_chart_is_noop_for_empty_window() {
    let tracker = tracker(WalletSettings::default(), ExplorerFixture::empty(), "1");
    let outbox = Outbox::default();
    let sent = tracker
        .publish_chart(now(), &JsonSeriesRenderer::new(), &outbox)
        .await
        .unwrap();
    assert!(!sent);
    assert!(outbox.sent.lock().unwrap().is_empty());
}
