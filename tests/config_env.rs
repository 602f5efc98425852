//! Environment overrides. Kept in its own test binary because the
//! process environment is shared by every test thread.

use alloy::primitives::U256;
use ink_monitor::config::AppConfig;

const OVERRIDES: &[(&str, &str)] = &[
    ("INK_MONITOR_EMERGENCY__ENABLED", "true"),
    ("INK_MONITOR_EMERGENCY__WITHDRAW_AMOUNT", "123456789012345678901"),
    ("INK_MONITOR_MONITOR__RETRY_TIMES", "7"),
    ("INK_MONITOR_MONITOR__PRICE_DEVIATION_THRESHOLD", "0.02"),
];

/// Single-underscore prefix with `__` nesting reaches every section, and
/// large wei amounts survive unchanged
#[test]
fn environment_overrides_file_values() {
    let dir = std::env::temp_dir().join(format!("ink-monitor-env-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("monitor.toml");
    std::fs::write(
        &path,
        r#"
eth_rpc = "https://eth.example.org"
ink_rpc = "https://ink.example.org"

[prometheus]
gateway_url = "http://pushgateway:9091"

[emergency]
enabled = false
withdraw_amount = "1"
"#,
    )
    .unwrap();

    for (key, value) in OVERRIDES {
        std::env::set_var(key, value);
    }
    let loaded = AppConfig::load_from("does-not-exist", Some(&path));
    for (key, _) in OVERRIDES {
        std::env::remove_var(key);
    }
    let cfg = loaded.unwrap();

    assert!(cfg.emergency.enabled);
    assert_eq!(cfg.emergency.withdraw_amount, "123456789012345678901");
    assert_eq!(
        cfg.emergency.amount().unwrap(),
        U256::from(123_456_789_012_345_678_901u128)
    );
    assert_eq!(cfg.monitor.retry_times, 7);
    assert_eq!(cfg.monitor.price_deviation_threshold, 0.02);
}
