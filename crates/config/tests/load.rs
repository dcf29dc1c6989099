use app_config::AppConfig;
use std::time::Duration;

#[test]
fn test_load_default_config() {
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.db_port, 5432);
    assert_eq!(cfg.db_name, "ecommerce_app");
    assert_eq!(cfg.shutdown_timeout, Duration::from_secs(5));
}

#[test]
fn test_db_dsn_contains_all_parts() {
    let cfg = AppConfig::load().unwrap();
    let dsn = cfg.db_dsn();
    assert!(dsn.contains("port=5432"));
    assert!(dsn.contains("dbname=ecommerce_app"));
    assert!(dsn.contains("sslmode=disable"));
}
