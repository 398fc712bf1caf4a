use serde_json::json;
use whub_domain::config::{ApiConfig, DatabaseConfig, MarketplaceConfig, ServerConfig};

#[test]
fn defaults_match_the_documented_values() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 4583);
    assert!(server.ssl.is_none());
    assert!(server.cors_origins.is_empty());

    let db = DatabaseConfig::default();
    assert_eq!(db.url, "mem://");
    assert_eq!(db.namespace, "whub");
    assert_eq!(db.database, "marketplace");

    let market = MarketplaceConfig::default();
    assert_eq!(market.currency, "MXN");
    assert_eq!(market.max_attachment_bytes, 52_428_800);
    assert_eq!((market.default_page_size, market.max_page_size), (50, 200));
}

#[test]
fn partial_documents_fall_back_to_defaults() {
    let raw = json!({
        "server": { "port": 8080, "cors_origins": ["https://app.example"] },
        "marketplace": { "currency": "USD" },
        "logging": { "level": "debug", "json": true }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).unwrap();
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.server.cors_origins, vec!["https://app.example".to_owned()]);
    assert_eq!(cfg.marketplace.currency, "USD");
    assert_eq!(cfg.marketplace.stats_window_days, 30);
    assert_eq!(cfg.logging.level, "debug");
    assert!(cfg.logging.json);
    assert_eq!(cfg.logging.max_files, 10);
    assert_eq!(cfg.database.namespace, "whub");
}

#[test]
fn deref_mut_clones_on_write() {
    let original = ApiConfig::default();
    let mut edited = original.clone();
    edited.marketplace.currency = "EUR".to_owned();

    assert_eq!(original.marketplace.currency, "MXN");
    assert_eq!(edited.marketplace.currency, "EUR");
}
