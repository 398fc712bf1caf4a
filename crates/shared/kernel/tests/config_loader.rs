use std::io::Write;
use whub_domain::config::ApiConfig;
use whub_kernel::config::ConfigLoader;

fn toml_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn missing_optional_file_yields_defaults() {
    let cfg: ApiConfig = ConfigLoader::new()
        .optional_file("does-not-exist/server")
        .env_source(Vec::<(String, String)>::new())
        .load()
        .unwrap();

    assert_eq!(cfg.server.port, 4583);
    assert_eq!(cfg.database.url, "mem://");
    assert_eq!(cfg.marketplace.currency, "MXN");
    assert_eq!(cfg.marketplace.default_page_size, 50);
}

#[test]
fn missing_required_file_is_an_error() {
    let result = ConfigLoader::new()
        .file("does-not-exist/server.toml")
        .env_source(Vec::<(String, String)>::new())
        .load::<ApiConfig>();
    assert!(result.is_err());
}

#[test]
fn file_values_override_defaults() {
    let file = toml_file(
        r#"
        [server]
        port = 9000

        [marketplace]
        currency = "USD"
        stats_window_days = 7
        "#,
    );

    let cfg: ApiConfig = ConfigLoader::new()
        .file(file.path())
        .env_source(Vec::<(String, String)>::new())
        .load()
        .unwrap();

    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.marketplace.currency, "USD");
    assert_eq!(cfg.marketplace.stats_window_days, 7);
    assert_eq!(cfg.marketplace.renewal_horizon_days, 14);
}

#[test]
fn environment_overrides_the_file() {
    let file = toml_file("[server]\nport = 9000\n");

    let cfg: ApiConfig = ConfigLoader::new()
        .file(file.path())
        .env_source([
            ("WHUB__SERVER__PORT", "8080"),
            ("WHUB__SERVER__CORS_ORIGINS", "https://prana.mx,https://admin.prana.mx"),
            ("WHUB__LOGGING__LEVEL", "debug"),
            ("UNRELATED", "ignored"),
        ])
        .load()
        .unwrap();

    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.server.cors_origins, ["https://prana.mx", "https://admin.prana.mx"]);
    assert_eq!(cfg.logging.level, "debug");
}
