use serial_test::serial;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;
use whub_logger::{LevelFilter, Logger, LoggerError};

// A process can only install one global subscriber, so both scenarios share this binary and run
// in a fixed order.
#[test]
#[serial]
fn json_file_logging_then_second_init_fails() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let dir = tmp.path().join("logs");

    let logger = Logger::builder("whub-it")
        .console(false)
        .path(&dir)
        .json(true)
        .level(LevelFilter::INFO)
        .init()?;
    assert!(logger.writes_files());

    tracing::info!(listing = "shop:Xy7", "listing created");
    std::thread::sleep(Duration::from_millis(50));

    let err = Logger::builder("whub-it-again").init().unwrap_err();
    assert!(matches!(err, LoggerError::Subscriber { .. }));

    drop(logger);

    let file = fs::read_dir(&dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("a log file is created");
    let contents = fs::read_to_string(file)?;
    let line =
        contents.lines().find(|line| line.contains("listing created")).expect("event logged");
    assert!(line.trim_start().starts_with('{'), "file output should be JSON: {line}");
    assert!(line.contains("shop:Xy7"));

    Ok(())
}
