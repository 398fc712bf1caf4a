use anyhow::Context;
use whub::domain::config::ApiConfig;
use whub::kernel::config::load_config;
use whub_logger::{Logger, parse_level};
use whub_server::Server;

#[whub_runtime::main(high_performance)]
async fn main() -> anyhow::Result<()> {
    let cfg: ApiConfig = load_config(None).context("Critical: Configuration is malformed")?;

    let logging = &cfg.logging;
    let mut logger = Logger::builder(env!("CARGO_PKG_NAME"))
        .level(parse_level(&logging.level)?)
        .json(logging.json)
        .max_files(logging.max_files);
    if let Some(filter) = &logging.filter {
        logger = logger.filter(filter.as_str());
    }
    if let Some(path) = &logging.path {
        logger = logger.path(path);
    }
    let _log = logger.init()?;

    Server::builder().config(cfg).build().await?.run().await
}
