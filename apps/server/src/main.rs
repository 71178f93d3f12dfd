use anyhow::Context;
use velaux::domain::config::ApiConfig;
use velaux::kernel::config::load_config;
use velaux_logger::Logger;
use velaux_server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional config file path as the only argument; `server.*` in the working dir otherwise.
    let path = std::env::args_os().nth(1);
    let cfg: ApiConfig = load_config(path).context("Critical: Configuration is malformed")?;

    let _log = Logger::builder().name(env!("CARGO_PKG_NAME")).configure(&cfg.logging)?.init()?;

    Server::builder().config(cfg).build().await?.run().await
}
