use clap::Parser;

mod config;
mod error;
mod http;
mod logging;
mod query;
mod random;
mod responder;
mod response;
mod server;

fn main() -> anyhow::Result<()> {
    let config = config::Config::try_from(config::Args::parse())?;
    logging::init(&config.log_filter)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?;
    runtime.block_on(server::run(&config))?;
    Ok(())
}
