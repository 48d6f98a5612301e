use serde::Deserialize;
use tracing::info;

mod http;
mod rpc;
mod service;

#[derive(Deserialize, Debug)]
struct Config {
    server_address: String,
    #[serde(default = "default_cbr_base_url")]
    cbr_base_url: String,
}

fn default_cbr_base_url() -> String {
    "https://cbr.ru".to_string()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cfg = envy::from_env::<Config>().expect("unable to parse env variables");

    let cbr_client = rpc::cbr::Client::new(&cfg.cbr_base_url);

    info!("starting web server on address={}...", cfg.server_address);
    http::server::init(cbr_client, &cfg.server_address).await;
    info!("web server has been closed...");
}
