use configuration::{Secrets, init_tracing, load_config};

// This main function is the entry point when running `cargo run -p web-server`.
// It loads the same config and `.env` as `adboard serve` and starts the server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = load_config()?;
    let _guard = init_tracing(&config.log)?;
    web_server::run_server(config, Secrets::from_env()).await
}
