use std::io;

use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    // A missing .env file is fine; the variables may come from the shell.
    let _ = dotenvy::dotenv();

    firebase_smoke::probe::run_from_env(io::stdout()).await;
}
