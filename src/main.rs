/// Helpdesk server binary
use helpdesk::{config::ServerConfig, server, AppContext, HelpdeskResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> HelpdeskResult<()> {
    // Load configuration (also reads .env)
    let config = ServerConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.logging.level)
                .unwrap_or_else(|_| "helpdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner();

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    __         __           __          __
   / /_  ___  / /___  ____/ /__  _____/ /__
  / __ \/ _ \/ / __ \/ __  / _ \/ ___/ //_/
 / / / /  __/ / /_/ / /_/ /  __(__  ) ,<
/_/ /_/\___/_/ .___/\__,_/\___/____/_/|_|
            /_/
        Helpdesk support server v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
