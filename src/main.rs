use std::env;
use std::process;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nodo_calendar::app::App;
use nodo_calendar::config::Config;
use nodo_calendar::{cli, i18n};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nodo_calendar=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::parse(env::args().skip(1).collect());

    let config = Config::from_env()?;
    i18n::init_language(&config.ui.lang);
    tracing::debug!("Using backend {}", config.api.base_url);

    let result = match App::start(config).await {
        Ok(mut app) => app.run(args.command).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::debug!("Command failed: {}", e);
        eprintln!("{}", e.user_message());
        process::exit(1);
    }

    Ok(())
}
