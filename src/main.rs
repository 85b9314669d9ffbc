use clap::Parser;
use fire_compass::api::{Cli, Command, run_http_server, simulate_json};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Simulate(args) => {
            // plan runs on rayon; keep it off the async worker
            let result = tokio::task::spawn_blocking(move || simulate_json(args)).await;
            match result {
                Ok(Ok(json)) => println!("{json}"),
                Ok(Err(e)) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Simulation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Serve { port } => {
            if let Err(e) = run_http_server(port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
    }
}
