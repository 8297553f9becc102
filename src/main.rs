use std::process::ExitCode;

use clap::Parser;

use llama_client::commands::{self, Cli, Exit, RunSettings};
use llama_client::inference::config::load_file_config;

fn main() -> ExitCode {
    let cli = Cli::parse();
    llama_client::init_tracing(cli.log_json);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(try_main(cli));
    // A pending stdin read holds a blocking thread; don't wait for it.
    runtime.shutdown_background();

    match result {
        Ok(exit) => exit.into(),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn try_main(cli: Cli) -> anyhow::Result<Exit> {
    let file_config = load_file_config(cli.config.as_deref())?;
    let settings = RunSettings::resolve(cli, file_config);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    commands::run(&settings, stdin, &mut stdout, interrupt).await
}
