use std::{io, process};

use remote_pager::{
    application::{
        commands::{build_loader, run_fetch, run_scroll},
        error::AppError,
    },
    config,
    infra::{http, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let client = http::build_client(&settings.http)?;
    let loader = build_loader(&settings, client)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = match &cli_args.command {
        config::Command::Fetch(args) => run_fetch(&loader, args, &mut out).await,
        config::Command::Scroll(args) => run_scroll(&loader, args, &mut out).await,
    };

    loader.destroy();
    result
}
