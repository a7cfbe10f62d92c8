use anyhow::Result;
use quill::build::build_site;
use quill::config::{app, Config};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let matches = app().get_matches();

    let filter = if matches.is_present("verbose") {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_matches(&matches)?;
    let report = build_site(&config)?;

    for error in &report.errors {
        eprintln!("{}", error);
    }
    if report.dropped_errors > 0 {
        warn!(dropped = report.dropped_errors, "Some parse errors were not kept");
    }
    info!(
        files = report.posts.len(),
        pages = report.pages_written,
        errors = report.errors.len(),
        "Done"
    );
    Ok(())
}
