use miette::{Result, WrapErr};
use tracing_subscriber::EnvFilter;
use weather_summary::summarize_file;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let file = std::env::args()
        .nth(1)
        .ok_or_else(|| miette::miette!("Missing filename"))?;

    let summaries = summarize_file(&file).wrap_err_with(|| format!("could not summarize {file}"))?;

    println!("{}", summaries.overview);
    print!("{}", summaries.daily);

    Ok(())
}
