use clap::Parser;
use spoonkeeper_lib::cli::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    spoonkeeper_lib::run(args).await?;
    Ok(())
}
