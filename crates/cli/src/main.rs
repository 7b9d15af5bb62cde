use clap::Parser;

#[tokio::main]
async fn main() {
    if let Err(err) = carat_cli::run(carat_cli::args::Cli::parse()).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
