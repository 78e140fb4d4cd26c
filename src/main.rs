use colored::Colorize;

#[tokio::main]
async fn main() {
    if let Err(e) = lium_cli::run().await {
        eprintln!("{} Error: {}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
