#[tokio::main]
async fn main() {
    if let Err(e) = addin_auth_cli::run().await {
        eprintln!("Error: {}", e);
        for suggestion in e.suggestions() {
            eprintln!("  hint: {}", suggestion);
        }
        std::process::exit(1);
    }
}
