#[tokio::main]
async fn main() {
    if let Err(e) = kanban::run().await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
