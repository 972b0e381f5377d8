#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = examgate_rust::run().await {
        eprintln!("examgate-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
