use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    easyapply_cli::cli::run().await
}
