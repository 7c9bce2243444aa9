//! Widgetry Engine - protocol server for the embedded component runtime.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    widgetry_engine::run::run().await
}
