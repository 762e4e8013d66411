#[tokio::main]
async fn main() -> anyhow::Result<()> {
    planto_lib::run().await
}
