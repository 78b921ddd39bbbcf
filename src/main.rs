#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    reflex_lib::run().await
}
