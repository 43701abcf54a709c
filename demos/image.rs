use siputzx_http::SiputzxClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "a lighthouse at dusk".to_owned());

    let api = SiputzxClient::from_env().map_err(anyhow::Error::msg)?;
    let image = api.get_binary("ai/flux", [("prompt", prompt.as_str())]).await?;

    std::fs::write("flux.png", &image)?;
    println!("wrote {} bytes to flux.png", image.len());
    Ok(())
}
