use siputzx_http::{ApiResponse, ClientOptions, FetchRequest, SiputzxClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let api = SiputzxClient::from_env()
        .map_err(anyhow::Error::msg)?
        .with_options(ClientOptions {
            timeout_ms: 15_000,
            ..ClientOptions::default()
        });

    let response: ApiResponse<String> = api
        .request(
            FetchRequest::get("ai/llama33")
                .param("prompt", "Answer in one sentence.")
                .param("text", "What does a retry budget protect against?"),
        )
        .await?;

    println!("{}", response.into_data()?);
    Ok(())
}
