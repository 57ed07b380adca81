use mock_server::MockConfig;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let mut config = MockConfig::default();
    if let Ok(api_key) = std::env::var("RTM_API_KEY") {
        config.api_key = api_key;
    }
    if let Ok(secret) = std::env::var("RTM_SHARED_SECRET") {
        config.secret = secret;
    }
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {addr} (api_key {})", config.api_key);
    mock_server::run(listener, config).await
}
