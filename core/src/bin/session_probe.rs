//! Command-line composition root: builds the shared client once, optionally
//! logs in, then issues one GET and prints the outcome.

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use session_core::config::DEFAULT_BASE_URL;
use session_core::{ApiClient, ApiError, ClientConfig, LogNavigator, ReqwestTransport};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "session-probe", about = "Query the backend API with a session cookie")]
struct Args {
    /// Path to fetch after an optional login.
    #[arg(default_value = "/api/profile")]
    path: String,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, requires = "password")]
    student_id: Option<String>,

    #[arg(long, requires = "student_id")]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let transport = ReqwestTransport::new().context("failed to build HTTP transport")?;
    let client = ApiClient::new(ClientConfig::with_base_url(&args.base_url), transport, LogNavigator);

    if let (Some(student_id), Some(password)) = (&args.student_id, &args.password) {
        let body = json!({ "student_id": student_id, "password": password });
        let resp = client.post("/login", &body).await.context("login failed")?;
        println!("login: HTTP {}", resp.status);
    }

    match client.get(&args.path).await {
        Ok(resp) => {
            println!("HTTP {}", resp.status);
            println!("{}", resp.body);
            Ok(())
        }
        Err(ApiError::Unauthorized { response }) => {
            println!("HTTP {} (session rejected)", response.status);
            println!("{}", response.body);
            Ok(())
        }
        Err(err) => Err(err).with_context(|| format!("GET {} failed", args.path)),
    }
}
