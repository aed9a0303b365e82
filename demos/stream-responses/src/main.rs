use anyhow::Result;
use futures_util::StreamExt;
use open_responses::types::{EVENT_REASONING_DELTA, EVENT_TEXT_DELTA};
use open_responses::{ClientConfig, OpenResponsesClient, ResponseItem};
use tracing_subscriber::EnvFilter;

// Run against any Open Responses server:
//   cargo run -p stream-responses
// Optional:
//   OPEN_RESPONSES_BASE_URL=http://localhost:8001   (default)
//   OPEN_RESPONSES_API_KEY=sk-...
//   OPEN_RESPONSES_MODEL=deepseek/deepseek-r1       (default)
//   RUST_LOG=open_responses=debug

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let base_url = std::env::var("OPEN_RESPONSES_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:8001".to_string());
    let model = std::env::var("OPEN_RESPONSES_MODEL")
        .unwrap_or_else(|_| "deepseek/deepseek-r1".to_string());

    let mut cfg = ClientConfig::new(base_url);
    if let Ok(key) = std::env::var("OPEN_RESPONSES_API_KEY") {
        cfg = cfg.with_api_key(key);
    }
    let client = OpenResponsesClient::new(cfg)?;

    println!("\n========== Standard Request ==========");
    match client
        .create(model.as_str(), "Explain the Open Responses standard.", false, None)
        .await
    {
        Ok(resp) => {
            for item in resp.into_output().into_iter().flat_map(|o| o.output) {
                match item {
                    ResponseItem::Reasoning(r) => {
                        println!("[thinking] {}", preview(r.content.as_deref().unwrap_or("")));
                    }
                    ResponseItem::Message(m) => {
                        println!("[answer] {}", preview(&m.content.joined_text()));
                    }
                    ResponseItem::ToolCall(t) => println!("[tool] {} {}", t.name, t.id),
                }
            }
        }
        Err(err) => eprintln!("Error: {}", err.format_details()),
    }

    println!("\n========== Streaming Request ==========");
    let mut stream = match client
        .create(model.as_str(), "Stream this explanation.", true, None)
        .await
    {
        Ok(resp) => match resp.into_stream() {
            Some(stream) => stream,
            None => return Ok(()),
        },
        Err(err) => {
            eprintln!("Error: {}", err.format_details());
            return Ok(());
        }
    };
    while let Some(event) = stream.next().await {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                eprintln!("\nError: {}", err.format_details());
                return Ok(());
            }
        };
        match event.event.as_str() {
            EVENT_REASONING_DELTA => eprint!("{}", event.delta().unwrap_or_default()),
            EVENT_TEXT_DELTA => print!("{}", event.delta().unwrap_or_default()),
            _ if event.is_error() => {
                eprintln!("\nError: {}", event.error_message().unwrap_or("unknown"));
            }
            _ => {}
        }
        let _ = std::io::Write::flush(&mut std::io::stdout());
    }
    println!("\nDone");
    Ok(())
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(50).collect();
    if head.len() < text.len() {
        format!("{head}...")
    } else {
        head
    }
}
