//! HTTP server for the social media trends store
//! Simple HTTP server using tokio and basic HTTP handling

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use trend_analysis_backend::config::ServerConfig;
use trend_analysis_backend::error::TrendError;
use trend_analysis_backend::gateway::QueryGateway;
use trend_analysis_backend::ingestion;
use trend_analysis_backend::store::PostStore;

#[derive(Parser)]
#[command(name = "trend-server")]
#[command(about = "HTTP API over the social media trends store")]
struct Args {
    /// Path to the SQLite database (or set SQLITE_DB_PATH env var)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Path to the source CSV imported on first start
    #[arg(long)]
    csv_path: Option<PathBuf>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = ServerConfig::resolve(args.db_path, args.csv_path, args.port);

    let store = Arc::new(PostStore::new(&config.db_path));
    // Unreachable store is fatal at startup; everything after is fail-soft.
    store.connect()?;

    match ingestion::run(&store, &config.csv_path) {
        Ok(report) => info!(
            "Ingestion finished: {} found, {} inserted, {} skipped",
            report.records_found, report.records_inserted, report.records_skipped
        ),
        Err(e) => error!("Error reading or importing CSV data: {}", e),
    }

    let gateway = Arc::new(QueryGateway::new(store.clone()));

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Server listening on http://localhost:{}", config.port);

    loop {
        let (stream, addr) = listener.accept().await?;
        info!("New connection from: {}", addr);
        let store = store.clone();
        let gateway = gateway.clone();
        tokio::spawn(async move {
            handle_connection(stream, store, gateway).await;
        });
    }
}

async fn handle_connection(mut stream: TcpStream, store: Arc<PostStore>, gateway: Arc<QueryGateway>) {
    use tokio::time::{timeout, Duration};

    // Read request with timeout to prevent hanging
    let mut buffer = Vec::new();
    let mut temp_buf = [0; 8192];

    let read_result = timeout(Duration::from_secs(5), async {
        loop {
            match stream.read(&mut temp_buf).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    buffer.extend_from_slice(&temp_buf[..n]);
                    // Check if we've reached the end of HTTP headers + body
                    if let Ok(s) = std::str::from_utf8(&buffer) {
                        if s.contains("\r\n\r\n") {
                            if let Some(content_length) = extract_content_length(s) {
                                let headers_end = s.find("\r\n\r\n").unwrap() + 4;
                                if buffer.len() >= headers_end + content_length {
                                    break; // We have the complete request
                                }
                            } else if n < temp_buf.len() {
                                break;
                            }
                        }
                    }
                    if buffer.len() > 1_000_000 {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read from stream: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(())
    })
    .await;

    if read_result.is_err() {
        warn!("Request read timeout");
        return;
    }

    if buffer.is_empty() {
        return;
    }

    match String::from_utf8(buffer) {
        Ok(request) => {
            let response = handle_request(&request, &store, &gateway).await;
            if let Err(e) = stream.write_all(response.as_bytes()).await {
                error!("Failed to write response: {}", e);
            }
        }
        Err(e) => {
            error!("Failed to parse request as UTF-8: {}", e);
        }
    }
}

fn extract_content_length(request: &str) -> Option<usize> {
    for line in request.lines() {
        if line.to_lowercase().starts_with("content-length:") {
            if let Some(value) = line.split(':').nth(1) {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

fn extract_body(request: &str) -> Option<&str> {
    request.split_once("\r\n\r\n").map(|(_, body)| body)
}

async fn handle_request(request: &str, store: &PostStore, gateway: &QueryGateway) -> String {
    let lines: Vec<&str> = request.lines().collect();
    if lines.is_empty() {
        return create_response(400, "Bad Request", "{}");
    }

    let request_line = lines[0];
    let parts: Vec<&str> = request_line.split_whitespace().collect();

    if parts.len() < 2 {
        return create_response(400, "Bad Request", "{}");
    }

    let method = parts[0];
    let full_path = parts[1].to_string();

    let path_str = match full_path.find('?') {
        Some(query_start) => full_path[..query_start].to_string(),
        None => full_path,
    };

    // Normalize path (remove trailing slash except for root)
    let mut normalized_path = path_str.trim_end_matches('/').to_string();
    if normalized_path.is_empty() {
        normalized_path = "/".to_string();
    }
    let path = normalized_path.as_str();

    info!("Request: {} {}", method, path);

    match (method, path) {
        ("GET", "/") => create_response(200, "OK", r#"{"message":"Trend analysis API is running"}"#),
        ("GET", "/api/health") => {
            create_response(200, "OK", r#"{"status":"ok","service":"trend-analysis-api"}"#)
        }
        ("GET", "/allposts") => handle_all_posts(store),
        ("POST", "/allquery") => {
            let body = extract_body(request).unwrap_or("");
            handle_all_query(body, gateway)
        }
        ("OPTIONS", _) => create_response(200, "OK", ""),
        _ => create_response(
            404,
            "Not Found",
            &format!(r#"{{"error":"Endpoint not found: {} {}"}}"#, method, path),
        ),
    }
}

/// GET /allposts - first five records from a full scan.
fn handle_all_posts(store: &PostStore) -> String {
    match store.scan_all() {
        Ok(posts) => {
            let preview: Vec<_> = posts.into_iter().take(5).collect();
            match serde_json::to_string(&preview) {
                Ok(json) => create_response(200, "OK", &json),
                Err(e) => {
                    error!("Failed to serialize posts: {}", e);
                    create_response(500, "Internal Server Error", r#"{"error":"Internal Server Error"}"#)
                }
            }
        }
        Err(e) => {
            error!("Error fetching posts: {}", e);
            create_response(500, "Internal Server Error", r#"{"error":"Internal Server Error"}"#)
        }
    }
}

/// POST /allquery - raw read-query passthrough for trusted callers.
fn handle_all_query(body: &str, gateway: &QueryGateway) -> String {
    let req: QueryRequest = match serde_json::from_str(body) {
        Ok(req) => req,
        Err(_) => {
            return create_response(
                400,
                "Bad Request",
                r#"{"error":"Query is required in request body and must be a non-empty string"}"#,
            )
        }
    };

    match gateway.run(&req.query) {
        Ok(rows) => match serde_json::to_string(&rows) {
            Ok(json) => create_response(200, "OK", &json),
            Err(e) => {
                error!("Failed to serialize query result: {}", e);
                create_response(500, "Internal Server Error", r#"{"error":"Internal Server Error"}"#)
            }
        },
        Err(TrendError::InvalidInput(_)) => create_response(
            400,
            "Bad Request",
            r#"{"error":"Query is required in request body and must be a non-empty string"}"#,
        ),
        Err(e) => {
            error!("Error fetching queried posts: {}", e);
            create_response(500, "Internal Server Error", r#"{"error":"Internal Server Error"}"#)
        }
    }
}

fn create_response(status: u16, status_text: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        status,
        status_text,
        body.len(),
        body
    )
}
