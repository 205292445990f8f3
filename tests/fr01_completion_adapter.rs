use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mockito::{Matcher, Server};
use pdfrag::domain::{AdapterConfig, AdapterError};
use pdfrag::infra::llm::{CompletionProvider, OpenRouterAdapter, StaticCredential, complete};
use serde_json::json;

const PROMPT: &str =
    "Contexto:\nParis is the capital of France.\n\nPergunta: What is the capital of France?";

fn config(base_url: &str) -> AdapterConfig {
    AdapterConfig::builder()
        .base_url(base_url)
        .temperature(0.7)
        .max_tokens(300)
        .timeout(Duration::from_secs(5))
        .build()
        .expect("config should build")
}

fn adapter(base_url: &str) -> OpenRouterAdapter {
    OpenRouterAdapter::new(
        config(base_url),
        StaticCredential::new("test-key").expect("key should be accepted"),
    )
    .expect("adapter should build")
}

fn base_url(server: &Server) -> String {
    format!("{}/api/v1", server.url())
}

#[test]
fn complete_returns_first_choice_content_unmodified() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_header(
            "content-type",
            Matcher::Regex("application/json.*".to_string()),
        )
        .match_body(Matcher::Json(json!({
            "model": "openai/o4-mini",
            "messages": [{ "role": "user", "content": PROMPT }],
            "temperature": 0.7,
            "max_tokens": 300
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "gen-1",
                "choices": [
                    { "message": { "role": "assistant", "content": "A capital da França é **Paris**.\n" } }
                ]
            })
            .to_string(),
        )
        .expect(1)
        .create();

    let text = adapter(&base_url(&server))
        .complete(PROMPT)
        .expect("mocked completion should succeed");

    mock.assert();
    assert_eq!(text, "A capital da França é **Paris**.\n");
}

#[test]
fn complete_fails_with_configuration_error_before_any_request_when_key_is_missing() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", Matcher::Any)
        .with_status(200)
        .with_body(r#"{"choices":[]}"#)
        .expect(0)
        .create();

    let adapter = OpenRouterAdapter::new(config(&base_url(&server)), StaticCredential::missing())
        .expect("adapter should build without a key");
    let error = adapter
        .complete(PROMPT)
        .expect_err("missing key should fail");

    mock.assert();
    assert!(matches!(error, AdapterError::Configuration { .. }));
}

#[test]
fn free_complete_fails_fast_without_key() {
    let mut server = Server::new();
    let mock = server.mock("POST", Matcher::Any).expect(0).create();

    let error = complete(PROMPT, &config(&base_url(&server)), &StaticCredential::missing())
        .expect_err("missing key should fail");

    mock.assert();
    assert!(matches!(error, AdapterError::Configuration { .. }));
}

#[test]
fn complete_maps_unauthorized_to_provider_error_without_retry() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"message":"No auth credentials found","code":401}}"#)
        .expect(1)
        .create();

    let error = adapter(&base_url(&server))
        .complete(PROMPT)
        .expect_err("401 should fail");

    mock.assert();
    assert_eq!(
        error,
        AdapterError::provider(401, "No auth credentials found")
    );
}

#[test]
fn complete_maps_server_error_to_provider_error_without_retry() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(500)
        .with_body("internal error")
        .expect(1)
        .create();

    let error = adapter(&base_url(&server))
        .complete(PROMPT)
        .expect_err("500 should fail");

    mock.assert();
    assert!(matches!(
        error,
        AdapterError::Provider { status: 500, ref message } if message == "internal error"
    ));
    assert!(error.is_retryable());
}

#[test]
fn complete_returns_empty_string_when_provider_sends_no_choices() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"gen-2","choices":[]}"#)
        .expect(1)
        .create();

    let text = free_complete(&server).expect("empty choices is a success");

    mock.assert();
    assert_eq!(text, "");
}

fn free_complete(server: &Server) -> Result<String, AdapterError> {
    complete(
        PROMPT,
        &config(&base_url(server)),
        &StaticCredential::new("test-key").expect("key should be accepted"),
    )
}

#[test]
fn complete_maps_connection_refused_to_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("ephemeral port should bind");
    let address = listener.local_addr().expect("listener should have an address");
    drop(listener);

    let error = adapter(&format!("http://{address}/api/v1"))
        .complete(PROMPT)
        .expect_err("closed port should fail");

    assert!(matches!(error, AdapterError::Transport { .. }));
    assert!(error.is_retryable());
}

#[test]
fn complete_sends_attribution_headers_and_system_instruction_when_configured() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .match_header("http-referer", "https://example.com")
        .match_header("x-title", "Chat-RAG")
        .match_body(Matcher::PartialJson(json!({
            "messages": [
                { "role": "system", "content": "Você é um assistente especialista em analisar documentos em PDF." },
                { "role": "user", "content": PROMPT }
            ]
        })))
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"Paris"}}]}"#)
        .expect(1)
        .create();

    let config = config(&base_url(&server))
        .to_builder()
        .referer("https://example.com")
        .title("Chat-RAG")
        .system_instruction("Você é um assistente especialista em analisar documentos em PDF.")
        .build()
        .expect("config should build");
    let adapter = OpenRouterAdapter::new(
        config,
        StaticCredential::new("test-key").expect("key should be accepted"),
    )
    .expect("adapter should build");

    let text = adapter.complete(PROMPT).expect("completion should succeed");

    mock.assert();
    assert_eq!(text, "Paris");
}

#[test]
fn complete_omits_attribution_headers_when_not_configured() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .match_header("http-referer", Matcher::Missing)
        .match_header("x-title", Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"Paris"}}]}"#)
        .expect(1)
        .create();

    let text = adapter(&base_url(&server))
        .complete(PROMPT)
        .expect("completion should succeed");

    mock.assert();
    assert_eq!(text, "Paris");
}

#[test]
fn complete_reports_undecodable_success_body() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .expect(1)
        .create();

    let error = adapter(&base_url(&server))
        .complete(PROMPT)
        .expect_err("HTML body should fail");

    mock.assert();
    assert!(matches!(error, AdapterError::InvalidResponse { .. }));
}

/// Reads one HTTP request (headers plus `Content-Length` body) so replies are not reset.
fn read_request(stream: &mut TcpStream) {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout should apply");
    let mut received = Vec::new();
    let mut buffer = [0_u8; 4096];
    loop {
        let read = match stream.read(&mut buffer) {
            Ok(0) | Err(_) => return,
            Ok(read) => read,
        };
        received.extend_from_slice(&buffer[..read]);
        let Some(header_end) = received.windows(4).position(|window| window == b"\r\n\r\n")
        else {
            continue;
        };
        let headers = String::from_utf8_lossy(&received[..header_end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if received.len() >= header_end + 4 + content_length {
            return;
        }
    }
}

/// Serves exactly one connection with `handle` on an ephemeral port.
fn serve_once<F>(handle: F) -> (SocketAddr, JoinHandle<()>)
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("ephemeral port should bind");
    let address = listener.local_addr().expect("listener should have an address");
    let server = thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            handle(stream);
        }
    });
    (address, server)
}

fn wait_for_client_close(mut stream: TcpStream) {
    let mut sink = Vec::new();
    let _ = stream.read_to_end(&mut sink);
}

#[test]
fn complete_keeps_provider_status_when_error_body_is_truncated() {
    let (address, server) = serve_once(|mut stream| {
        read_request(&mut stream);
        let _ = stream.write_all(
            b"HTTP/1.1 500 Internal Server Error\r\nContent-Type: text/plain\r\nContent-Length: 100\r\n\r\nupstream",
        );
        let _ = stream.flush();
        let _ = stream.shutdown(Shutdown::Write);
        wait_for_client_close(stream);
    });

    let error = adapter(&format!("http://{address}/api/v1"))
        .complete(PROMPT)
        .expect_err("500 should fail");
    server.join().expect("server thread should finish");

    assert!(
        matches!(error, AdapterError::Provider { status: 500, .. }),
        "unexpected error: {error:?}"
    );
}

#[test]
fn complete_maps_unresponsive_server_to_timed_out_transport_error() {
    let (address, server) = serve_once(|mut stream| {
        read_request(&mut stream);
        wait_for_client_close(stream);
    });

    let config = config(&format!("http://{address}/api/v1"))
        .to_builder()
        .timeout(Duration::from_secs(1))
        .build()
        .expect("config should build");
    let adapter = OpenRouterAdapter::new(
        config,
        StaticCredential::new("test-key").expect("key should be accepted"),
    )
    .expect("adapter should build");

    let error = adapter.complete(PROMPT).expect_err("hung server should time out");
    drop(adapter);
    server.join().expect("server thread should finish");

    assert!(
        matches!(
            error,
            AdapterError::Transport { ref message } if message.starts_with("request timed out")
        ),
        "unexpected error: {error:?}"
    );
}

#[test]
fn complete_makes_a_single_attempt_when_connection_drops() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("ephemeral port should bind");
    let address = listener.local_addr().expect("listener should have an address");
    listener
        .set_nonblocking(true)
        .expect("listener should become non-blocking");
    let accepted = Arc::new(AtomicUsize::new(0));
    let stop = Arc::new(AtomicBool::new(false));
    let server = {
        let accepted = Arc::clone(&accepted);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        accepted.fetch_add(1, Ordering::SeqCst);
                        drop(stream);
                    }
                    Err(_) => thread::sleep(Duration::from_millis(5)),
                }
            }
        })
    };

    let error = adapter(&format!("http://{address}/api/v1"))
        .complete(PROMPT)
        .expect_err("dropped connection should fail");
    // Leave time for a retry to show up before counting.
    thread::sleep(Duration::from_millis(200));
    stop.store(true, Ordering::SeqCst);
    server.join().expect("server thread should finish");

    assert!(matches!(error, AdapterError::Transport { .. }), "unexpected error: {error:?}");
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}
