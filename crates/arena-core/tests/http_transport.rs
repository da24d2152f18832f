//! `HttpTransport` against a minimal agent served from a local socket.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use arena_core::fakes::StepRuleset;
use arena_core::{
    AgentTransport, Direction, GameConfig, GameLoop, HttpTransport, Outcome,
    StateProjector, TransportError,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const PING: &str = r##"{"apiversion":"1","author":"tester","color":"#ff0000","head":"beluga","tail":"curled","version":"0.9"}"##;

/// How the local agent answers `/move`.
#[derive(Clone, Copy)]
enum Behaviour {
    Move(&'static str),
    Status(u16),
    Slow(Duration),
}

/// Request lines (`METHOD /path`) seen by the agent.
type Seen = Arc<Mutex<Vec<String>>>;

async fn spawn_agent(behaviour: Behaviour) -> (String, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::default();

    let log = Arc::clone(&seen);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(serve(stream, behaviour, Arc::clone(&log)));
        }
    });

    (format!("http://{addr}"), seen)
}

async fn serve(mut stream: TcpStream, behaviour: Behaviour, seen: Seen) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let request_line = head.lines().next().unwrap_or_default().to_string();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();
    seen.lock().unwrap().push(format!("{method} {path}"));

    let (status, body) = match (method.as_str(), path.as_str()) {
        ("GET", "/") => (200, PING.to_string()),
        ("POST", "/move") => match behaviour {
            Behaviour::Move(direction) => (
                200,
                format!(r#"{{"move":"{direction}","shout":"hello from the socket"}}"#),
            ),
            Behaviour::Status(code) => (code, "{}".to_string()),
            Behaviour::Slow(delay) => {
                tokio::time::sleep(delay).await;
                (200, r#"{"move":"left"}"#.to_string())
            }
        },
        ("POST", "/start") | ("POST", "/end") => (200, "{}".to_string()),
        _ => (404, "{}".to_string()),
    };

    let response = format!(
        "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn transport(timeout_ms: u64) -> HttpTransport {
    HttpTransport::new(Duration::from_millis(timeout_ms)).unwrap()
}

async fn projection_for(url: &str) -> arena_core::Projection {
    // One-agent game initialised only to obtain a well-formed payload.
    let config = GameConfig::new(11, 11).with_agent("probe", url).with_seed(1);
    let mut game = GameLoop::new(
        config,
        Arc::new(transport(500)),
        Arc::new(StepRuleset::factory),
    );
    game.initialize().await.unwrap();
    let agents = game.agents().unwrap();
    let id = agents.ids()[0].clone();
    StateProjector::new(game.game_id().unwrap(), 500)
        .project(0, game.board().unwrap(), agents, &id)
        .unwrap()
}

#[tokio::test]
async fn test_probe_reads_capabilities() {
    let (url, seen) = spawn_agent(Behaviour::Move("up")).await;
    let ping = transport(500).probe(&url.parse().unwrap()).await.unwrap();

    assert_eq!(ping.apiversion, "1");
    assert_eq!(ping.author, "tester");
    assert_eq!(ping.head, "beluga");
    assert_eq!(seen.lock().unwrap().as_slice(), ["GET /"]);
}

#[tokio::test]
async fn test_move_reply_is_decoded() {
    let (url, seen) = spawn_agent(Behaviour::Move("left")).await;
    let payload = projection_for(&url).await;

    let response = transport(500)
        .request_move(&url.parse().unwrap(), &payload)
        .await
        .unwrap();

    assert_eq!(response.direction, Direction::Left);
    assert_eq!(response.shout, "hello from the socket");
    assert!(seen.lock().unwrap().contains(&"POST /move".to_string()));
}

#[tokio::test]
async fn test_unknown_move_is_rejected() {
    let (url, _) = spawn_agent(Behaviour::Move("sideways")).await;
    let payload = projection_for(&url).await;

    let err = transport(500)
        .request_move(&url.parse().unwrap(), &payload)
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::UnknownMove { .. }));
}

#[tokio::test]
async fn test_error_status_is_a_failure() {
    let (url, _) = spawn_agent(Behaviour::Status(500)).await;
    let payload = projection_for(&url).await;

    let err = transport(500)
        .request_move(&url.parse().unwrap(), &payload)
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 500, .. }));
}

#[tokio::test]
async fn test_slow_agent_times_out() {
    let (url, _) = spawn_agent(Behaviour::Slow(Duration::from_millis(600))).await;
    let payload = projection_for(&url).await;

    let err = transport(100)
        .request_move(&url.parse().unwrap(), &payload)
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Request { ref reason, .. } if reason == "timed out"));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_request_error() {
    let err = transport(200)
        .probe(&"http://127.0.0.1:1".parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Request { .. }));
}

#[tokio::test]
async fn test_full_game_over_http() {
    let (alive_url, seen) = spawn_agent(Behaviour::Move("down")).await;
    let config = GameConfig::new(11, 11)
        .with_agent("socket", &alive_url)
        .with_agent("ghost", "http://127.0.0.1:1")
        .with_seed(21);

    let result = GameLoop::new(
        config,
        Arc::new(transport(500)),
        Arc::new(StepRuleset::factory),
    )
    .run()
    .await
    .unwrap();

    // "down" leaves the board from row 1 on turn 2; the ghost keeps going up.
    assert_eq!(result.turn, 2);
    assert_eq!(
        result.outcome,
        Outcome::Winner {
            agent_id: result.board.snakes[1].id.clone(),
            name: "ghost".to_string(),
        }
    );

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.first().map(String::as_str), Some("GET /"));
    assert_eq!(seen.iter().filter(|r| *r == "POST /start").count(), 1);
    assert_eq!(seen.iter().filter(|r| *r == "POST /move").count(), 2);
    assert!(!seen.contains(&"POST /end".to_string()));
}
