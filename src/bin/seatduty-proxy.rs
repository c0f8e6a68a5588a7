use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use env_logger::Builder;
use log::{LevelFilter, info};
use seatduty_api::proxy::{
    DEFAULT_ASSIGNMENTS_UPSTREAM, DEFAULT_GAMES_UPSTREAM, DEFAULT_USERS_UPSTREAM, ProxyClient,
    ProxyReply, ProxyRoute,
};
use std::io::Write;
use std::sync::Arc;
use std::env;
use tokio::net::TcpListener;

struct ProxyState {
    client: ProxyClient,
    games: ProxyRoute,
    assignments: ProxyRoute,
    users: ProxyRoute,
}

impl ProxyState {
    fn from_env() -> Self {
        Self {
            client: ProxyClient::new(),
            games: ProxyRoute::games(env_or("SEATDUTY_GAMES_UPSTREAM", DEFAULT_GAMES_UPSTREAM)),
            assignments: ProxyRoute::assignments(env_or(
                "SEATDUTY_ASSIGNMENTS_UPSTREAM",
                DEFAULT_ASSIGNMENTS_UPSTREAM,
            )),
            users: ProxyRoute::users(env_or("SEATDUTY_USERS_UPSTREAM", DEFAULT_USERS_UPSTREAM)),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    init_logger();

    let addr = env_or("SEATDUTY_PROXY_BIND", "0.0.0.0:3000");
    let state = Arc::new(ProxyState::from_env());
    for route in [&state.games, &state.assignments, &state.users] {
        info!("route {} -> {}", route.name, route.upstream);
    }

    let app = Router::new()
        .route("/api/assignments", get(games))
        .route("/api/assignments-list", get(assignments))
        .route("/api/users", get(users))
        .with_state(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("seatduty proxy listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn games(State(state): State<Arc<ProxyState>>) -> Response {
    respond(state.client.forward(&state.games).await)
}

async fn assignments(State(state): State<Arc<ProxyState>>) -> Response {
    respond(state.client.forward(&state.assignments).await)
}

async fn users(State(state): State<Arc<ProxyState>>) -> Response {
    respond(state.client.forward(&state.users).await)
}

fn respond(reply: ProxyReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(reply.body)).into_response();
    if let Some(cache_control) = reply.cache_control {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));
    }
    response
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn init_logger() {
    let mut builder = Builder::new();
    builder.format(|formatter, record| {
        writeln!(
            formatter,
            "{} [{}] ({}): {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S %z"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Ok(var) = env::var("SEATDUTY_LOG") {
        builder.parse_filters(&var);
    } else {
        builder.filter(None, LevelFilter::Info);
    }

    builder.init();
}

fn handle_cli_args() -> bool {
    let mut args = env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("seatduty-proxy {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "seatduty-proxy - JSON proxy in front of the SeatDuty backend

Usage:
  seatduty-proxy
  seatduty-proxy --help
  seatduty-proxy --version

Routes:
  GET /api/assignments        games with assigned users
  GET /api/assignments-list   assignment rows
  GET /api/users              user rows

Environment:
  SEATDUTY_PROXY_BIND            Listen address (default 0.0.0.0:3000)
  SEATDUTY_GAMES_UPSTREAM        Games webhook (default http://backend:5000/webhook)
  SEATDUTY_ASSIGNMENTS_UPSTREAM  Assignments API (default http://localhost:5000/assignments)
  SEATDUTY_USERS_UPSTREAM        Users API (default http://backend:5000/users)
  SEATDUTY_LOG                   Log filter, env_logger syntax (default info)"
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_reply_carries_cache_header() {
        let response = respond(ProxyReply {
            status: 200,
            body: json!([]),
            cache_control: Some("public, max-age=60"),
        });
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=60"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn failure_reply_is_a_500_without_cache_header() {
        let response = respond(ProxyReply {
            status: 500,
            body: json!({ "error": "Failed to fetch users" }),
            cache_control: None,
        });
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }
}
