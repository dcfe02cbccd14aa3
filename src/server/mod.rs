//! The worker's HTTP server.
//!
//! Each worker process runs one of these on a single-threaded runtime,
//! listening on the pool's shared port.
//!
//! ```bash
//! curl http://localhost:3000/          # Hello World!
//! curl http://localhost:3000/api/10    # Final count is 55 <pid>
//! ```

pub mod count;
pub mod handlers;
pub mod listener;
pub mod middleware;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware::from_fn, routing::get};
use nix::unistd::Pid;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{CoreforkError, Result};

/// State shared by the handlers of one worker.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Process id reported in `/api/{n}` responses.
    pub pid: u32,
}

impl AppState {
    pub fn new(pid: u32) -> Self {
        Self { pid }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::hello))
        .route("/api/{n}", get(handlers::final_count))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Worker entry point: bind the shared port and serve until killed.
///
/// Returns an error if the port cannot be bound; the caller exits non-zero
/// and the supervisor replaces this worker.
pub fn run_worker(worker_id: usize, primary_pid: Pid, addr: SocketAddr) -> Result<()> {
    exit_with_primary(primary_pid)?;

    let pid = std::process::id();
    info!(pid, worker_id, "Worker {} started", pid);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(serve(addr, Arc::new(AppState::new(pid))))
}

async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let std_listener = listener::bind_shared(addr)?;
    let listener = tokio::net::TcpListener::from_std(std_listener)?;

    let port = addr.port();
    info!(port, "App listening on port {}", port);

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

fn primary_is_parent(primary_pid: Pid) -> bool {
    nix::unistd::getppid() == primary_pid
}

/// Make sure this worker does not outlive the primary.
fn exit_with_primary(primary_pid: Pid) -> Result<()> {
    if !primary_is_parent(primary_pid) {
        return Err(CoreforkError::Role(format!(
            "primary {} is not this worker's parent",
            primary_pid
        )));
    }

    #[cfg(target_os = "linux")]
    {
        use nix::sys::signal::Signal;

        nix::sys::prctl::set_pdeathsig(Signal::SIGTERM).map_err(std::io::Error::from)?;
        // The primary may have died before the death signal was armed.
        if !primary_is_parent(primary_pid) {
            return Err(CoreforkError::Role(format!(
                "primary {} exited before this worker started",
                primary_pid
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    const PID: u32 = 4242;

    async fn get(uri: &str) -> (StatusCode, String) {
        let app = build_router(Arc::new(AppState::new(PID)));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_root_says_hello() {
        assert_eq!(get("/").await, (StatusCode::OK, "Hello World!".to_string()));
    }

    #[tokio::test]
    async fn test_count_to_ten() {
        assert_eq!(
            get("/api/10").await,
            (StatusCode::OK, "Final count is 55 4242".to_string())
        );
    }

    #[tokio::test]
    async fn test_count_zero() {
        assert_eq!(
            get("/api/0").await,
            (StatusCode::OK, "Final count is 0 4242".to_string())
        );
    }

    #[tokio::test]
    async fn test_non_numeric_count_sums_nothing() {
        assert_eq!(
            get("/api/banana").await,
            (StatusCode::OK, "Final count is 0 4242".to_string())
        );
    }

    #[tokio::test]
    async fn test_negative_count_sums_nothing() {
        assert_eq!(
            get("/api/-20").await,
            (StatusCode::OK, "Final count is 0 4242".to_string())
        );
    }

    #[tokio::test]
    async fn test_leading_digits_are_used() {
        assert_eq!(
            get("/api/4xyz").await,
            (StatusCode::OK, "Final count is 10 4242".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let (status, _) = get("/api").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get("/api/1/2").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_is_not_allowed() {
        let app = build_router(Arc::new(AppState::new(PID)));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_serves_on_shared_listener() {
        let std_listener = listener::bind_shared("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = std_listener.local_addr().unwrap();
        let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(Arc::new(AppState::new(PID))))
                .await
                .unwrap();
        });

        let body = tokio::task::spawn_blocking(move || {
            reqwest::blocking::get(format!("http://{}/api/3", addr))
                .unwrap()
                .text()
                .unwrap()
        })
        .await
        .unwrap();
        assert_eq!(body, "Final count is 6 4242");
    }

    #[test]
    fn test_worker_refuses_to_start_for_foreign_primary() {
        let not_my_parent = Pid::from_raw(i32::MAX);
        assert!(!primary_is_parent(not_my_parent));
        assert!(primary_is_parent(nix::unistd::getppid()));

        let addr = crate::config::worker_listen_addr();
        let err = run_worker(1, not_my_parent, addr).unwrap_err();
        assert!(matches!(err, CoreforkError::Role(_)));
    }
}
