use std::{path::Path, sync::Arc, time::Duration};

use crate::{
    element::escape,
    error::DashErrors,
    view::{Page, ViewActions},
};
use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use hyper::server::conn::http1;
use hyper_util::{
    rt::{TokioIo, TokioTimer},
    service::TowerToHyperService,
};
use log::{debug, error, info};
use tokio::net::{TcpListener, UnixListener, UnixStream};
use tokio_stream::{wrappers::UnixListenerStream, StreamExt};
use url::Url;

const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(30);

const STYLE: &str = "body{font-family:sans-serif;margin:20px;}\
.table{border-collapse:collapse;margin-bottom:10px;min-width:50%;}\
.table td,.table th{text-align:left;padding:6px 10px;border-bottom:1px solid #ddd;}\
.cbi-map-descr{margin-bottom:16px;color:#555;}";

// DashboardServer is the host side of the view: it serves the assembled page
// over HTTP. The page is read-only, so only GET and HEAD are answered.
// It doubles as the router state, every field is cheap to clone.
#[derive(Clone)]
pub struct DashboardServer {
    page: Arc<Page>,
    title: String,
    refresh: Duration,
    actions: ViewActions,
    pub listen_addr: String,
}

enum Listener {
    Tcp(TcpListener),
    Unix(UnixListener),
}

impl DashboardServer {
    pub fn new(
        page: Page,
        title: String,
        refresh: Duration,
        actions: ViewActions,
        listen_addr: String,
    ) -> Self {
        Self {
            page: Arc::new(page),
            title,
            refresh,
            actions,
            listen_addr,
        }
    }

    pub async fn listen(self) -> Result<(), DashErrors> {
        let url = Url::parse(&self.listen_addr).map_err(|e| DashErrors::Listen(e.to_string()))?;
        let listener = match url.scheme() {
            "unix" => {
                let path = Path::new(url.path());
                if path.exists() {
                    debug!(
                        "Dashboard socket {} already exists, trying to clean up",
                        path.display()
                    );
                    if UnixStream::connect(path).await.is_ok() {
                        return Err(DashErrors::Listen(format!(
                            "{} already exists and is in use by another process",
                            path.display()
                        )));
                    }
                    std::fs::remove_file(path).map_err(|e| {
                        DashErrors::Listen(format!(
                            "{} already exists and was not cleaned up: {}",
                            path.display(),
                            e
                        ))
                    })?;
                    debug!("Dashboard socket {} was cleaned up", path.display());
                }
                let listener = UnixListener::bind(path).map_err(|e| {
                    error!("Dashboard socket failed to listen: {}", e);
                    DashErrors::Listen(e.to_string())
                })?;
                Listener::Unix(listener)
            }
            "tcp" => {
                let addrs = url
                    .socket_addrs(|| None)
                    .map_err(|e| DashErrors::Listen(e.to_string()))?;
                let listener = TcpListener::bind(&*addrs).await.map_err(|e| {
                    error!("Dashboard socket failed to listen: {}", e);
                    DashErrors::Listen(e.to_string())
                })?;
                Listener::Tcp(listener)
            }
            scheme => {
                return Err(DashErrors::Listen(format!("Unsupported scheme {scheme}")));
            }
        };
        info!("Dashboard listening on {}", self.listen_addr);

        let app = self.router();
        tokio::spawn(async move {
            match listener {
                Listener::Tcp(listener) => {
                    if let Err(err) = axum::serve(listener, app).await {
                        error!("Dashboard server error: {}", err);
                    }
                }
                Listener::Unix(listener) => serve_unix(listener, app).await,
            }
        });
        Ok(())
    }

    /// Routes for the page. Anything other than GET or HEAD is turned away
    /// before routing, so unknown paths still answer 405 to writes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(document))
            .route("/index.html", get(document))
            .route("/content", get(content))
            .fallback(not_found)
            .layer(middleware::from_fn_with_state(self.clone(), reject_writes))
            .with_state(self.clone())
    }
}

async fn serve_unix(listener: UnixListener, app: Router) {
    let mut listener = UnixListenerStream::new(listener);
    while let Some(conn) = listener.next().await {
        let stream = match conn {
            Ok(stream) => stream,
            Err(err) => {
                error!("Error accepting connection: {}", err);
                continue;
            }
        };
        let service = TowerToHyperService::new(app.clone());
        tokio::spawn(async move {
            let mut builder = http1::Builder::new();
            builder
                .timer(TokioTimer::new())
                .header_read_timeout(HEADER_READ_TIMEOUT);
            if let Err(err) = builder
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!("Dashboard connection ended: {}", err);
            }
        });
    }
}

async fn reject_writes(
    State(server): State<DashboardServer>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    if method == Method::GET || method == Method::HEAD {
        return next.run(request).await;
    }
    debug!("Rejected {} {}", method, request.uri());
    let body = if server.actions.is_read_only() {
        "This page is read-only.\n"
    } else {
        "Method not allowed.\n"
    };
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, HEAD")],
        body,
    )
        .into_response()
}

async fn document(State(server): State<DashboardServer>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-store")],
        Html(render_document(&server.page, &server.title, server.refresh)),
    )
}

async fn content(State(server): State<DashboardServer>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-store")],
        Html(server.page.content.to_html()),
    )
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found.\n")
}

/// Wraps a page in a standalone HTML document that reloads itself at the
/// poll interval.
pub fn render_document(page: &Page, title: &str, refresh: Duration) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
         <meta http-equiv=\"refresh\" content=\"{}\">\
         <title>{}</title><style>{}</style></head><body>{}</body></html>\n",
        refresh.as_secs().max(1),
        escape(title),
        STYLE,
        page.to_html()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ContentRegion, Element};
    use axum::body::{to_bytes, Body};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tower::ServiceExt;

    fn server() -> DashboardServer {
        let content = ContentRegion::new(Element::new("div"));
        content.set_content(Element::new("div").text("No interface online."));
        let root = Element::new("div")
            .child(Element::new("h2").text("Tailscale"))
            .child(content.clone());
        DashboardServer::new(
            Page { root, content },
            "Tailscale".into(),
            Duration::from_secs(5),
            ViewActions::default(),
            "tcp://127.0.0.1:0".into(),
        )
    }

    async fn request(server: &DashboardServer, method: Method, uri: &str) -> (StatusCode, String) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = server.router().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn serves_full_document() {
        let s = server();
        let (status, body) = request(&s, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<meta http-equiv=\"refresh\" content=\"5\">"));
        assert!(body.contains("<title>Tailscale</title>"));
        assert!(body.contains("<h2>Tailscale</h2><div><div>No interface online.</div></div>"));
    }

    #[tokio::test]
    async fn serves_live_content_fragment() {
        let s = server();
        s.page.content.set_content(Element::new("p").text("refreshed"));
        let (status, body) = request(&s, Method::GET, "/content?t=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<div><p>refreshed</p></div>");
    }

    #[tokio::test]
    async fn rejects_writes_and_unknown_paths() {
        let s = server();
        let (status, body) = request(&s, Method::POST, "/").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, "This page is read-only.\n");

        let (status, _) = request(&s, Method::DELETE, "/cgi-bin/luci").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = request(&s, Method::GET, "/cgi-bin/luci").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn head_has_no_body() {
        let s = server();
        let (status, body) = request(&s, Method::HEAD, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn serves_over_unix_socket() {
        let path = std::env::temp_dir()
            .join(format!("tailscale-status-{}.sock", std::process::id()));
        let mut s = server();
        s.listen_addr = format!("unix://{}", path.display());
        s.clone().listen().await.unwrap();

        let mut conn = UnixStream::connect(&path).await.unwrap();
        conn.write_all(b"GET /content HTTP/1.1\r\nHost: router\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut out = String::new();
        tokio::time::timeout(Duration::from_secs(5), conn.read_to_string(&mut out))
            .await
            .unwrap()
            .unwrap();
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.ends_with("<div><div>No interface online.</div></div>"));

        // A live socket is never taken over.
        assert!(matches!(s.listen().await, Err(DashErrors::Listen(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn unsupported_scheme() {
        let mut s = server();
        s.listen_addr = "udp://127.0.0.1:0".into();
        assert!(matches!(s.listen().await, Err(DashErrors::Listen(_))));
    }
}
