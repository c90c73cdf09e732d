//! Development server with live reload
//!
//! Pages are rendered on request from the published collection, so a
//! rebuild is visible as soon as it is swapped in. Everything else (feed,
//! search index, assets) is served from the public directory.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

use crate::content::{handle, CollectionHandle, ContentError};
use crate::generator::Generator;
use crate::templates::SitePages;
use crate::watch::Rebuilder;
use crate::Blog;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Server state
struct ServerState {
    collection: &'static CollectionHandle,
    pages: SitePages,
    public_dir: PathBuf,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

impl ServerState {
    /// Turn a page render into a response; a missing article is a 404 page
    fn respond(&self, path: &str, rendered: Result<String>) -> Response {
        match rendered {
            Ok(html) => self.html(StatusCode::OK, html),
            Err(e) => match e.downcast_ref::<ContentError>() {
                Some(ContentError::NotFound(_)) => self.not_found(path),
                _ => {
                    tracing::error!("Failed to render {}: {:#}", path, e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Render error").into_response()
                }
            },
        }
    }

    fn not_found(&self, path: &str) -> Response {
        match self.pages.not_found(path) {
            Ok(html) => self.html(StatusCode::NOT_FOUND, html),
            Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    }

    fn html(&self, status: StatusCode, html: String) -> Response {
        let html = if self.live_reload {
            inject_live_reload(&html)
        } else {
            html
        };
        (status, Html(html)).into_response()
    }
}

/// Build the application router
fn router(
    blog: &Blog,
    collection: &'static CollectionHandle,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
) -> Result<Router> {
    let state = Arc::new(ServerState {
        collection,
        pages: SitePages::new(&blog.config)?,
        public_dir: blog.public_dir.clone(),
        reload_tx,
        live_reload,
    });

    let tag_dir = blog.config.tag_dir.trim_matches('/');
    let site = Router::new()
        .route("/", get(index_handler))
        .route(&format!("/{}/", tag_dir), get(tags_handler))
        .route(&format!("/{}/:tag/", tag_dir), get(tag_handler))
        .route("/:slug/", get(article_handler))
        .fallback(fallback_handler);

    let root = blog.config.root.trim_matches('/');
    let app = if root.is_empty() {
        site
    } else {
        Router::new().nest(&format!("/{}", root), site)
    };

    Ok(app
        .route("/__livereload", get(livereload_handler))
        .with_state(state))
}

/// Start the development server
pub async fn start(blog: &Blog, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    // The first build must succeed; later failures keep the last good one
    let collection = blog.load_collection()?;
    Generator::new(blog)?.generate(&collection)?;
    let collection = handle::init(collection)?;

    // Create broadcast channel for live reload notifications
    let (reload_tx, _) = broadcast::channel::<()>(16);
    let app = router(blog, collection, reload_tx.clone(), watch)?;

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}{}", ip, port, blog.config.root);
    println!("Server running at {}", url);
    if watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let rebuilder = Arc::new(Rebuilder::new(blog, collection, true).with_reload(reload_tx));
        tokio::task::spawn_blocking(move || {
            if let Err(e) = rebuilder.watch() {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    let collection = state.collection.load();
    state.respond("/", state.pages.index(&collection))
}

async fn article_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    let collection = state.collection.load();
    state.respond(&slug, state.pages.article(&collection, &slug))
}

async fn tags_handler(State(state): State<Arc<ServerState>>) -> Response {
    let collection = state.collection.load();
    state.respond("tags", state.pages.tags(&collection))
}

async fn tag_handler(
    State(state): State<Arc<ServerState>>,
    Path(tag_slug): Path<String>,
) -> Response {
    let collection = state.collection.load();
    // URLs carry the slugified tag; map it back to the tag as written
    match collection.tag_for_slug(&tag_slug) {
        Some(tag) => state.respond(&tag_slug, state.pages.tag(&collection, tag)),
        None => state.not_found(&tag_slug),
    }
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Static files from the public directory, or the 404 page
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let path = request.uri().path().to_string();

    let mut service = ServeDir::new(&state.public_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => state.not_found(&path),
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replace("</body>", LIVE_RELOAD_SCRIPT)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
