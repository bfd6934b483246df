//! HTTP server for `oasbundle serve`: bundles the document once at
//! startup, then serves the merged JSON plus a tiny built-in viewer page
//! (Swagger UI or Redoc, loaded from their public CDN — this does not
//! vendor either project's assets).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::cli::Template;
use crate::config::ServerConfig;
use crate::{Error, Result};

struct AppState {
    spec_json: String,
    title: String,
    template: Template,
    base_url: String,
}

/// Bundle `file` and serve it at `config.host:config.port`.
///
/// # Errors
///
/// Returns an error if the document fails to bundle or the server cannot
/// bind to the configured address.
pub async fn run(file: PathBuf, template: Template, config: ServerConfig) -> Result<()> {
    let node = tokio::task::spawn_blocking(move || oasbundle_core::open_node(&file))
        .await
        .map_err(|e| Error::Server(format!("bundling task panicked: {e}")))??;

    let title = node
        .get_path_as_str("/info/title")
        .unwrap_or("API Documentation")
        .to_string();
    let spec_json = String::from_utf8(oasbundle_core::yaml::dump_json(&node))
        .map_err(|e| Error::Server(format!("bundled document is not valid UTF-8: {e}")))?;

    let state = Arc::new(AppState {
        spec_json,
        title,
        template,
        base_url: config.base_url.clone(),
    });

    let app = Router::new()
        .route("/openapi.json", get(spec_handler))
        .route("/", get(viewer_handler))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::new(
        config
            .host
            .parse()
            .map_err(|e| Error::Server(format!("invalid host {}: {e}", config.host)))?,
        config.port,
    );
    let listener = TcpListener::bind(addr).await?;

    info!(host = %config.host, port = %config.port, "Serving bundled OpenAPI document");
    info!("  GET http://{}:{}/           (viewer)", config.host, config.port);
    info!("  GET http://{}:{}/openapi.json", config.host, config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Server(e.to_string()))?;

    Ok(())
}

async fn spec_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], state.spec_json.clone())
}

async fn viewer_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let spec_url = format!("{}openapi.json", ensure_trailing_slash(&state.base_url));
    let html = match state.template {
        Template::SwaggerUi => swagger_ui_html(&state.title, &spec_url),
        Template::Redoc => redoc_html(&state.title, &spec_url),
    };
    Html(html)
}

fn ensure_trailing_slash(base_url: &str) -> String {
    if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    }
}

fn swagger_ui_html(title: &str, spec_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>{title}</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({{ url: "{spec_url}", dom_id: "#swagger-ui" }});
  </script>
</body>
</html>
"#
    )
}

fn redoc_html(title: &str, spec_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>{title}</title>
</head>
<body>
  <redoc spec-url="{spec_url}"></redoc>
  <script src="https://cdn.redoc.ly/redoc/latest/bundles/redoc.standalone.js"></script>
</body>
</html>
"#
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_a_trailing_slash() {
        assert_eq!(ensure_trailing_slash("/docs"), "/docs/");
        assert_eq!(ensure_trailing_slash("/docs/"), "/docs/");
        assert_eq!(ensure_trailing_slash("/"), "/");
    }

    #[test]
    fn swagger_ui_page_embeds_title_and_spec_url() {
        let html = swagger_ui_html("demo", "/openapi.json");
        assert!(html.contains("<title>demo</title>"));
        assert!(html.contains(r#"url: "/openapi.json""#));
    }

    #[test]
    fn redoc_page_embeds_title_and_spec_url() {
        let html = redoc_html("demo", "/openapi.json");
        assert!(html.contains("<title>demo</title>"));
        assert!(html.contains(r#"spec-url="/openapi.json""#));
    }
}
