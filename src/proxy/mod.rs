//! Local storefront proxy.
//!
//! Page requests are fetched from the storefront, stored under
//! `.themesync/pages/`, and served with the live reload script injected.
//! Everything else (assets, cart endpoints, ...) is redirected to the
//! storefront itself.
//!
//! ```text
//! GET /products/hat ──► fetch_remote_page_html ──► inject <script> ──► 200
//! GET /cdn/x.js     ──► 302 Location: https://<storefront>/cdn/x.js
//! ```

mod inject;

#[cfg(test)]
mod tests;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tokio::runtime::Handle;

use crate::remote::RemoteClient;
use crate::utils::path::route::{is_page_path, split_path_query, url_to_safe_filename};
use crate::{debug, log};

pub use inject::inject_before_body_end;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// What the request handlers share.
pub struct ProxyContext {
    pub client: RemoteClient,
    /// Where fetched pages are written.
    pub pages_dir: PathBuf,
    /// Injected before `</body>`; `None` serves pages untouched.
    pub script_tag: Option<String>,
    /// Runtime the page fetches run on.
    pub runtime: Handle,
}

/// Bound proxy, not yet serving.
pub struct ProxyServer {
    server: Arc<Server>,
    addr: SocketAddr,
}

impl ProxyServer {
    /// Bind to `interface:port`, trying the following ports when busy.
    pub fn bind(interface: IpAddr, base_port: u16) -> Result<Self> {
        let (server, addr) = bind_with_retry(interface, base_port)?;
        Ok(Self {
            server: Arc::new(server),
            addr,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Handle used to stop the request loop.
    pub fn handle(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }

    /// Serve on a background thread until [`Server::unblock`] is called.
    pub fn spawn(self, ctx: ProxyContext) -> JoinHandle<()> {
        let ctx = Arc::new(ctx);
        std::thread::spawn(move || {
            for request in self.server.incoming_requests() {
                let ctx = Arc::clone(&ctx);
                std::thread::spawn(move || {
                    let url = request.url().to_string();
                    if let Err(e) = handle_request(request, &ctx) {
                        log!("proxy"; "{}: {:#}", url, e);
                    }
                });
            }
            debug!("proxy"; "request loop stopped");
        })
    }
}

fn handle_request(request: Request, ctx: &ProxyContext) -> Result<()> {
    let url = request.url().to_string();
    let (path, _) = split_path_query(&url);
    let is_read = matches!(request.method(), Method::Get | Method::Head);

    if !is_read || !is_page_path(path) {
        let target = storefront_url(ctx.client.storefront(), &url);
        debug!("proxy"; "{} → {}", url, target);
        let response = Response::empty(StatusCode(302)).with_header(header("Location", &target)?);
        return respond(request, response);
    }

    let output = ctx
        .pages_dir
        .join(format!("{}.html", url_to_safe_filename(&url)));
    let fetched = ctx
        .runtime
        .block_on(ctx.client.fetch_remote_page_html(&url, &output));

    let page = match fetched {
        Ok(page) => page,
        Err(e) => {
            match e.status() {
                Some(status) => log!("proxy"; "storefront answered {} for {}", status, url),
                None => log!("proxy"; "failed to fetch {}: {}", url, e),
            }
            let body = format!("failed to fetch {url}: {e}");
            let response = Response::from_string(body)
                .with_status_code(StatusCode(502))
                .with_header(header("Content-Type", "text/plain; charset=utf-8")?);
            return respond(request, response);
        }
    };

    let html = std::fs::read_to_string(&page)
        .with_context(|| format!("failed to read {}", page.display()))?;
    let html = match &ctx.script_tag {
        Some(tag) => inject_before_body_end(&html, tag),
        None => html,
    };
    debug!("proxy"; "served {}", url);
    let response =
        Response::from_string(html).with_header(header("Content-Type", "text/html; charset=utf-8")?);
    respond(request, response)
}

/// Absolute storefront URL for a request path.
pub fn storefront_url(storefront: &str, url: &str) -> String {
    format!("{}{}", storefront.trim_end_matches('/'), url)
}

fn respond<R: std::io::Read>(request: Request, response: Response<R>) -> Result<()> {
    request.respond(response)?;
    Ok(())
}

fn header(name: &'static str, value: &str) -> Result<Header> {
    Header::from_bytes(name, value).map_err(|()| anyhow::anyhow!("invalid {name} header: {value}"))
}

/// Bind to the specified interface and port, with automatic port retry.
fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match Server::http(SocketAddr::new(interface, port)) {
            Ok(server) => {
                let addr = server
                    .server_addr()
                    .to_ip()
                    .unwrap_or_else(|| SocketAddr::new(interface, port));
                if offset > 0 {
                    log!("proxy"; "port {} in use, using {} instead", base_port, addr.port());
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
