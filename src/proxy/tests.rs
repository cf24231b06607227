use std::net::IpAddr;
use std::sync::Arc;

use tempfile::TempDir;
use tiny_http::{Header, Response, Server, StatusCode};

use super::*;
use crate::config::ThrottleConfig;
use crate::remote::StoreEndpoint;

const HAT_PAGE: &str = "<html><body>hat</body></html>";

/// Minimal storefront: one page, one redirect, 404 otherwise.
fn spawn_storefront() -> (String, Arc<Server>) {
    let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
    let port = server.server_addr().to_ip().unwrap().port();
    let worker = Arc::clone(&server);
    std::thread::spawn(move || {
        for request in worker.incoming_requests() {
            let result = match request.url() {
                "/products/hat" => request.respond(Response::from_string(HAT_PAGE)),
                "/old-hat" => request.respond(
                    Response::empty(StatusCode(301))
                        .with_header(Header::from_bytes("Location", "/products/hat").unwrap()),
                ),
                _ => request.respond(
                    Response::from_string("missing").with_status_code(StatusCode(404)),
                ),
            };
            result.unwrap();
        }
    });
    (format!("http://127.0.0.1:{port}"), server)
}

struct Running {
    _dir: TempDir,
    pages: PathBuf,
    base: String,
    storefront: String,
    proxy: Arc<Server>,
    shop: Arc<Server>,
}

impl Drop for Running {
    fn drop(&mut self) {
        self.proxy.unblock();
        self.shop.unblock();
    }
}

fn start(script_tag: Option<&str>) -> Running {
    let (storefront, shop) = spawn_storefront();
    let endpoint = StoreEndpoint {
        api_base: format!("{storefront}/admin"),
        theme_id: 1,
        api_key: "key".into(),
        password: "secret".into(),
        storefront: storefront.clone(),
    };
    let client = RemoteClient::new(endpoint, ThrottleConfig::default()).unwrap();

    let dir = TempDir::new().unwrap();
    let pages = dir.path().join("pages");
    let interface: IpAddr = "127.0.0.1".parse().unwrap();
    let proxy = ProxyServer::bind(interface, 0).unwrap();
    let base = format!("http://{}", proxy.addr());
    let handle = proxy.handle();
    proxy.spawn(ProxyContext {
        client,
        pages_dir: pages.clone(),
        script_tag: script_tag.map(str::to_string),
        runtime: Handle::current(),
    });

    Running {
        _dir: dir,
        pages,
        base,
        storefront,
        proxy: handle,
        shop,
    }
}

fn http() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_page_is_fetched_stored_and_injected() {
    let run = start(Some("<script>lr()</script>"));

    let response = http()
        .get(format!("{}/products/hat", run.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.text().await.unwrap(),
        "<html><body>hat<script>lr()</script></body></html>"
    );
    assert_eq!(
        std::fs::read_to_string(run.pages.join("_products_hat.html")).unwrap(),
        HAT_PAGE
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_page_redirects_are_followed() {
    let run = start(None);
    let response = http()
        .get(format!("{}/old-hat", run.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), HAT_PAGE);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_static_request_redirects_to_storefront() {
    let run = start(None);
    let response = http()
        .get(format!("{}/cdn/app.js?v=2", run.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 302);
    assert_eq!(
        response.headers()["location"],
        format!("{}/cdn/app.js?v=2", run.storefront).as_str()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_page_is_bad_gateway() {
    let run = start(None);
    let response = http()
        .get(format!("{}/pages/nope", run.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
}

#[test]
fn test_storefront_url() {
    assert_eq!(
        storefront_url("https://shop.example.com/", "/cart?x=1"),
        "https://shop.example.com/cart?x=1"
    );
}
