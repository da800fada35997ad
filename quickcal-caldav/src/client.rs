//! libdav client construction.

use anyhow::{Context, Result};
use http::Uri;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use libdav::CalDavClient;
use libdav::dav::WebDavClient;
use tower::ServiceBuilder;
use tower_http::{auth::AddAuthorization, follow_redirect::FollowRedirectLayer};
use tracing::debug;

type HttpsConnector = hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;

/// HTTP client with basic auth and redirect following.
type HttpClient = tower_http::follow_redirect::FollowRedirect<AddAuthorization<Client<HttpsConnector, String>>>;

/// CalDAV client for one configured server.
pub type DavClient = CalDavClient<HttpClient>;

/// Create a CalDAV client for `base_url` authenticating with basic auth.
///
/// Redirects are followed, since many servers answer the well-known and
/// principal URLs with a redirect to the real location.
pub fn create_client(base_url: &str, username: &str, password: &str) -> Result<DavClient> {
    let uri: Uri = base_url
        .parse()
        .with_context(|| format!("Invalid server URL: {}", base_url))?;

    let https_connector = HttpsConnectorBuilder::new()
        .with_native_roots()
        .context("Failed to load native TLS roots")?
        .https_or_http()
        .enable_http1()
        .build();

    let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
    let auth_client = AddAuthorization::basic(http_client, username, password);

    let client = ServiceBuilder::new()
        .layer(FollowRedirectLayer::new())
        .service(auth_client);

    debug!(url = base_url, user = username, "Created CalDAV client");

    Ok(CalDavClient::new(WebDavClient::new(uri, client)))
}

/// Path part of a URL; non-URLs are returned unchanged.
///
/// `https://dav.example.com/cal/me/personal/` becomes `/cal/me/personal/`.
pub fn url_to_href(url: &str) -> String {
    match url.parse::<Uri>() {
        Ok(uri) if uri.scheme().is_some() => uri.path().to_string(),
        _ => url.to_string(),
    }
}
