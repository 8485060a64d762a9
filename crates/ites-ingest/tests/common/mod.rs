//! Shared fixtures for ites-ingest integration tests
#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use ites_ingest::LoaderConfig;
use serde_json::json;
use std::io::Write;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SMALL_CSV: &str = "a,b\n1,\n,2\n3,3";

pub const PROTO_SOURCE: &str = r#"
public abstract class SqlProtocolTestCase extends ESRestTestCase {
    public void testTypes() throws IOException {
        assertQuery("SELECT TRUE", "TRUE", "boolean", true, 1);
        assertQuery("SELECT INTERVAL '1' DAY", "INTERVAL '1' DAY", "interval_day", "PT24H", "+1 00:00:00", 23);
    }
}
"#;

pub const FLIGHTS_MAPPINGS: &str = r#"
/* Licensed under the Elastic License */
export const fieldMappings = {
  FlightNum: {
    type: 'keyword',
  },
  // kilometres
  DistanceKilometers: { type: 'float' },
};
"#;

/// Config pointing the cluster at `cluster` and every upstream at `upstream`
pub fn config_for(cluster: &MockServer, upstream: &MockServer) -> LoaderConfig {
    LoaderConfig::builder()
        .cluster_url(cluster.uri())
        .upstream_base_url(upstream.uri())
        .basic_auth("elastic", "changeme")
        .poll_interval_ms(10)
        .request_timeout_secs(2)
        .build()
        .unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub async fn serve(server: &MockServer, route: &str, body: impl Into<Vec<u8>>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.into()))
        .mount(server)
        .await;
}

pub fn bulk_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "took": 3, "errors": false, "items": [] }))
}

pub fn hits(total: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "hits": { "total": { "value": total, "relation": "eq" }, "hits": [] }
    }))
}

/// Methods and paths of every request the server saw, in order
pub async fn request_log(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| format!("{} {}", r.method, r.url.path()))
        .collect()
}

/// Raw HTTP server whose responses promise more body than they send
///
/// The status line arrives intact, then the connection closes mid-body.
pub async fn truncated_body_server(status: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial",
                status
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{}", addr)
}
