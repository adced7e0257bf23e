//! Integration tests for the façades and executor using wiremock.

use std::time::{Duration, Instant};

use assert2::{check, let_assert};
use estuary::types::{Health, IpfsPinStatus, PinList};
use estuary::{CancellationToken, Client, ClientConfig, DEFAULT_USER_AGENT, Scheme};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

fn client_for(server: &MockServer) -> Client {
    Client::new(
        ClientConfig::builder()
            .host(server.address().to_string())
            .scheme(Scheme::Http)
            .build(),
    )
}

fn pin_status() -> serde_json::Value {
    json!({
        "requestid": "42",
        "status": "queued",
        "created": "2022-03-01T12:30:00Z",
        "pin": {"cid": "QmRoot", "name": "photos", "origins": [], "meta": {"collection": "c1"}},
        "delegates": [],
        "info": {}
    })
}

#[tokio::test]
async fn test_health_sends_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .and(header("User-Agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let health = client_for(&server).health().send().await.expect("health");
    check!(health == Health { status: "ok".to_string() });
}

#[tokio::test]
async fn test_user_agent_suffix() {
    let server = MockServer::start().await;
    let expected = format!("{DEFAULT_USER_AGENT} gallery/2.1");

    Mock::given(method("GET"))
        .and(path("/public/info"))
        .and(header("User-Agent", expected.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"primaryAddress": "f1abc"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(
        ClientConfig::builder()
            .host(server.address().to_string())
            .scheme(Scheme::Http)
            .user_agent("gallery/2.1")
            .build(),
    );
    let info = client.public_node_info().send().await.expect("info");
    check!(info.primary_address == "f1abc");
}

#[tokio::test]
async fn test_public_content_by_cid() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/by-cid/QmRoot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"content": {"id": 7, "cid": "QmRoot", "name": "a.txt", "size": 12}, "deals": []}
        ])))
        .mount(&server)
        .await;

    let infos = client_for(&server)
        .public_content_by_cid("QmRoot")
        .send()
        .await
        .expect("content");

    let_assert!([info] = infos.as_slice());
    check!(info.content.id == 7);
    check!(info.content.size == 12);
    check!(info.aggregated_in.is_none());
}

#[tokio::test]
async fn test_pins_list_sends_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pinning/pins"))
        .and(header("Authorization", "Bearer EST-secret"))
        .and(header("User-Agent", DEFAULT_USER_AGENT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"count": 1, "results": [pin_status()]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let list: PinList = client_for(&server)
        .with_token("EST-secret")
        .pins()
        .list()
        .send()
        .await
        .expect("pins");

    check!(list.count == 1);
    check!(list.results[0].request_id == "42");
}

#[tokio::test]
async fn test_pin_add_posts_json() {
    let server = MockServer::start().await;
    let expected = json!({
        "cid": "QmRoot",
        "name": "photos",
        "origins": ["/ip4/1.2.3.4/tcp/4001/p2p/QmA"],
        "meta": {"collection": "c1", "app": "gallery"}
    });

    Mock::given(method("POST"))
        .and(path("/pinning/pins"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(202).set_body_json(pin_status()))
        .expect(1)
        .mount(&server)
        .await;

    let mut meta = serde_json::Map::new();
    meta.insert("app".to_string(), json!("gallery"));

    let status: IpfsPinStatus = client_for(&server)
        .with_token("t")
        .pins()
        .add("QmRoot")
        .name("photos")
        .collection("c1")
        .origins(["/ip4/1.2.3.4/tcp/4001/p2p/QmA"])
        .meta(meta)
        .send()
        .await
        .expect("pin");
    check!(status.status == "queued");

    let requests = server.received_requests().await.expect("recorded");
    let_assert!([request] = requests.as_slice());
    let length = request
        .headers
        .get("content-length")
        .and_then(|value| value.to_str().ok())
        .expect("content-length");
    check!(length == request.body.len().to_string());
}

#[tokio::test]
async fn test_pin_replace_and_delete() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pinning/pins/42"))
        .respond_with(ResponseTemplate::new(202).set_body_json(pin_status()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/pinning/pins/42"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let pins = client_for(&server).with_token("t").pins();
    let status = pins.replace("42", "QmNew").send().await.expect("replace");
    check!(status.request_id == "42");

    pins.delete("42").send().await.expect("delete");
}

#[tokio::test]
async fn test_content_add_ipfs_query() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/content/add-ipfs"))
        .and(query_param("root", "QmRoot"))
        .and(query_param("name", "my dag"))
        .and(query_param("peers", "/ip4/1.2.3.4/tcp/4001,/ip4/5.6.7.8/tcp/4001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pin_status()))
        .expect(1)
        .mount(&server)
        .await;

    let status = client_for(&server)
        .with_token("t")
        .content_add_ipfs("QmRoot")
        .name("my dag")
        .peers(["/ip4/1.2.3.4/tcp/4001", "/ip4/5.6.7.8/tcp/4001"])
        .send()
        .await
        .expect("add-ipfs");
    check!(status.pin.cid == "QmRoot");
}

#[tokio::test]
async fn test_error_body_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pinning/pins"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "bad token"})))
        .mount(&server)
        .await;

    let result = client_for(&server).with_token("nope").pins().list().send().await;

    let_assert!(Err(err) = result);
    check!(err.is_status());
    check!(err.status_code() == Some(401));
    let_assert!(Some(response_error) = err.response_error());
    check!(response_error.message() == "bad token");
    check!(response_error.url().ends_with("/pinning/pins"));
}

#[tokio::test]
async fn test_unparseable_error_body_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let result = client_for(&server).health().send().await;

    let_assert!(Err(err) = result);
    check!(err.status_code() == Some(502));
    let_assert!(Some(response_error) = err.response_error());
    check!(response_error.message().starts_with("unable to decode error response"));
}

#[tokio::test]
async fn test_invalid_success_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"totalStorage": "lots"})))
        .mount(&server)
        .await;

    let result = client_for(&server).public_stats().send().await;

    let_assert!(Err(err) = result);
    check!(err.is_decode());
    check!(err.status_code() == Some(200));
    check!(err.to_string().contains("totalStorage"));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("address");
    drop(listener);

    let client = Client::new(
        ClientConfig::builder()
            .host(address.to_string())
            .scheme(Scheme::Http)
            .build(),
    );
    let result = client.health().send().await;

    let_assert!(Err(err) = result);
    check!(err.is_transport());
    check!(err.status_code() == Some(0));
    check!(!err.is_cancelled());
}

#[tokio::test]
async fn test_cancelled_before_send() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    token.cancel();
    let result = client_for(&server).health().cancel_with(token).send().await;

    let_assert!(Err(err) = result);
    check!(err.is_cancelled());
    check!(err.status_code() == Some(0));
    let requests = server.received_requests().await.expect("recorded");
    check!(requests.is_empty());
}

#[tokio::test]
async fn test_cancelled_during_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok"}))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let result = client_for(&server).health().cancel_with(token).send().await;

    let_assert!(Err(err) = result);
    check!(err.is_cancelled());
    check!(err.to_string().contains("request cancelled"));
    check!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancelled_while_reading_success_body() {
    // Sends the status line and half of the body, then stalls.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("address");
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let mut buf = [0_u8; 1024];
        let _ = stream.read(&mut buf).await;
        stream
            .write_all(
                b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"sta",
            )
            .await
            .expect("write head");
        stream.flush().await.expect("flush");
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let client = Client::new(
        ClientConfig::builder()
            .host(address.to_string())
            .scheme(Scheme::Http)
            .build(),
    );
    let token = CancellationToken::new();
    let response = client
        .executor()
        .execute(estuary::Method::Get, client.new_request("/health").cancel_with(token.clone()))
        .await
        .expect("headers arrive");
    check!(response.status() == 200);

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let result = response.json::<Health>().await;

    let_assert!(Err(err) = result);
    check!(err.is_cancelled());
    check!(!err.is_decode());
    check!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok"}))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let client = Client::new(
        ClientConfig::builder()
            .host(server.address().to_string())
            .scheme(Scheme::Http)
            .timeout(Duration::from_millis(200))
            .build(),
    );
    let result = client.health().send().await;

    let_assert!(Err(err) = result);
    check!(err.is_transport());
    check!(err.to_string().contains("timed out"));
}
