//! Failure handling: dead origin, slow origin, and the CSV log under load.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HOST;

use frontgate::events::LogSink;

mod common;
use common::*;

#[tokio::test]
async fn unreachable_origin_serves_preloaded_500() {
    let origin = MockOrigin::start().await;
    let proxy = start_proxy(gate_config(origin.addr), None).await;

    // Preload succeeded; now the origin goes away entirely.
    origin.stop();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = no_pool_client()
        .get(format!("http://{}/index.html", proxy.addr))
        .header(HOST, "example.com")
        .send()
        .await
        .expect("proxy unreachable");

    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), PAGE_500);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn slow_origin_times_out_to_preloaded_500() {
    let origin = MockOrigin::start().await;
    let proxy = start_proxy(gate_config(origin.addr), None).await;

    let res = no_pool_client()
        .get(format!("http://{}/slow", proxy.addr))
        .header(HOST, "example.com")
        .send()
        .await
        .expect("proxy unreachable");

    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), PAGE_500);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn csv_log_gets_one_record_per_request() {
    let origin = MockOrigin::start().await;

    let folder = std::env::temp_dir().join(format!("frontgate-it-log-{}", std::process::id()));
    let log = Arc::new(LogSink::open(&folder, "gate.csv").unwrap());
    log.write_header().unwrap();

    let proxy = start_proxy(gate_config(origin.addr), Some(log.clone())).await;
    let client = no_pool_client();

    let accepted = client
        .get(format!("http://{}/index.html", proxy.addr))
        .header(HOST, "example.com")
        .send()
        .await
        .expect("proxy unreachable");
    assert_eq!(accepted.status(), 200);

    let rejected = client
        .get(format!("http://{}/x", proxy.addr))
        .header(HOST, "evil.com")
        .send()
        .await
        .expect("proxy unreachable");
    assert_eq!(rejected.status(), 400);

    assert_eq!(log.count(), 2);

    let content = std::fs::read_to_string(log.path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3, "header plus one record per request");

    // Every record lines up with the header, column for column.
    let columns = lines[0].split(',').count();
    for line in &lines[1..] {
        assert_eq!(line.split(',').count(), columns);
        assert!(line.starts_with("[REQ],"));
        assert!(line.ends_with(",[END]"));
    }
    assert!(lines[1].contains(",200,"));
    assert!(lines[2].contains(",400,"));

    proxy.shutdown.trigger();
    std::fs::remove_dir_all(&folder).unwrap();
}
