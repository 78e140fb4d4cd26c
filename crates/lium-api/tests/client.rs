use lium_api::{ApiError, ExecutorFilter, HttpError, LiumApiClient, RentRequest, TemplateSpec};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-key-1234567890";

fn client(server: &MockServer) -> LiumApiClient {
    LiumApiClient::new(KEY.to_string(), Some(server.uri()))
        .with_pay_url(format!("{}/pay", server.uri()))
        .with_retry_delay(Duration::ZERO)
}

fn executor_json(id: &str, machine: &str, price: f64, gpus: u32) -> serde_json::Value {
    json!({
        "id": id,
        "machine_name": machine,
        "price_per_hour": price,
        "location": {"country": "US"},
        "specs": {"gpu": {"count": gpus, "details": [{"name": machine, "capacity": 81920}]}},
        "status": "available"
    })
}

#[tokio::test]
async fn sends_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pods"))
        .and(header("X-API-KEY", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let pods = client(&server).get_pods().await.unwrap();
    assert!(pods.is_empty());
}

#[tokio::test]
async fn executors_resolve_short_gpu_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/machines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "NVIDIA H100 80GB HBM3"},
            {"name": "NVIDIA H100 80GB PCIe"},
            {"name": "NVIDIA A100-SXM4-80GB"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/executors"))
        .and(query_param("size", "1000"))
        .and(query_param("machine_names", "NVIDIA H100 80GB HBM3,NVIDIA H100 80GB PCIe"))
        .and(query_param("gpu_count_gte", "8"))
        .and(query_param("gpu_count_lte", "8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            executor_json("e1", "NVIDIA H100 80GB HBM3", 16.0, 8)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let filter = ExecutorFilter {
        gpu_type: Some("h100".to_string()),
        gpu_count: Some(8),
        ..ExecutorFilter::default()
    };
    let executors = client(&server).get_executors(&filter).await.unwrap();

    assert_eq!(executors.len(), 1);
    assert_eq!(executors[0].gpu_type, "H100");
    assert_eq!(executors[0].gpu_count, 8);
    assert_eq!(executors[0].price_per_gpu_hour, 2.0);
}

#[tokio::test]
async fn unknown_gpu_name_is_sent_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/machines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "NVIDIA L40S"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/executors"))
        .and(query_param("machine_names", "B300"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let filter = ExecutorFilter {
        gpu_type: Some("B300".to_string()),
        ..ExecutorFilter::default()
    };
    assert!(client(&server).get_executors(&filter).await.unwrap().is_empty());
}

#[tokio::test]
async fn retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1", "balance": 12.5})))
        .mount(&server)
        .await;

    let balance = client(&server).balance().await.unwrap();
    assert_eq!(balance, 12.5);
}

#[tokio::test]
async fn gives_up_after_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pods"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server).get_pods().await.unwrap_err();
    assert!(matches!(err, ApiError::Http(HttpError::ServerError(503))));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pods"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/volumes"))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad volume"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.get_pods().await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid API key");

    let err = client.list_volumes().await.unwrap_err();
    assert_eq!(err.to_string(), "API error 422: bad volume");
}

#[tokio::test]
async fn missing_template_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/templates/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/templates/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t1", "name": "PyTorch", "docker_image": "daturaai/pytorch",
            "docker_image_tag": "2.4.1", "status": "VERIFY_SUCCESS"
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.get_template("missing").await.unwrap().is_none());
    let template = client.get_template("t1").await.unwrap().unwrap();
    assert_eq!(template.image_ref(), "daturaai/pytorch:2.4.1");
}

#[tokio::test]
async fn rent_posts_full_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/executors/e1/rent"))
        .and(body_json(json!({
            "pod_name": "trainer",
            "template_id": "t1",
            "volume_id": null,
            "user_public_key": ["ssh-ed25519 AAAA"],
            "initial_port_count": 3
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let request = RentRequest {
        pod_name: "trainer".to_string(),
        template_id: "t1".to_string(),
        volume_id: None,
        user_public_key: vec!["ssh-ed25519 AAAA".to_string()],
        initial_port_count: Some(3),
    };
    let response = client(&server).rent_pod("e1", &request).await.unwrap();
    assert!(response.is_null());
}

#[tokio::test]
async fn create_template_sends_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/templates"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "t9", "name": "app", "docker_image": "alice/app",
            "docker_image_tag": "v1", "category": "UBUNTU", "status": "VERIFYING"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let spec = TemplateSpec::new("app", "alice/app").tag("v1");
    let template = client(&server).create_template(&spec).await.unwrap();
    assert_eq!(template.id, "t9");
    assert_eq!(template.status, "VERIFYING");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["internal_ports"], json!([22, 8000]));
    assert_eq!(body["is_private"], true);
    assert_eq!(body["volumes"], json!(["/workspace"]));
}

#[tokio::test]
async fn backup_logs_accept_items_or_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/backup-logs/pod/exec-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "l1", "status": "COMPLETED", "started_at": "2024-05-01T10:00:00Z"}],
            "total": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/backup-logs/pod/exec-b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "l2", "status": "FAILED", "error_message": "disk full"},
            {"id": "l3", "status": "IN_PROGRESS", "progress": 40.0}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/backup-logs/pod/exec-c"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server);
    let paged = client.get_backup_logs("exec-a").await.unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].status, "COMPLETED");
    assert!(paged[0].started_at.is_some());

    let listed = client.get_backup_logs("exec-b").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].error_message.as_deref(), Some("disk full"));

    assert!(client.get_backup_logs("exec-c").await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_backup_config_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/backup-configs/pod/exec-a"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(client(&server)
        .get_backup_config("exec-a")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn volume_update_requires_a_field() {
    let server = MockServer::start().await;
    let client = client(&server);

    let err = client.update_volume("v1", None, None).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    Mock::given(method("PUT"))
        .and(path("/volumes/v1"))
        .and(body_json(json!({"name": "data"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "v1", "name": "data", "current_size_bytes": 1024
        })))
        .expect(1)
        .mount(&server)
        .await;

    let volume = client.update_volume("v1", Some("data"), None).await.unwrap();
    assert_eq!(volume.name, "data");
}

#[tokio::test]
async fn schedule_removal_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pods/p1/schedule-removal"))
        .and(body_json(json!({"removal_scheduled_at": "2025-01-01T12:00:00Z"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .schedule_removal("p1", "2025-01-01T12:00:00Z")
        .await
        .unwrap();
}

#[tokio::test]
async fn pay_api_requires_key() {
    let server = MockServer::start().await;
    let err = client(&server).generate_access_key().await.unwrap_err();
    assert!(matches!(err, ApiError::Config(_)));
    assert!(err.to_string().contains("LIUM_PAY_API_KEY"));
}

#[tokio::test]
async fn pay_api_uses_its_own_key_and_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pay/token/generate"))
        .and(header("X-API-KEY", "pay-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_key": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).with_pay_api_key("pay-key");
    assert_eq!(client.generate_access_key().await.unwrap(), "abc");
}

#[tokio::test]
async fn connection_test_reports_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1"})))
        .mount(&server)
        .await;

    assert!(client(&server)
        .test_connection(Duration::from_secs(5))
        .await
        .unwrap());

    let bad = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&bad)
        .await;
    assert!(client(&bad)
        .test_connection(Duration::from_secs(5))
        .await
        .is_err());
}
