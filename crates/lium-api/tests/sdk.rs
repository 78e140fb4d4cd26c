use lium_api::{ApiError, Lium, LiumApiClient, SshSettings, TemplateSpec, UpRequest};
use lium_core::{ApiPodResponse, PodInfo};
use serde_json::{json, Map};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn lium(server: &MockServer, keys: &[&str]) -> Lium {
    let client = LiumApiClient::new("sdk-test-key-0000".to_string(), Some(server.uri()))
        .with_pay_url(format!("{}/pay", server.uri()))
        .with_pay_api_key("pay-key")
        .with_retry_delay(Duration::ZERO);
    let ssh = SshSettings {
        private_key: None,
        public_keys: keys.iter().map(|k| k.to_string()).collect(),
        user: "root".to_string(),
    };
    Lium::new(client, ssh).with_poll_interval(Duration::ZERO)
}

async fn mount_executor(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/executors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "exec-1",
            "machine_name": "NVIDIA H100 80GB HBM3",
            "price_per_hour": 2.5,
            "specs": {
                "gpu": {"count": 1, "driver": "550.54", "details": [{"name": "NVIDIA H100 80GB HBM3"}]}
            }
        }])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn up_finds_pod_by_name_when_rent_has_no_id() {
    let server = MockServer::start().await;
    mount_executor(&server).await;
    Mock::given(method("POST"))
        .and(path("/executors/exec-1/rent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "accepted"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "pod-9", "pod_name": "trainer", "status": "PENDING"}
        ])))
        .mount(&server)
        .await;

    let mut request = UpRequest::new("exec-1");
    request.name = "trainer".to_string();
    request.template_id = Some("t1".to_string());

    let handle = lium(&server, &["ssh-ed25519 AAAA"]).up(request).await.unwrap();
    assert_eq!(handle.id, "pod-9");
    assert_eq!(handle.executor_id, "exec-1");
    assert_eq!(handle.status, "PENDING");
}

#[tokio::test]
async fn up_without_keys_fails() {
    let server = MockServer::start().await;
    mount_executor(&server).await;

    let mut request = UpRequest::new("exec-1");
    request.template_id = Some("t1".to_string());
    let err = lium(&server, &[]).up(request).await.unwrap_err();
    assert_eq!(err.to_string(), "Configuration error: No SSH keys found");
}

#[tokio::test]
async fn up_unknown_executor_fails() {
    let server = MockServer::start().await;
    mount_executor(&server).await;

    let err = lium(&server, &["k"])
        .up(UpRequest::new("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn wait_ready_polls_until_ssh_is_available() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "pod-1", "pod_name": "a", "status": "PENDING"}
        ])))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "pod-1", "pod_name": "a", "status": "RUNNING", "ssh_connect_cmd": "ssh root@10.0.0.1 -p 2200"}
        ])))
        .mount(&server)
        .await;

    let pod = lium(&server, &[])
        .wait_ready("pod-1", Duration::from_secs(30))
        .await
        .unwrap()
        .unwrap();
    assert!(pod.is_ready());
}

#[tokio::test]
async fn wait_ready_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let pod = lium(&server, &[])
        .wait_ready("pod-1", Duration::ZERO)
        .await
        .unwrap();
    assert!(pod.is_none());
}

#[tokio::test]
async fn default_template_prefers_pytorch_image() {
    let server = MockServer::start().await;
    mount_executor(&server).await;
    Mock::given(method("GET"))
        .and(path("/executors/default-docker-image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"docker_image": "daturaai/ubuntu", "docker_image_tag": "22.04"},
            {"docker_image": "daturaai/pytorch", "docker_image_tag": "2.4.1"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/templates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "t-ubuntu", "docker_image": "daturaai/ubuntu", "docker_image_tag": "22.04"},
            {"id": "t-torch", "docker_image": "daturaai/pytorch", "docker_image_tag": "2.4.1"}
        ])))
        .mount(&server)
        .await;

    let template = lium(&server, &[])
        .default_docker_template("exec-1")
        .await
        .unwrap();
    assert_eq!(template.id, "t-torch");
}

#[tokio::test]
async fn update_template_checks_ownership() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/templates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "t1", "user_id": "someone-else", "docker_image": "bob/app"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "me"})))
        .mount(&server)
        .await;

    let lium = lium(&server, &[]);
    let spec = TemplateSpec::new("app", "alice/app");

    let err = lium.update_template("t1", &spec).await.unwrap_err();
    assert!(err.to_string().contains("not owned by current user"));

    let err = lium.update_template("t404", &spec).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn edit_merges_into_pod_template() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pods/pod-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pod-1",
            "template": {"id": "t1", "docker_image": "old/img", "startup_commands": ""}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/templates/t1"))
        .and(body_json(json!({
            "id": "t1",
            "docker_image": "old/img",
            "startup_commands": "python serve.py"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "t1"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = Map::new();
    fields.insert("startup_commands".to_string(), json!("python serve.py"));
    lium(&server, &[]).edit("pod-1", fields).await.unwrap();
}

#[tokio::test]
async fn link_wallet_verifies_and_waits_for_wallet() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pay/token/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_key": "ak-1"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tao/create-transfer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://pay.example/checkout?app_id=app-7&customer_id=cus_42"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/pay/token/verify"))
        .and(body_json(json!({
            "coldkey_address": "5Fcold",
            "access_key": "ak-1",
            "signature": "sig-for-ak-1",
            "stripe_customer_id": "cus_42",
            "application_id": "app-7"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "me", "stripe_customer_id": "cus_42"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pay/wallet/available-wallets/cus_42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"wallet_hash": "5Fcold"}
        ])))
        .mount(&server)
        .await;

    lium(&server, &[])
        .link_wallet("5Fcold", |key| Ok(format!("sig-for-{}", key)))
        .await
        .unwrap();
}

#[tokio::test]
async fn pay_rejects_non_positive_amounts() {
    let server = MockServer::start().await;
    let err = lium(&server, &[]).pay(0.0).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn configured_ssh_user_applies_when_pod_names_none() {
    let client = LiumApiClient::new("sdk-test-key-0000".to_string(), None);
    let ssh = SshSettings {
        private_key: None,
        public_keys: Vec::new(),
        user: "ubuntu".to_string(),
    };
    let lium = Lium::new(client, ssh);

    let pod = |cmd: &str| -> PodInfo {
        let raw: ApiPodResponse = serde_json::from_value(json!({
            "id": "pod-1",
            "pod_name": "a",
            "status": "RUNNING",
            "ssh_connect_cmd": cmd
        }))
        .unwrap();
        PodInfo::from(raw)
    };

    let bare = lium.ssh_target(&pod("ssh -p 2200 10.0.0.1")).unwrap();
    assert_eq!(bare.user, "ubuntu");
    assert_eq!(bare.port, 2200);
    assert_eq!(lium.ssh_target(&pod("ssh root@10.0.0.1 -p 2200")).unwrap().user, "root");
}

#[tokio::test]
async fn switch_template_reports_malformed_response() {
    let server = MockServer::start().await;
    let raw: ApiPodResponse =
        serde_json::from_value(json!({"id": "pod-1", "pod_name": "a", "status": "RUNNING"})).unwrap();
    let pod = PodInfo::from(raw);

    Mock::given(method("PUT"))
        .and(path("/pods/pod-1/switch-template"))
        .and(body_json(json!({"template_id": "tpl-2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42, "status": ["bad"]})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    let err = lium(&server, &[]).switch_template(&pod, "tpl-2").await.unwrap_err();
    assert!(matches!(err, ApiError::Json(_)));

    Mock::given(method("PUT"))
        .and(path("/pods/pod-1/switch-template"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let updated = lium(&server, &[]).switch_template(&pod, "tpl-2").await.unwrap();
    assert_eq!(updated.id, "pod-1");
    assert_eq!(updated.name, "a");
}
