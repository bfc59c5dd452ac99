use httpmock::prelude::*;
use smskenya::config::toml_config::TomlConfig;
use smskenya::config::{Overrides, Settings};
use smskenya::core::catalog::{find_country, find_service};
use smskenya::core::currency::CurrencySelector;
use smskenya::core::dashboard::orders_csv;
use smskenya::core::direct::{DirectLink, DirectState};
use smskenya::core::session::{AuthMode, AuthOutcome, TOKEN_KEY, USER_KEY};
use smskenya::core::wizard::{AccountStanding, CatalogWizard, Checkout, WizardSeed};
use smskenya::domain::model::{Credentials, Currency, OrderStatus};
use smskenya::{AppContext, AppError};
use tempfile::TempDir;

fn settings(server: &MockServer, session_dir: &TempDir) -> Settings {
    Settings::resolve(
        &TomlConfig::default(),
        Overrides {
            api_base: Some(server.base_url()),
            session_dir: Some(session_dir.path().to_string_lossy().into_owned()),
            no_geo: true,
        },
    )
}

fn credentials() -> Credentials {
    Credentials {
        username: "amina".to_string(),
        password: "hunter22".to_string(),
    }
}

fn waiting_order() -> serde_json::Value {
    serde_json::json!({
        "id": 41,
        "service_id": "wa",
        "country_id": "KE",
        "phone_number": "+254711000041",
        "order_id_provider": "prov-41",
        "status": "waiting",
        "sms_code": null,
        "timestamp": "2026-06-10T08:30:00Z"
    })
}

#[tokio::test]
async fn test_login_generate_and_export_orders() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/api/login")
            .json_body(serde_json::json!({"username": "amina", "password": "hunter22"}));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "token": "jwt-amina",
                "user": {"id": 12, "username": "amina"}
            }));
    });
    let me = server.mock(|when, then| {
        when.method(GET)
            .path("/api/me")
            .header("Authorization", "Bearer jwt-amina");
        then.status(200)
            .json_body(serde_json::json!({"quota": {"allowed": 3, "used": 1}}));
    });
    let generate = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate-number")
            .header("Authorization", "Bearer jwt-amina")
            .json_body(serde_json::json!({"service_id": "wa", "country_id": "KE"}));
        then.status(200).json_body(waiting_order());
    });
    let orders = server.mock(|when, then| {
        when.method(GET)
            .path("/api/orders")
            .header("Authorization", "Bearer jwt-amina");
        then.status(200)
            .json_body(serde_json::json!([waiting_order()]));
    });

    let ctx = AppContext::from_config(&settings(&server, &temp_dir)).unwrap();
    let mut session = ctx.session().await.unwrap();
    assert!(!session.is_authenticated());

    let outcome = session
        .submit_credentials(AuthMode::Login, &credentials())
        .await
        .unwrap();
    assert!(matches!(outcome, AuthOutcome::LoggedIn(ref user) if user.username == "amina"));
    assert_eq!(session.remaining(), 2);
    assert!(temp_dir.path().join(TOKEN_KEY).exists());
    assert!(temp_dir.path().join(USER_KEY).exists());

    let order = session.generate_number("wa", "KE").await.unwrap();
    assert_eq!(order.status, OrderStatus::Waiting);
    assert_eq!(order.phone_number, "+254711000041");

    let token = session.token().unwrap().to_string();
    let mut dashboard = ctx.dashboard(&token);
    dashboard.fetch_orders().await.unwrap();
    assert!(dashboard.has_waiting());

    let csv = String::from_utf8(orders_csv(dashboard.orders()).unwrap()).unwrap();
    assert!(csv.starts_with("id,service_id"));
    assert!(csv.contains("prov-41,waiting,"));

    login.assert();
    generate.assert();
    orders.assert();
    // 登入後一次，產生號碼後一次
    me.assert_hits(2);
}

#[tokio::test]
async fn test_saved_session_survives_restart_until_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/api/login");
        then.status(200).json_body(serde_json::json!({
            "token": "jwt-old",
            "user": {"id": 5, "username": "amina"}
        }));
    });
    let mut me_ok = server.mock(|when, then| {
        when.method(GET).path("/api/me");
        then.status(200)
            .json_body(serde_json::json!({"quota": {"allowed": 1, "used": 0}}));
    });

    let ctx = AppContext::from_config(&settings(&server, &temp_dir)).unwrap();
    let mut session = ctx.session().await.unwrap();
    session
        .submit_credentials(AuthMode::Login, &credentials())
        .await
        .unwrap();

    // 新的 context 讀到同一個目錄
    let restarted = AppContext::from_config(&settings(&server, &temp_dir)).unwrap();
    let restored = restarted.session().await.unwrap();
    assert_eq!(restored.user().map(|u| u.id), Some(5));
    assert_eq!(restored.token(), Some("jwt-old"));
    assert!(restored.can_generate());

    me_ok.delete();
    server.mock(|when, then| {
        when.method(GET).path("/api/me");
        then.status(401);
    });

    let rejected = restarted.session().await.unwrap();
    assert!(!rejected.is_authenticated());
    assert!(!temp_dir.path().join(TOKEN_KEY).exists());
    assert!(!temp_dir.path().join(USER_KEY).exists());
}

#[tokio::test]
async fn test_quota_error_from_server_points_to_admin() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/api/login");
        then.status(200).json_body(serde_json::json!({
            "token": "jwt-q",
            "user": {"id": 8, "username": "amina"}
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/me");
        then.status(200)
            .json_body(serde_json::json!({"quota": {"allowed": 5, "used": 2}}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/generate-number");
        then.status(403)
            .json_body(serde_json::json!({"message": "Country not on your whitelist"}));
    });

    let ctx = AppContext::from_config(&settings(&server, &temp_dir)).unwrap();
    let mut session = ctx.session().await.unwrap();
    session
        .submit_credentials(AuthMode::Login, &credentials())
        .await
        .unwrap();

    let err = session.generate_number("tg", "NG").await.unwrap_err();
    assert!(matches!(err, AppError::ApiError { status: 403, .. }));
    assert!(err.needs_admin_contact());
    assert_eq!(err.user_friendly_message(), "Country not on your whitelist");
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_dashboard_refresh_checks_waiting_then_reloads() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let mut list_waiting = server.mock(|when, then| {
        when.method(GET).path("/api/orders");
        then.status(200)
            .json_body(serde_json::json!([waiting_order()]));
    });
    let status = server.mock(|when, then| {
        when.method(GET)
            .path("/api/order/prov-41/status")
            .header("Authorization", "Bearer tok");
        then.status(200).json_body(serde_json::json!({"status": "received"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/me");
        then.status(200)
            .json_body(serde_json::json!({"quota": {"allowed": 4, "used": 4}}));
    });

    let ctx = AppContext::from_config(&settings(&server, &temp_dir)).unwrap();
    let mut dashboard = ctx.dashboard("tok");
    dashboard.fetch_orders().await.unwrap();
    assert!(dashboard.has_waiting());

    let mut received = waiting_order();
    received["status"] = serde_json::json!("received");
    received["sms_code"] = serde_json::json!("640021");
    list_waiting.delete();
    let list_received = server.mock(|when, then| {
        when.method(GET).path("/api/orders");
        then.status(200).json_body(serde_json::json!([received]));
    });

    let report = dashboard.refresh_all().await;

    assert_eq!(report.checked, 1);
    assert_eq!(report.failed, 0);
    status.assert();
    list_received.assert();
    assert!(!dashboard.has_waiting());
    assert_eq!(dashboard.orders()[0].sms_code.as_deref(), Some("640021"));
    assert_eq!(dashboard.quota().map(|q| q.remaining()), Some(0));
}

#[tokio::test]
async fn test_direct_purchase_from_link() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let generate = server.mock(|when, then| {
        when.method(POST)
            .path("/api/direct/generate")
            .json_body(serde_json::json!({"token": "once-9", "service_id": "tt", "country_id": "KE"}));
        then.status(200)
            .json_body(serde_json::json!({"order_id": "d-9", "phone_number": "+254799000009"}));
    });
    let status = server.mock(|when, then| {
        when.method(GET)
            .path("/api/direct/status")
            .query_param("token", "once-9")
            .query_param("order_id", "d-9");
        then.status(200)
            .json_body(serde_json::json!({"status": "received", "sms_code": "313370"}));
    });

    let ctx = AppContext::from_config(&settings(&server, &temp_dir)).unwrap();
    let link = DirectLink::parse("https://smskenya.example/direct?token=once-9&service=tt&country=KE")
        .unwrap();
    assert_eq!(link.service().map(|s| s.name), Some("TikTok"));

    let mut purchase = ctx.direct_purchase(link);
    assert!(matches!(purchase.start().await, DirectState::Waiting(_)));
    purchase.check_once().await.unwrap();

    generate.assert();
    status.assert();
    assert_eq!(purchase.sms_code(), Some("313370"));
}

#[tokio::test]
async fn test_direct_purchase_rejected_link_shows_server_message() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/api/direct/generate");
        then.status(400)
            .json_body(serde_json::json!({"message": "Link already used"}));
    });

    let ctx = AppContext::from_config(&settings(&server, &temp_dir)).unwrap();
    let link = DirectLink::new(
        Some("used-1".to_string()),
        Some("wa".to_string()),
        Some("KE".to_string()),
    );
    let mut purchase = ctx.direct_purchase(link);

    assert_eq!(
        purchase.start().await,
        &DirectState::Error("Link already used".to_string())
    );
}

#[test]
fn test_anonymous_checkout_builds_whatsapp_link() {
    let mut wizard = CatalogWizard::new();
    wizard.open(WizardSeed {
        service_id: Some("wa"),
        ..Default::default()
    });
    wizard.select_country("KE").unwrap();

    let checkout = wizard
        .checkout(
            &CurrencySelector::new(Currency::Kes),
            AccountStanding::anonymous(),
            "447598691673",
        )
        .unwrap();

    match checkout {
        Checkout::Concierge { url, price } => {
            assert!(url.starts_with("https://wa.me/447598691673?text="));
            assert!(url.contains("Service%3A%20WhatsApp"));
            assert_eq!(price, "KSh 2,500");
        }
        other => panic!("expected concierge checkout, got {:?}", other),
    }

    assert!(find_service("wa").is_some());
    assert!(find_country("KE").is_some());
}
