//! End-to-end dispatch over the real channel registry against mock providers.

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::BALANCE_REPORT;
use multipush::config::Config;
use multipush::formatting::{TableMode, TelegramFormatter, TextFormatter};
use multipush::{ChannelRegistry, Dispatcher, FormatHint};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHANNEL_ORDER: [&str; 7] = [
    "Email",
    "PushPlus",
    "Server Push",
    "DingTalk",
    "Feishu",
    "WeChat Work",
    "Telegram",
];

#[tokio::test]
async fn test_dispatch_isolates_every_channel() {
    // 1. Mock providers: two healthy, one failing, one reporting an API error.
    let providers = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pushplus/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "msg": "ok"})))
        .expect(1)
        .mount(&providers)
        .await;
    Mock::given(method("POST"))
        .and(path("/dingtalk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errcode": 0, "errmsg": "ok"})))
        .expect(1)
        .mount(&providers)
        .await;
    Mock::given(method("POST"))
        .and(path("/feishu"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&providers)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/sendMessage"))
        .and(body_partial_json(json!({ "chat_id": "42", "parse_mode": "HTML" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "bad request",
        })))
        .expect(1)
        .mount(&providers)
        .await;

    // Unconfigured channels must never reach their endpoint.
    let unconfigured = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&unconfigured)
        .await;

    // 2. Configuration: Email, Server Push and WeChat Work left unset.
    let mut config = Config::default();
    config.pushplus.token = Some("pp".into());
    config.pushplus.endpoint = format!("{}/pushplus/send", providers.uri());
    config.serverchan.endpoint = unconfigured.uri();
    config.dingtalk.webhook = Some(format!("{}/dingtalk", providers.uri()));
    config.feishu.webhook = Some(format!("{}/feishu", providers.uri()));
    config.telegram.bot_token = Some("123:ABC".into());
    config.telegram.chat_id = Some("42".into());
    config.telegram.api_base = providers.uri();
    config.http.timeout_seconds = 5;

    let registry = ChannelRegistry::from_config(&config).unwrap();
    let dispatcher = Dispatcher::new(registry, false);

    // 3. Dispatch once.
    let outcomes = dispatcher
        .push("Check-in report", BALANCE_REPORT, FormatHint::Text)
        .await;

    // 4. One outcome per channel, in registry order.
    let names: Vec<&str> = outcomes.iter().map(|o| o.channel_name.as_str()).collect();
    assert_eq!(names, CHANNEL_ORDER);

    let succeeded: Vec<bool> = outcomes.iter().map(|o| o.succeeded).collect();
    assert_eq!(succeeded, vec![false, true, false, true, false, false, false]);

    assert_eq!(
        outcomes[0].error_message.as_deref(),
        Some("ConfigurationMissing: Email configuration not set")
    );
    assert_eq!(
        outcomes[2].error_message.as_deref(),
        Some("ConfigurationMissing: Server Push key not configured")
    );
    assert_eq!(
        outcomes[4].error_message.as_deref(),
        Some("ProtocolFailure: Feishu HTTP 503. body=maintenance")
    );
    assert_eq!(
        outcomes[5].error_message.as_deref(),
        Some("ConfigurationMissing: WeChat Work Webhook not configured")
    );
    assert_eq!(
        outcomes[6].error_message.as_deref(),
        Some("ApplicationFailure: Telegram API error: error_code=400, description=bad request")
    );
    assert_eq!(
        outcomes[6].to_string(),
        "[Telegram]: Message push failed! Reason: ApplicationFailure: Telegram API error: error_code=400, description=bad request"
    );
}

#[tokio::test]
async fn test_telegram_receives_tabulated_report() {
    let providers = MockServer::start().await;
    let expected_text = TelegramFormatter::new(TableMode::Auto).format("Check-in report", BALANCE_REPORT);

    Mock::given(method("POST"))
        .and(path("/botT0KEN/sendMessage"))
        .and(body_partial_json(json!({ "text": expected_text })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&providers)
        .await;

    let mut config = Config::default();
    config.telegram.bot_token = Some("T0KEN".into());
    config.telegram.chat_id = Some("7".into());
    config.telegram.api_base = providers.uri();

    let dispatcher = Dispatcher::new(ChannelRegistry::from_config(&config).unwrap(), false);
    let outcomes = dispatcher
        .push("Check-in report", BALANCE_REPORT, FormatHint::Text)
        .await;

    assert_eq!(outcomes.len(), 7);
    assert!(outcomes[6].succeeded, "telegram failed: {:?}", outcomes[6]);
    assert!(outcomes[..6].iter().all(|o| !o.succeeded));

    assert_eq!(
        expected_text,
        "<b>Check-in report</b>\n\n[TIME] 2025-01-01 08:00\nsome note\n\n<pre>帳號      餘額($)  已用($)\nAcct-A  10.00   2.00\nAcct-B      -      -</pre>"
    );
}
