#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{clear_channel_env, config_file, path_of};
use multipush::cli::Cli;
use multipush::config::Config;
use multipush::formatting::TableMode;
use serial_test::serial;

fn cli_with(path: std::path::PathBuf) -> Cli {
    Cli {
        title: "T".into(),
        config: Some(path),
        ..Default::default()
    }
}

#[test]
#[serial]
fn test_load_full_valid_config() {
    clear_channel_env();
    let toml_content = r#"
        log_level = "debug"
        debug = true
        [http]
        timeout_seconds = 10
        [email]
        user = "bot@example.com"
        password = "secret"
        to = "ops@example.com"
        smtp_server = "smtp.internal"
        sender_name = "Status Bot"
        [pushplus]
        token = "pp-token"
        endpoint = "http://pushplus.local/send"
        [serverchan]
        send_key = "SCT123"
        [dingtalk]
        webhook = "https://oapi.dingtalk.com/robot/send?access_token=abc"
        [feishu]
        webhook = "https://open.feishu.cn/open-apis/bot/v2/hook/abc"
        [wecom]
        webhook = "https://qyapi.weixin.qq.com/cgi-bin/webhook/send?key=abc"
        [telegram]
        bot_token = "123:ABC"
        chat_id = -100200300
        format = "table"
        api_base = "http://telegram.local"
    "#;
    let file = config_file(toml_content);

    let config = Config::load(&cli_with(path_of(&file))).unwrap();

    assert_eq!(config.log_level, "debug");
    assert!(config.debug);
    assert_eq!(config.http.timeout_seconds, 10);
    assert_eq!(config.email.user.as_deref(), Some("bot@example.com"));
    assert_eq!(config.email.password.as_deref(), Some("secret"));
    assert_eq!(config.email.to.as_deref(), Some("ops@example.com"));
    assert_eq!(config.email.smtp_server.as_deref(), Some("smtp.internal"));
    assert_eq!(config.email.sender_name, "Status Bot");
    assert_eq!(config.pushplus.token.as_deref(), Some("pp-token"));
    assert_eq!(config.pushplus.endpoint, "http://pushplus.local/send");
    assert_eq!(config.serverchan.send_key.as_deref(), Some("SCT123"));
    // Not in the toml, so it should be the default value
    assert_eq!(config.serverchan.endpoint, "https://sctapi.ftqq.com");
    assert!(config.dingtalk.webhook.is_some());
    assert!(config.feishu.webhook.is_some());
    assert!(config.wecom.webhook.is_some());
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    // A numeric chat id stays text.
    assert_eq!(config.telegram.chat_id.as_deref(), Some("-100200300"));
    assert_eq!(config.telegram.format, TableMode::Table);
    assert_eq!(config.telegram.api_base, "http://telegram.local");
}

#[test]
#[serial]
fn test_load_default_values() {
    clear_channel_env();
    let file = config_file("");

    let config = Config::load(&cli_with(path_of(&file))).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn test_provider_environment_variables() {
    clear_channel_env();
    std::env::set_var("TELEGRAM_BOT_TOKEN", "999:XYZ");
    std::env::set_var("TELEGRAM_CHAT_ID", "-100123");
    std::env::set_var("TELEGRAM_FORMAT", "PLAIN");
    std::env::set_var("DINGDING_WEBHOOK", "https://oapi.dingtalk.com/robot/send?access_token=t");
    std::env::set_var("SERVERPUSHKEY", "SCTKEY");
    std::env::set_var("NOTIFY_DEBUG", "True");
    std::env::set_var("NOTIFY_HTTP__TIMEOUT_SECONDS", "5");
    let file = config_file("[email]\nuser = \"  \"\npassword = \"from-file\"\n");

    let config = Config::load(&cli_with(path_of(&file)));
    clear_channel_env();
    let config = config.unwrap();

    assert_eq!(config.telegram.bot_token.as_deref(), Some("999:XYZ"));
    assert_eq!(config.telegram.chat_id.as_deref(), Some("-100123"));
    assert_eq!(config.telegram.format, TableMode::Plain);
    assert_eq!(
        config.dingtalk.webhook.as_deref(),
        Some("https://oapi.dingtalk.com/robot/send?access_token=t")
    );
    assert_eq!(config.serverchan.send_key.as_deref(), Some("SCTKEY"));
    // Blank values mean "unset".
    assert!(config.email.user.is_none());
    assert_eq!(config.email.password.as_deref(), Some("from-file"));
    assert!(config.debug);
    assert_eq!(config.http.timeout_seconds, 5);
}

#[test]
#[serial]
fn test_unknown_telegram_format_means_auto() {
    clear_channel_env();
    std::env::set_var("TELEGRAM_FORMAT", "fancy");
    let file = config_file("");

    let config = Config::load(&cli_with(path_of(&file)));
    clear_channel_env();

    assert_eq!(config.unwrap().telegram.format, TableMode::Auto);
}

#[test]
#[serial]
fn test_cli_flags_override_environment() {
    clear_channel_env();
    std::env::set_var("TELEGRAM_FORMAT", "table");
    std::env::set_var("NOTIFY_LOG_LEVEL", "warn");
    let file = config_file("");

    let cli = Cli {
        debug: true,
        telegram_format: Some("plain".into()),
        log_level: Some("trace".into()),
        ..cli_with(path_of(&file))
    };
    let config = Config::load(&cli);
    clear_channel_env();
    let config = config.unwrap();

    assert!(config.debug);
    assert_eq!(config.telegram.format, TableMode::Plain);
    assert_eq!(config.log_level, "trace");
}

#[test]
#[serial]
fn test_invalid_value_type() {
    clear_channel_env();
    let file = config_file("[http]\ntimeout_seconds = \"soon\"\n");

    let config = Config::load(&cli_with(path_of(&file)));
    assert!(config.is_err());
}
