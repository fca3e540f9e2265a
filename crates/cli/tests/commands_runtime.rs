use std::env;
use std::sync::{Mutex, OnceLock};

use concierge_cli::commands::{config, doctor, simulate};
use concierge_core::agent_config::AGENT_ENV_KEYS;
use concierge_core::config::RUNTIME_ENV_KEYS;
use serde_json::Value;

#[test]
fn simulate_without_credential_returns_fallback_reply() {
    with_env(&[], || {
        let result = simulate::run("  Do you do onboarding?  ", simulate::DEFAULT_SENDER);
        assert_eq!(result.exit_code, 0, "expected simulation to succeed");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "simulate");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["model_mode"], "fallback_only");
        assert_eq!(payload["reply"]["classification"], "not-understood");
        assert_eq!(payload["reply"]["escalated"], true);
        assert!(payload["reply"]["reply"]
            .as_str()
            .unwrap_or_default()
            .ends_with("(Automated reply to whatsapp:+15555550123)"));
    });
}

#[test]
fn simulate_uses_configured_fallback_text() {
    with_env(&[("AGENT_FALLBACK_GENERIC", "A teammate will reply soon.")], || {
        let result = simulate::run("hi", "whatsapp:+447700900000");

        let payload = parse_payload(&result.output);
        assert_eq!(
            payload["reply"]["reply"],
            "A teammate will reply soon.\n\n(Automated reply to whatsapp:+447700900000)"
        );
    });
}

#[test]
fn simulate_rejects_blank_message() {
    with_env(&[], || {
        let result = simulate::run("   ", simulate::DEFAULT_SENDER);
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
        assert_eq!(payload["message"], "Message is required");
    });
}

#[test]
fn simulate_reports_invalid_runtime_config() {
    with_env(&[("CONCIERGE_ENV", "staging")], || {
        let result = simulate::run("hello", simulate::DEFAULT_SENDER);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn config_redacts_secrets_and_attributes_sources() {
    with_env(
        &[
            ("OPENAI_API_KEY", "sk-live-abcdef123456"),
            ("WHATSAPP_WEBHOOK_SECRET", "0123456789abcdef"),
            ("CONCIERGE_PORT", "8080"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);
            assert!(!result.output.contains("abcdef123456"));
            assert!(!result.output.contains("0123456789abcdef"));

            let payload = parse_payload(&result.output);
            let entry = |key: &str| {
                payload["runtime"]
                    .as_array()
                    .and_then(|entries| entries.iter().find(|entry| entry["key"] == key))
                    .cloned()
                    .unwrap_or(Value::Null)
            };

            assert_eq!(entry("llm.api_key")["value"], "sk-***");
            assert_eq!(entry("webhook.secret")["value"], "<redacted>");
            assert_eq!(entry("server.port")["value"], "8080");
            assert_eq!(entry("server.port")["source"], "env (CONCIERGE_PORT)");
            assert_eq!(entry("server.bind_address")["source"], "default");
        },
    );
}

#[test]
fn config_does_not_attribute_blank_env_values() {
    with_env(&[("CONCIERGE_PORT", ""), ("OPENAI_BASE_URL", "   ")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let entry = |key: &str| {
            payload["runtime"]
                .as_array()
                .and_then(|entries| entries.iter().find(|entry| entry["key"] == key))
                .cloned()
                .unwrap_or(Value::Null)
        };

        assert_eq!(entry("server.port")["value"], "3000");
        assert_eq!(entry("server.port")["source"], "default");
        assert_eq!(entry("llm.base_url")["source"], "default");
    });
}

#[test]
fn config_lists_agent_issues_and_substituted_profile() {
    with_env(
        &[
            ("AGENT_ESCALATION_EMAIL", "not-an-email"),
            ("AGENT_TEMPERATURE", "3.5"),
            ("COMPANY_SERVICES", "{not json"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);

            let payload = parse_payload(&result.output);
            let issues = payload["agent_issues"].as_array().cloned().unwrap_or_default();
            assert_eq!(issues.len(), 2, "unexpected issues: {issues:?}");
            assert!(payload["agent"]["escalationEmail"].is_null());
            assert_eq!(payload["agent"]["temperature"], 2.0);
            assert_eq!(payload["agent"]["services"][0]["name"], "General Consultation");
            assert_eq!(payload["agent"]["services"][1]["name"], "Full-Service Engagement");
        },
    );
}

#[test]
fn doctor_warns_in_development_without_credentials() {
    with_env(&[], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "warn");
        assert_eq!(check_status(&payload, "config_validation"), "pass");
        assert_eq!(check_status(&payload, "agent_profile"), "pass");
        assert_eq!(check_status(&payload, "model_credential"), "warn");
        assert_eq!(check_status(&payload, "webhook_secret"), "warn");
    });
}

#[test]
fn doctor_passes_when_fully_configured() {
    with_env(
        &[
            ("OPENAI_API_KEY", "sk-live-abcdef123456"),
            ("WHATSAPP_WEBHOOK_SECRET", "twilio-auth-token"),
            ("CONCIERGE_ENV", "production"),
        ],
        || {
            let result = doctor::run(true);
            assert_eq!(result.exit_code, 0);
            assert_eq!(parse_payload(&result.output)["overall_status"], "pass");
        },
    );
}

#[test]
fn doctor_fails_in_production_without_webhook_secret() {
    with_env(&[("CONCIERGE_ENV", "production")], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 5);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] webhook_secret:"));
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[("CONCIERGE_LLM_TIMEOUT_SECS", "0")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(check_status(&payload, "config_validation"), "fail");
        assert_eq!(check_status(&payload, "model_credential"), "skipped");
        assert_eq!(check_status(&payload, "webhook_secret"), "skipped");
    });
}

fn check_status(payload: &Value, name: &str) -> String {
    payload["checks"]
        .as_array()
        .and_then(|checks| checks.iter().find(|check| check["name"] == name))
        .and_then(|check| check["status"].as_str())
        .unwrap_or_default()
        .to_string()
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys: Vec<&str> = RUNTIME_ENV_KEYS.iter().chain(AGENT_ENV_KEYS.iter()).copied().collect();

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
