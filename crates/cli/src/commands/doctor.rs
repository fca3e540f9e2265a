use concierge_core::config::{AppConfig, LoadOptions, MIN_API_KEY_LEN};
use concierge_core::AgentConfigDraft;
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_DOCTOR_FAILED};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { EXIT_DOCTOR_FAILED } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_agent_profile());
            checks.push(check_model_credential(&config));
            checks.push(check_webhook_secret(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(check_agent_profile());
            for name in ["model_credential", "webhook_secret"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let warned = checks.iter().any(|check| check.status == CheckStatus::Warn);
    let (overall_status, summary) = match (failed, warned) {
        (true, _) => (CheckStatus::Fail, "doctor: one or more readiness checks failed"),
        (false, true) => (CheckStatus::Warn, "doctor: ready with warnings"),
        (false, false) => (CheckStatus::Pass, "doctor: all readiness checks passed"),
    };

    DoctorReport { overall_status, summary: summary.to_string(), checks }
}

fn check_agent_profile() -> DoctorCheck {
    let issues = AgentConfigDraft::from_env().issues();
    if issues.is_empty() {
        return DoctorCheck {
            name: "agent_profile",
            status: CheckStatus::Pass,
            details: "agent profile is valid".to_string(),
        };
    }

    let listed = issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
    DoctorCheck {
        name: "agent_profile",
        status: CheckStatus::Warn,
        details: format!("defaults will be substituted: {listed}"),
    }
}

fn check_model_credential(config: &AppConfig) -> DoctorCheck {
    if config.llm.usable_api_key().is_some() {
        return DoctorCheck {
            name: "model_credential",
            status: CheckStatus::Pass,
            details: format!("replies generated via `{}`", config.llm.base_url),
        };
    }

    let details = if config.llm.api_key.is_some() {
        format!("OPENAI_API_KEY is shorter than {MIN_API_KEY_LEN} characters; fallback replies only")
    } else {
        "OPENAI_API_KEY is not set; fallback replies only".to_string()
    };
    DoctorCheck { name: "model_credential", status: CheckStatus::Warn, details }
}

fn check_webhook_secret(config: &AppConfig) -> DoctorCheck {
    if config.webhook.secret.is_some() {
        return DoctorCheck {
            name: "webhook_secret",
            status: CheckStatus::Pass,
            details: "inbound webhook signatures are verified".to_string(),
        };
    }

    let status = if config.server.environment.is_production() {
        CheckStatus::Fail
    } else {
        CheckStatus::Warn
    };
    DoctorCheck {
        name: "webhook_secret",
        status,
        details: format!(
            "WHATSAPP_WEBHOOK_SECRET is not set; webhook requests are accepted unsigned in {}",
            config.server.environment.as_str()
        ),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
