use concierge_core::{AgentConfig, AgentReplyInput, ServiceDefinition};

pub const MAX_REPLY_CHARS: usize = 1200;

pub fn build_system_prompt(config: &AgentConfig) -> String {
    let services = config
        .services
        .iter()
        .enumerate()
        .map(|(index, service)| render_service(index + 1, service))
        .collect::<Vec<_>>()
        .join("\n\n");

    [
        format!("You are \"{}\" WhatsApp agent.", config.company_name),
        format!("About the company: {}", config.company_description),
        format!(
            "Primary mission: respond to inbound client WhatsApp messages with a {} tone.",
            config.tone
        ),
        format!("Business hours: {}.", config.business_hours),
        "If the client asks for something outside of these services or it's outside business hours, use the fallback messaging.".to_string(),
        format!(
            "Escalation email: {}.",
            config.escalation_email.as_deref().unwrap_or("not provided")
        ),
        "When answering, always do the following:".to_string(),
        "- Greet clients by name if they provide it or if it's available in metadata.".to_string(),
        "- Summarize the client's request in one sentence to confirm understanding.".to_string(),
        "- Present the most relevant service with specifics from the highlights.".to_string(),
        "- Offer a clear next step (booking a call, requesting details, etc.).".to_string(),
        format!(
            "- Keep replies under {MAX_REPLY_CHARS} characters. Use short paragraphs and bullet points when helpful."
        ),
        "- If escalation is required, clearly state that a human teammate will follow up, and mention the escalation email if present.".to_string(),
        "- Never invent prices or policies that were not provided.".to_string(),
        "- If unsure, fall back to the generic fallback message.".to_string(),
        String::new(),
        "Service catalog:".to_string(),
        services,
    ]
    .join("\n")
}

pub fn build_user_prompt(input: &AgentReplyInput, config: &AgentConfig) -> String {
    let mut lines = vec![
        format!("Incoming message body:\n{}", input.body),
        format!("Client phone number: {}", input.from),
    ];

    if let Some(timestamp) = input.timestamp.as_deref().filter(|value| !value.trim().is_empty()) {
        lines.push(format!("Received at: {timestamp}"));
    }

    lines.extend([
        "Return a JSON object with the following shape:".to_string(),
        REPLY_SHAPE.to_string(),
        "Use the fallback messages when appropriate:".to_string(),
        format!("- Generic fallback: {}", config.fallbacks.generic),
        format!("- Outside hours fallback: {}", config.fallbacks.outside_hours),
        format!("- Escalation fallback: {}", config.fallbacks.escalation),
    ]);

    lines.join("\n")
}

const REPLY_SHAPE: &str = r#"{
  "reply": string,
  "classification": "lead" | "support" | "pricing" | "off-hours" | "not-understood",
  "confidence": number between 0 and 1,
  "escalated": boolean
}"#;

fn render_service(position: usize, service: &ServiceDefinition) -> String {
    let mut rendered =
        format!("{position}. {}\nSummary: {}", service.name, service.description);
    if !service.response_highlights.is_empty() {
        rendered.push_str("\nHighlights:\n- ");
        rendered.push_str(&service.response_highlights.join("\n- "));
    }
    rendered
}
