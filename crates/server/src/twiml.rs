use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Escapes the five XML-reserved characters. Everything else passes through.
pub fn escape_for_twiml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn message_document(reply: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Response><Message>{}</Message></Response>"#,
        escape_for_twiml(reply)
    )
}

pub fn message_response(reply: &str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, XML_CONTENT_TYPE), (header::CACHE_CONTROL, "no-store")],
        message_document(reply),
    )
        .into_response()
}
