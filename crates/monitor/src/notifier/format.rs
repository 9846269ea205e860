use vigil_common::Severity;

use super::channel::Notification;

pub fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "#2196F3",
        Severity::Warning => "#FFC107",
        Severity::Error => "#F44336",
        Severity::Critical => "#D32F2F",
    }
}

pub fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => ":information_source:",
        Severity::Warning => ":warning:",
        Severity::Error => ":x:",
        Severity::Critical => ":rotating_light:",
    }
}

pub fn email_subject(n: &Notification) -> String {
    format!("[{}] {}", n.severity.label(), n.title)
}

pub fn email_html(n: &Notification) -> String {
    let mut html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
<div style=\"background-color: {color}; color: white; padding: 15px; border-radius: 5px 5px 0 0;\">\
<h2 style=\"margin: 0;\">{title}</h2></div>\
<div style=\"padding: 20px; border: 1px solid #ddd; border-top: none; border-radius: 0 0 5px 5px;\">\
<p>{message}</p>",
        color = severity_color(n.severity),
        title = escape_html(&n.title),
        message = escape_html(&n.message),
    );
    if let Some(meta) = n.metadata_pretty() {
        html.push_str(
            "<div style=\"background-color: #f5f5f5; padding: 10px; border-radius: 5px; margin-top: 15px;\">\
<pre style=\"margin: 0;\">",
        );
        html.push_str(&escape_html(&meta));
        html.push_str("</pre></div>");
    }
    html.push_str("</div></div>");
    html
}

pub fn slack_blocks(n: &Notification) -> serde_json::Value {
    let mut blocks = vec![
        serde_json::json!({
            "type": "header",
            "text": {
                "type": "plain_text",
                "text": format!("{} {}", severity_emoji(n.severity), n.title),
            },
        }),
        serde_json::json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": &n.message },
        }),
    ];
    if let Some(meta) = n.metadata_pretty() {
        blocks.push(serde_json::json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("```{meta}```") },
        }));
    }
    serde_json::Value::Array(blocks)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(severity: Severity) -> Notification {
        Notification::new("Disk <full>", "Volume at 99%", severity)
    }

    #[test]
    fn subject_uses_uppercase_severity() {
        assert_eq!(email_subject(&note(Severity::Critical)), "[CRITICAL] Disk <full>");
    }

    #[test]
    fn html_has_accent_and_escapes() {
        let html = email_html(&note(Severity::Warning));
        assert!(html.contains("#FFC107"));
        assert!(html.contains("Disk &lt;full&gt;"));
        assert!(!html.contains("<pre"));
    }

    #[test]
    fn html_includes_metadata_block() {
        let n = note(Severity::Info).with_metadata(serde_json::json!({"volume": "/data"}));
        let html = email_html(&n);
        assert!(html.contains("<pre style=\"margin: 0;\">"));
        assert!(html.contains("&quot;volume&quot;"));
    }

    #[test]
    fn slack_blocks_shape() {
        let plain = slack_blocks(&note(Severity::Error));
        let blocks = plain.as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["text"]["text"], ":x: Disk <full>");
        assert_eq!(blocks[1]["text"]["text"], "Volume at 99%");

        let with_meta = slack_blocks(&note(Severity::Critical).with_metadata(serde_json::json!({"a": 1})));
        let blocks = with_meta.as_array().unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0]["text"]["text"].as_str().unwrap().starts_with(":rotating_light:"));
        assert!(blocks[2]["text"]["text"].as_str().unwrap().starts_with("```"));
    }
}
