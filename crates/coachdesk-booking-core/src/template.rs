//! Confirmation email templates
//!
//! Templates use `{{name}}` placeholders. Persisted templates override the
//! built-in defaults returned by [`default_template`].

use std::collections::HashMap;

use coachdesk_db::EmailTemplateRow;

/// Key for the coaching booking confirmation
pub const BOOKING_CONFIRMATION: &str = "booking_confirmation";
/// Key for the digital product purchase confirmation
pub const PURCHASE_CONFIRMATION: &str = "purchase_confirmation";

/// Email template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub key: String,
    pub subject: String,
    pub html_body: String,
}

impl From<EmailTemplateRow> for EmailTemplate {
    fn from(row: EmailTemplateRow) -> Self {
        Self {
            key: row.key,
            subject: row.subject,
            html_body: row.html_body,
        }
    }
}

const BOOKING_BODY: &str = r#"<h1>Your coaching session is booked</h1>
<p>Thank you for your booking of <strong>{{product_name}}</strong>.</p>
<table>
  <tr><td>Date</td><td>{{booking_date}}</td></tr>
  <tr><td>Time</td><td>{{booking_time}} ({{timezone}})</td></tr>
  <tr><td>Duration</td><td>{{duration_minutes}} minutes</td></tr>
  <tr><td>Amount</td><td>{{amount}}</td></tr>
</table>
<p>Create an account to manage your bookings: <a href="{{link_url}}">{{link_url}}</a></p>
"#;

const PURCHASE_BODY: &str = r#"<h1>Thank you for your purchase</h1>
<p>Your order of <strong>{{product_name}}</strong> ({{amount}}) is complete.</p>
<p>Create an account to access your downloads: <a href="{{link_url}}">{{link_url}}</a></p>
"#;

/// Built-in template for a key
pub fn default_template(key: &str) -> Option<EmailTemplate> {
    let (subject, body) = match key {
        BOOKING_CONFIRMATION => (
            "Booking confirmed: {{product_name}} on {{booking_date}}",
            BOOKING_BODY,
        ),
        PURCHASE_CONFIRMATION => ("Your purchase: {{product_name}}", PURCHASE_BODY),
        _ => return None,
    };

    Some(EmailTemplate {
        key: key.to_string(),
        subject: subject.to_string(),
        html_body: body.to_string(),
    })
}

/// Substitute placeholders verbatim. Unknown placeholders are left in place.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    substitute(template, vars, |v| v.to_string())
}

/// Substitute placeholders with HTML-escaped values
pub fn render_html(template: &str, vars: &HashMap<&str, String>) -> String {
    substitute(template, vars, escape_html)
}

fn substitute(
    template: &str,
    vars: &HashMap<&str, String>,
    encode: impl Fn(&str) -> String,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}") {
            Some(close) => {
                let name = after[..close].trim();
                match vars.get(name) {
                    Some(value) => out.push_str(&encode(value)),
                    None => out.push_str(&rest[open..open + 2 + close + 2]),
                }
                rest = &after[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
