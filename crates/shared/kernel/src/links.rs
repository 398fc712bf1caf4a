//! Outbound links to WhatsApp, Instagram and e-mail.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use utoipa::ToSchema;

/// Ready-to-open contact links of a listing or professional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContactLinks {
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

/// `https://wa.me/<digits>`, with `?text=` when a message is given.
#[must_use]
pub fn whatsapp_link(phone: &str, message: Option<&str>) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let mut link = format!("https://wa.me/{digits}");
    if let Some(text) = message.map(str::trim).filter(|t| !t.is_empty()) {
        link.push_str("?text=");
        link.push_str(&encode(text));
    }
    Some(link)
}

/// Normalises `@name`, `name` or a profile URL to `https://instagram.com/<name>`.
#[must_use]
pub fn instagram_link(handle: &str) -> Option<String> {
    instagram_handle(handle).map(|name| format!("https://instagram.com/{name}"))
}

/// Extracts the account name from the accepted Instagram spellings.
#[must_use]
pub fn instagram_handle(raw: &str) -> Option<String> {
    let mut rest = raw.trim();
    for prefix in ["https://", "http://"] {
        rest = rest.strip_prefix(prefix).unwrap_or(rest);
    }
    rest = rest.strip_prefix("www.").unwrap_or(rest);
    if let Some(path) = rest.strip_prefix("instagram.com/") {
        rest = path;
    } else if rest.contains('/') {
        return None;
    }

    let name = rest.trim_start_matches('@').split(['/', '?', '#']).next().unwrap_or_default();
    let valid = (1..=30).contains(&name.len())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_'));
    valid.then(|| name.to_owned())
}

/// `mailto:<email>`, with `?subject=` when given.
#[must_use]
pub fn mailto_link(email: &str, subject: Option<&str>) -> Option<String> {
    let email = email.trim();
    if email.is_empty() {
        return None;
    }
    let mut link = format!("mailto:{email}");
    if let Some(subject) = subject.map(str::trim).filter(|s| !s.is_empty()) {
        link.push_str("?subject=");
        link.push_str(&encode(subject));
    }
    Some(link)
}

// Spaces become %20; a literal '+' is already escaped as %2B by the serializer.
fn encode(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes()).collect::<String>().replace('+', "%20")
}
