use super::env::{non_empty, parse_or, process_env};

/// SMTP relay used for "email this article" shares.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
}

impl EmailConfig {
    /// `None` unless host, username and password are all set; shares are then
    /// accepted but not delivered.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let smtp_host = non_empty(&lookup, "SMTP_HOST")?;
        let smtp_username = non_empty(&lookup, "SMTP_USERNAME")?;
        let smtp_password = lookup("SMTP_PASSWORD")?;
        let smtp_port = parse_or(&lookup, "SMTP_PORT", 587u16);

        let from_address = non_empty(&lookup, "SMTP_FROM").unwrap_or_else(|| {
            default_sender(&smtp_username, non_empty(&lookup, "SITE_URL").as_deref())
        });

        Some(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_address,
        })
    }
}

/// Sender when `SMTP_FROM` is unset: the SMTP login if it is an address,
/// otherwise `noreply@` the site's host.
fn default_sender(smtp_username: &str, site_url: Option<&str>) -> String {
    if smtp_username.contains('@') {
        return format!("Newsroom <{smtp_username}>");
    }
    let host = site_url
        .map(|url| url.split("://").last().unwrap_or(url))
        .and_then(|rest| rest.split(['/', ':']).next())
        .filter(|host| !host.is_empty())
        .unwrap_or("localhost");
    format!("Newsroom <noreply@{host}>")
}
