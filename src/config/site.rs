use super::env::{flag_or, non_empty, parse_or, process_env};

/// Public-facing site settings shared by the sitemap, share emails and hit counting.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Scheme and host used to build absolute article URLs, without trailing slash.
    pub site_url: String,
    /// A repeat view from the same client is ignored for this many days.
    pub hit_keep_active_days: i64,
    pub hit_ip_salt: String,
    /// Take the client address from `X-Forwarded-For`. Only safe behind a proxy
    /// that overwrites the header.
    pub trust_forwarded_for: bool,
    pub sitemap_cache_ttl: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost:3000".to_string(),
            hit_keep_active_days: 7,
            hit_ip_salt: "newsroom".to_string(),
            trust_forwarded_for: false,
            sitemap_cache_ttl: 3600,
        }
    }
}

impl SiteConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let site_url = non_empty(&lookup, "SITE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.site_url);

        let hit_keep_active_days = parse_or(
            &lookup,
            "HITCOUNT_KEEP_HIT_ACTIVE_DAYS",
            defaults.hit_keep_active_days,
        )
        .max(0);

        Self {
            site_url,
            hit_keep_active_days,
            hit_ip_salt: lookup("HIT_IP_SALT").unwrap_or(defaults.hit_ip_salt),
            trust_forwarded_for: flag_or(
                &lookup,
                "TRUST_X_FORWARDED_FOR",
                defaults.trust_forwarded_for,
            ),
            sitemap_cache_ttl: parse_or(&lookup, "SITEMAP_CACHE_TTL", defaults.sitemap_cache_ttl),
        }
    }

    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.site_url, path)
    }
}
