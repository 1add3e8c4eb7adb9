//! SSRF guard for crawl targets.
//!
//! Links and image sources found on a scraped page are attacker-controlled
//! input. When the scraper runs on a server, following them to `localhost`
//! or a cloud metadata endpoint would copy internal data into the store.

use ipnet::IpNet;
use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;
use url::{Host, Url};

use crate::error::{SecurityError, SecurityResult};

const SCRAPE_SCHEMES: [&str; 2] = ["http", "https"];

const INTERNAL_HOSTNAMES: [&str; 4] = [
    "localhost",
    "metadata.google.internal",
    "metadata.gke.internal",
    "instance-data",
];

const DNS_LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

const INTERNAL_RANGES: [&str; 9] = [
    "0.0.0.0/8",
    "10.0.0.0/8",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "::1/128",
    "fc00::/7",
    "fe80::/10",
];

/// Decides whether a page or image URL may be fetched.
///
/// Only http(s) is allowed. Internal hostnames (and anything under
/// `.localhost`) are refused, as are literal IPs in loopback, private and
/// link-local ranges. Hosts added with [`allow_host`](Self::allow_host)
/// skip the host and range checks.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    denied_hosts: HashSet<String>,
    denied_ranges: Vec<IpNet>,
    exempt_hosts: HashSet<String>,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlValidator {
    pub fn new() -> Self {
        Self {
            denied_hosts: INTERNAL_HOSTNAMES.iter().map(|h| h.to_string()).collect(),
            denied_ranges: INTERNAL_RANGES.iter().filter_map(|r| r.parse().ok()).collect(),
            exempt_hosts: HashSet::new(),
        }
    }

    /// Let `host` through regardless of the deny lists (a dev server, an intranet site).
    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.exempt_hosts.insert(host.into().to_lowercase());
        self
    }

    /// Refuse one more hostname.
    pub fn block_host(mut self, host: impl Into<String>) -> Self {
        self.denied_hosts.insert(host.into().to_lowercase());
        self
    }

    /// Parse and check a URL string.
    pub fn validate(&self, url: &str) -> SecurityResult<()> {
        self.check(&Url::parse(url.trim())?)
    }

    /// Check an already parsed URL.
    pub fn check(&self, url: &Url) -> SecurityResult<()> {
        if !SCRAPE_SCHEMES.contains(&url.scheme()) {
            return Err(SecurityError::DisallowedScheme(url.scheme().to_string()));
        }

        match url.host() {
            None => Err(SecurityError::NoHost),
            Some(Host::Ipv4(ip)) => self.check_ip(IpAddr::V4(ip)),
            Some(Host::Ipv6(ip)) => self.check_ip(IpAddr::V6(ip)),
            Some(Host::Domain(domain)) => self.check_domain(&domain.to_lowercase()),
        }
    }

    /// [`check`](Self::check), then resolve the host and check every address
    /// it maps to.
    ///
    /// Catches public names pointing at internal addresses. A name that does
    /// not resolve is let through; the fetch itself will fail on it.
    pub async fn check_resolved(&self, url: &Url) -> SecurityResult<()> {
        self.check(url)?;

        let Some(Host::Domain(domain)) = url.host() else {
            return Ok(());
        };
        let domain = domain.to_lowercase();
        if self.exempt_hosts.contains(&domain) {
            return Ok(());
        }

        let port = url.port_or_known_default().unwrap_or(80);
        let lookup = tokio::net::lookup_host((domain.as_str(), port));
        let result = match tokio::time::timeout(DNS_LOOKUP_TIMEOUT, lookup).await {
            Ok(Ok(addrs)) => self.check_resolved_addrs(&domain, addrs.map(|addr| addr.ip())),
            Ok(Err(e)) => {
                debug!(host = %domain, error = %e, "Host did not resolve");
                Ok(())
            }
            Err(_) => {
                debug!(host = %domain, "DNS lookup timed out");
                Ok(())
            }
        };
        result
    }

    fn check_resolved_addrs(
        &self,
        domain: &str,
        addrs: impl IntoIterator<Item = IpAddr>,
    ) -> SecurityResult<()> {
        for ip in addrs {
            if self.denied_ranges.iter().any(|range| range.contains(&ip)) {
                return Err(SecurityError::BlockedCidr(format!("{} resolved to {}", domain, ip)));
            }
        }
        Ok(())
    }

    fn check_domain(&self, domain: &str) -> SecurityResult<()> {
        if self.exempt_hosts.contains(domain) {
            return Ok(());
        }
        if self.denied_hosts.contains(domain) || domain.ends_with(".localhost") {
            return Err(SecurityError::BlockedHost(domain.to_string()));
        }
        Ok(())
    }

    fn check_ip(&self, ip: IpAddr) -> SecurityResult<()> {
        let rendered = ip.to_string();
        if self.exempt_hosts.contains(&rendered) {
            return Ok(());
        }
        match self.denied_ranges.iter().find(|range| range.contains(&ip)) {
            Some(_) => Err(SecurityError::BlockedCidr(rendered)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_targets_refused() {
        let validator = UrlValidator::new();
        for url in [
            "http://localhost:3000/admin",
            "http://dashboard.localhost/",
            "http://127.0.0.1/",
            "http://[::1]:8080/",
            "http://10.1.2.3/intranet",
            "http://172.20.0.5/",
            "http://192.168.0.1/router",
            "http://169.254.169.254/latest/meta-data",
            "http://metadata.google.internal/computeMetadata/v1/",
        ] {
            assert!(validator.validate(url).is_err(), "{} was allowed", url);
        }
    }

    #[test]
    fn test_refusal_reasons() {
        let validator = UrlValidator::new();
        assert!(matches!(
            validator.validate("file:///etc/hosts"),
            Err(SecurityError::DisallowedScheme(s)) if s == "file"
        ));
        assert!(matches!(
            validator.validate("http://10.0.0.1/"),
            Err(SecurityError::BlockedCidr(_))
        ));
        assert!(matches!(
            validator.validate("https://LOCALHOST/"),
            Err(SecurityError::BlockedHost(h)) if h == "localhost"
        ));
        assert!(matches!(validator.validate("no scheme"), Err(SecurityError::UrlParse(_))));
    }

    #[test]
    fn test_public_sites_and_images_allowed() {
        let validator = UrlValidator::new();
        assert!(validator.validate("https://bakery.example/menu").is_ok());
        assert!(validator.validate("https://cdn.example.net/img/banner.png").is_ok());
        assert!(validator.validate("http://93.184.216.34/").is_ok());
    }

    #[test]
    fn test_exemptions_and_extra_blocks() {
        let validator = UrlValidator::new()
            .allow_host("LocalHost")
            .allow_host("127.0.0.1")
            .block_host("tracker.example");
        assert!(validator.validate("http://localhost/").is_ok());
        assert!(validator.validate("http://127.0.0.1:8080/").is_ok());
        assert!(validator.validate("https://tracker.example/pixel.gif").is_err());
    }

    #[test]
    fn test_names_resolving_inside_are_refused() {
        let validator = UrlValidator::new();
        let inside: [IpAddr; 2] = ["93.184.216.34".parse().unwrap(), "10.0.0.7".parse().unwrap()];
        assert!(matches!(
            validator.check_resolved_addrs("rebind.example", inside),
            Err(SecurityError::BlockedCidr(reason)) if reason == "rebind.example resolved to 10.0.0.7"
        ));

        let outside: [IpAddr; 1] = ["93.184.216.34".parse().unwrap()];
        assert!(validator.check_resolved_addrs("bakery.example", outside).is_ok());
    }

    #[tokio::test]
    async fn test_resolved_check_keeps_static_rules() {
        let validator = UrlValidator::new();
        let metadata = Url::parse("http://169.254.169.254/latest/meta-data/").unwrap();
        assert!(validator.check_resolved(&metadata).await.is_err());

        let local = Url::parse("http://localhost:8080/").unwrap();
        assert!(validator.check_resolved(&local).await.is_err());
        assert!(validator.clone().allow_host("localhost").check_resolved(&local).await.is_ok());
    }
}
