// ABOUTME: HTTP readiness and load-validation probes with injected retry policy.
// ABOUTME: Gates stage transitions; no probe loop may block indefinitely.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::Empty;
use hyper::header::HOST;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::TcpStream;

/// Bounded retry timing, decoupled from the probe control logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryPolicy {
    pub attempts: u32,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }
}

/// Issues plain-HTTP probes against instance addresses and the public
/// entrypoint. Success is any non-error response status.
#[derive(Debug, Clone)]
pub struct HealthProber {
    probe_timeout: Duration,
}

impl Default for HealthProber {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(5),
        }
    }
}

impl HealthProber {
    pub fn new(probe_timeout: Duration) -> Self {
        Self { probe_timeout }
    }

    /// Readiness gate used before any traffic exposure: probe `url` up to
    /// `policy.attempts` times, sleeping `policy.interval` between failures.
    /// Returns true on the first success.
    pub async fn wait_until_healthy(&self, url: &str, policy: &RetryPolicy) -> bool {
        for attempt in 1..=policy.attempts {
            if self.probe_once(url).await {
                tracing::debug!("probe of {} succeeded on attempt {}", url, attempt);
                return true;
            }
            if attempt < policy.attempts {
                tokio::time::sleep(policy.interval).await;
            }
        }
        false
    }

    /// Canary gate: `checks` sequential probes with `interval` between
    /// successes. A single failure aborts immediately; the canary window does
    /// not retry or average.
    pub async fn validate_under_load(&self, url: &str, checks: u32, interval: Duration) -> bool {
        for check in 1..=checks {
            if !self.probe_once(url).await {
                tracing::debug!("load validation of {} failed on check {}", url, check);
                return false;
            }
            if check < checks {
                tokio::time::sleep(interval).await;
            }
        }
        true
    }

    /// One bounded probe. Connection errors, timeouts, and error statuses all
    /// count as a failed probe, never as a hard error.
    pub async fn probe_once(&self, url: &str) -> bool {
        match tokio::time::timeout(self.probe_timeout, request(url)).await {
            Ok(Ok(status)) => !status.is_client_error() && !status.is_server_error(),
            Ok(Err(e)) => {
                tracing::debug!("probe of {} failed: {}", url, e);
                false
            }
            Err(_) => {
                tracing::debug!("probe of {} timed out", url);
                false
            }
        }
    }
}

/// Whether `url` is a target the prober can reach. Probes are plain HTTP:
/// TLS terminates at the proxy, and instance addresses are raw ip:port.
/// Callers validating configuration should reject anything else up front.
pub fn is_probe_url(url: &str) -> bool {
    Target::parse(url).is_some()
}

async fn request(url: &str) -> Result<hyper::StatusCode, ProbeFailure> {
    let target = Target::parse(url).ok_or_else(|| ProbeFailure(format!("unsupported url: {url}")))?;

    let stream = TcpStream::connect((target.host.as_str(), target.port))
        .await
        .map_err(|e| ProbeFailure(e.to_string()))?;
    let io = TokioIo::new(stream);

    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| ProbeFailure(e.to_string()))?;
    tokio::spawn(async move {
        // Connection errors surface through the request future.
        let _ = conn.await;
    });

    let req = hyper::Request::builder()
        .method("GET")
        .uri(&target.path)
        .header(HOST, target.authority.as_str())
        .body(Empty::<Bytes>::new())
        .map_err(|e| ProbeFailure(e.to_string()))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| ProbeFailure(e.to_string()))?;
    Ok(resp.status())
}

#[derive(Debug)]
struct ProbeFailure(String);

impl std::fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Target {
    host: String,
    port: u16,
    path: String,
    authority: String,
}

impl Target {
    /// Minimal parser for `http://host[:port][/path]` probe targets.
    fn parse(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("http://")?;
        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };
        if authority.is_empty() {
            return None;
        }
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (host, port.parse().ok()?),
            None => (authority, 80),
        };
        Some(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
            authority: authority.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_host() {
        let t = Target::parse("http://10.0.0.5").unwrap();
        assert_eq!(t.host, "10.0.0.5");
        assert_eq!(t.port, 80);
        assert_eq!(t.path, "/");
    }

    #[test]
    fn parses_port_and_path() {
        let t = Target::parse("http://10.0.0.5:8080/health").unwrap();
        assert_eq!(t.port, 8080);
        assert_eq!(t.path, "/health");
        assert_eq!(t.authority, "10.0.0.5:8080");
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(Target::parse("ftp://example.com").is_none());
        assert!(Target::parse("example.com").is_none());
    }

    #[test]
    fn https_targets_are_unsupported() {
        assert!(!is_probe_url("https://app.example.com/"));
        assert!(is_probe_url("http://10.0.0.5:8080/health"));
    }
}
