use crate::error::{PortalError, Result};
use std::fmt;
use std::str::FromStr;

/// Telemetry endpoint of the form `scheme://public_key@host[:port][/prefix]/project_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    scheme: String,
    public_key: String,
    host: String,
    path_prefix: String,
    project_id: String,
}

impl Dsn {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (scheme, rest) = raw
            .split_once("://")
            .ok_or_else(|| malformed(raw, "missing scheme"))?;
        if scheme != "http" && scheme != "https" {
            return Err(malformed(raw, "scheme must be http or https"));
        }

        let (userinfo, location) = rest
            .split_once('@')
            .ok_or_else(|| malformed(raw, "missing public key"))?;
        // A legacy secret may follow the key after ':'
        let public_key = userinfo.split(':').next().unwrap_or_default();
        if public_key.is_empty() {
            return Err(malformed(raw, "missing public key"));
        }

        let (host, path) = location
            .split_once('/')
            .ok_or_else(|| malformed(raw, "missing project id"))?;
        if host.is_empty() {
            return Err(malformed(raw, "missing host"));
        }

        let path = path.trim_end_matches('/');
        let (prefix, project_id) = match path.rsplit_once('/') {
            Some((prefix, id)) => (format!("/{}", prefix), id),
            None => (String::new(), path),
        };
        if project_id.is_empty() || !project_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(malformed(raw, "invalid project id"));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            public_key: public_key.to_string(),
            host: host.to_string(),
            path_prefix: prefix,
            project_id: project_id.to_string(),
        })
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Event ingestion endpoint
    pub fn store_url(&self) -> String {
        format!(
            "{}://{}{}/api/{}/store/",
            self.scheme, self.host, self.path_prefix, self.project_id
        )
    }
}

impl FromStr for Dsn {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}@{}{}/{}",
            self.scheme, self.public_key, self.host, self.path_prefix, self.project_id
        )
    }
}

fn malformed(raw: &str, reason: &str) -> PortalError {
    PortalError::config(format!("Malformed telemetry DSN '{}': {}", raw, reason))
}
