use chrono_tz::Tz;

pub const DEFAULT_SERVICE_URL: &str = "https://ws.nubix.no/2011/NubixService.svc";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Oslo;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub nubix_username: String,
    pub nubix_password: String,
    /// GLN of the supplier issuing the lookups.
    pub nubix_gln: String,
    pub nubix_service_url: String,
    pub nubix_timeout_secs: u64,
    /// Civil timezone used for every "today" in reading-need estimation.
    pub operator_timezone: Tz,
}

fn required(name: &str) -> anyhow::Result<String> {
    let value = std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))?;
    if value.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    Ok(value)
}

/// Gateway timeout in seconds; zero would fail every call.
fn parse_timeout_secs(raw: &str) -> anyhow::Result<u64> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("NUBIX_TIMEOUT_SECS must be a whole number"))?;
    if secs < 1 {
        anyhow::bail!("NUBIX_TIMEOUT_SECS must be at least 1");
    }
    Ok(secs)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            nubix_username: required("NUBIX_USERNAME")?,
            nubix_password: required("NUBIX_PASSWORD")?,
            nubix_gln: required("NUBIX_GLN")?,
            nubix_service_url: std::env::var("NUBIX_SERVICE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string())
                .parse::<url::Url>()
                .map_err(|e| anyhow::anyhow!("NUBIX_SERVICE_URL is not a valid URL: {}", e))
                .and_then(|service_url| {
                    if service_url.scheme() != "http" && service_url.scheme() != "https" {
                        anyhow::bail!("NUBIX_SERVICE_URL must start with http:// or https://");
                    }
                    Ok(service_url.to_string())
                })?,
            nubix_timeout_secs: parse_timeout_secs(
                &std::env::var("NUBIX_TIMEOUT_SECS").unwrap_or_else(|_| "30".to_string()),
            )?,
            operator_timezone: match std::env::var("OPERATOR_TIMEZONE") {
                Ok(name) if !name.trim().is_empty() => name
                    .trim()
                    .parse::<Tz>()
                    .map_err(|e| anyhow::anyhow!("OPERATOR_TIMEZONE is invalid: {}", e))?,
                _ => DEFAULT_TIMEZONE,
            },
        };

        // Never log credentials
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Nubix service URL: {}", config.nubix_service_url);
        tracing::debug!("Nubix GLN: {}", config.nubix_gln);
        tracing::debug!("Operator timezone: {}", config.operator_timezone);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
