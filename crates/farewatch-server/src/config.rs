use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use farewatch_core::DEFAULT_CURRENCY_PREFIX;
use farewatch_mail::MailgunConfig;
use farewatch_mail::mailgun::DEFAULT_BASE_URL;

pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub interval_secs: u64,
    pub dump_dir: PathBuf,
    pub currency_prefix: String,
    /// `None` runs with the dry-run transport.
    pub mailgun: Option<MailgunConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port: u16 = var_or("FAREWATCH_PORT", "3000")
            .parse()
            .context("FAREWATCH_PORT must be a port number")?;
        let interval_secs = parse_interval(&var_or("FAREWATCH_INTERVAL_SECS", "3600"))?;

        Ok(Self {
            db_path: var_or("FAREWATCH_DB_PATH", "farewatch.db").into(),
            host: var_or("FAREWATCH_HOST", "0.0.0.0"),
            port,
            interval_secs,
            dump_dir: var_or("FAREWATCH_DUMP_DIR", "screenshots").into(),
            currency_prefix: var_or("FAREWATCH_CURRENCY_PREFIX", DEFAULT_CURRENCY_PREFIX),
            mailgun: mailgun_config(
                std::env::var("MAILGUN_API_KEY").ok(),
                std::env::var("MAILGUN_DOMAIN").ok(),
                std::env::var("MAILGUN_FROM").ok(),
                std::env::var("MAILGUN_BASE_URL").ok(),
            )?,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_interval(raw: &str) -> Result<u64> {
    let secs: u64 = raw
        .parse()
        .context("FAREWATCH_INTERVAL_SECS must be a number of seconds")?;
    if secs == 0 {
        bail!("FAREWATCH_INTERVAL_SECS must be greater than zero");
    }
    Ok(secs)
}

/// All three credentials or none; a partial set is a misconfiguration.
fn mailgun_config(
    api_key: Option<String>,
    domain: Option<String>,
    from: Option<String>,
    base_url: Option<String>,
) -> Result<Option<MailgunConfig>> {
    match (api_key, domain, from) {
        (None, None, None) => Ok(None),
        (Some(api_key), Some(domain), Some(from)) => Ok(Some(MailgunConfig {
            api_key,
            domain,
            from,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into()),
        })),
        _ => bail!("MAILGUN_API_KEY, MAILGUN_DOMAIN and MAILGUN_FROM must be set together"),
    }
}
