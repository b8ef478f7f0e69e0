use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::ClientConfig;

pub(crate) const DEFAULT_URL: &str = "https://api.nhtsa.gov";
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default, PartialEq)]
struct RcConfig {
    url: Option<String>,
    timeout: Option<Duration>,
    verify: Option<bool>,
}

pub(crate) fn load_config(
    url: Option<String>,
    timeout: Option<Duration>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    let url = url.or_else(|| env_nonempty("NHTSA_API_URL"));
    let timeout = match timeout {
        Some(t) => Some(t),
        None => env_nonempty("NHTSA_TIMEOUT")
            .map(|v| parse_timeout(&v).context("invalid NHTSA_TIMEOUT"))
            .transpose()?,
    };
    let verify = verify.or_else(|| env_nonempty("NHTSA_VERIFY").map(|v| parse_verify(&v)));

    let mut file = RcConfig::default();
    if url.is_none() || timeout.is_none() || verify.is_none() {
        for rc_path in rc_candidates() {
            if rc_path.exists() {
                file = read_rc(&rc_path).with_context(|| {
                    format!("failed to read configuration file {}", rc_path.display())
                })?;
                tracing::debug!(path = %rc_path.display(), "loaded recall client configuration");
                break;
            }
        }
    }

    Ok(ClientConfig {
        url: url.or(file.url).unwrap_or_else(|| DEFAULT_URL.to_string()),
        timeout: timeout.or(file.timeout).unwrap_or(DEFAULT_TIMEOUT),
        verify: verify.or(file.verify).unwrap_or(true),
    })
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_timeout(v: &str) -> Result<Duration> {
    let secs: u64 = v
        .trim()
        .parse()
        .with_context(|| format!("timeout must be a whole number of seconds, got {:?}", v))?;
    if secs == 0 {
        bail!("timeout must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}

fn parse_verify(v: &str) -> bool {
    !matches!(v.trim(), "0" | "false" | "no")
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    parse_rc(&text)
}

fn parse_rc(text: &str) -> Result<RcConfig> {
    let mut cfg = RcConfig::default();

    // A key may be left empty with its value on the following line.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            if rc_key(line).is_none() {
                apply_rc_value(&mut cfg, pk, strip_quotes(line))?;
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                pending_key = rc_key(line);
            } else {
                apply_rc_value(&mut cfg, k, v)?;
            }
        }
    }

    Ok(cfg)
}

fn rc_key(line: &str) -> Option<&'static str> {
    let (k, _) = line.split_once(':')?;
    match k.trim() {
        "url" => Some("url"),
        "timeout" => Some("timeout"),
        "verify" => Some("verify"),
        _ => None,
    }
}

fn apply_rc_value(cfg: &mut RcConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "url" => cfg.url = Some(value.to_string()),
        "timeout" => cfg.timeout = Some(parse_timeout(value)?),
        "verify" => cfg.verify = Some(parse_verify(value)),
        _ => {}
    }
    Ok(())
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // 1) NHTSA_RC (explicit)
    // 2) ./.nhtsarc
    // 3) ~/.nhtsarc
    if let Ok(p) = std::env::var("NHTSA_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".nhtsarc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".nhtsarc"));
    }
    v
}
