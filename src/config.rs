//! Runtime configuration, read once from the environment at startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::parser::SelectorCascade;

pub const DEFAULT_STATE_PATH: &str = "state/prices.json";
pub const DEFAULT_DROP_THRESHOLD: f64 = 50.0;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_MAX_ITEMS_PER_SITE: usize = 60;
pub const DEFAULT_MAX_ALERTS_PER_RUN: usize = 20;

/// Listing pages monitored when no sites file is given.
const BUILTIN_SITES: &[(&str, &str)] = &[
    ("mercadolibre", "https://www.mercadolibre.com.pe/ofertas"),
    (
        "falabella",
        "https://www.falabella.com.pe/falabella-pe/category/cat40712/Ofertas",
    ),
    ("hm", "https://pe.hm.com/sale/view-all.html"),
    ("shopstar", "https://www.shopstar.pe/collections/ofertas"),
];

fn builtin_selectors(site: &str) -> Option<&'static [&'static str]> {
    match site {
        "mercadolibre" => Some(&["li.ui-search-layout__item", "div.poly-card", "article"]),
        "falabella" => Some(&["div.pod", "article", "li"]),
        "hm" => Some(&["article.product-item", "li.product-item", "article", "li"]),
        "shopstar" => Some(&["div.grid-product", "li.grid__item", "article", "li"]),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct Site {
    pub name: String,
    pub url: String,
    pub cascade: SelectorCascade,
}

impl Site {
    /// Explicit selectors win, then the built-in cascade for a known site,
    /// then the generic one.
    pub fn new(name: &str, url: &str, selectors: Option<&[String]>) -> Result<Self, ConfigError> {
        let cascade = match (selectors, builtin_selectors(name)) {
            (Some(patterns), _) => SelectorCascade::compile(patterns)?,
            (None, Some(patterns)) => SelectorCascade::compile(patterns)?,
            (None, None) => SelectorCascade::generic(),
        };
        Ok(Self {
            name: name.to_string(),
            url: url.to_string(),
            cascade,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SiteEntry {
    site: String,
    url: String,
    #[serde(default)]
    selectors: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramCredentials,
    pub state_path: PathBuf,
    pub drop_threshold: f64,
    pub request_timeout: Duration,
    pub max_items_per_site: usize,
    pub max_alerts_per_run: usize,
    pub sites: Vec<Site>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram = match (var("TELEGRAM_BOT_TOKEN"), var("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => TelegramCredentials { bot_token, chat_id },
            _ => return Err(ConfigError::MissingCredentials),
        };

        let sites = match var("SITES_FILE") {
            Some(path) => load_sites_file(Path::new(&path))?,
            None => BUILTIN_SITES
                .iter()
                .map(|(name, url)| Site::new(name, url, None))
                .collect::<Result<_, _>>()?,
        };
        if sites.is_empty() {
            return Err(ConfigError::NoSites);
        }

        let drop_threshold = number(&var, "DROP_THRESHOLD", DEFAULT_DROP_THRESHOLD)?;
        if !drop_threshold.is_finite() || drop_threshold < 0.0 {
            return Err(ConfigError::InvalidNumber {
                key: "DROP_THRESHOLD",
                value: drop_threshold.to_string(),
            });
        }

        Ok(Self {
            telegram,
            state_path: var("STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            drop_threshold,
            request_timeout: Duration::from_secs(number(
                &var,
                "REQUEST_TIMEOUT",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            max_items_per_site: number(&var, "MAX_ITEMS_PER_SITE", DEFAULT_MAX_ITEMS_PER_SITE)?,
            max_alerts_per_run: number(&var, "MAX_ALERTS_PER_RUN", DEFAULT_MAX_ALERTS_PER_RUN)?,
            sites,
        })
    }
}

fn number<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}

fn load_sites_file(path: &Path) -> Result<Vec<Site>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::SitesFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<SiteEntry> =
        serde_json::from_str(&raw).map_err(|source| ConfigError::SitesFileFormat {
            path: path.to_path_buf(),
            source,
        })?;

    entries
        .iter()
        .map(|e| Site::new(&e.site, &e.url, e.selectors.as_deref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const CREDS: [(&str, &str); 2] = [("TELEGRAM_BOT_TOKEN", "t0k"), ("TELEGRAM_CHAT_ID", "42")];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&CREDS)).unwrap();
        assert_eq!(config.drop_threshold, 50.0);
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert_eq!(config.max_items_per_site, 60);
        assert_eq!(config.max_alerts_per_run, 20);
        assert_eq!(config.state_path, PathBuf::from("state/prices.json"));
        let names: Vec<_> = config.sites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["mercadolibre", "falabella", "hm", "shopstar"]);
        assert_eq!(config.sites[1].cascade.patterns(), ["div.pod", "article", "li"]);
    }

    #[test]
    fn test_missing_credentials_fatal() {
        let err = Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "t0k")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));

        let err = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t0k"),
            ("TELEGRAM_CHAT_ID", " "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let mut vars = CREDS.to_vec();
        vars.extend([("DROP_THRESHOLD", "35.5"), ("MAX_ALERTS_PER_RUN", "3")]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.drop_threshold, 35.5);
        assert_eq!(config.max_alerts_per_run, 3);

        vars.push(("REQUEST_TIMEOUT", "soon"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "REQUEST_TIMEOUT", .. }));
    }

    #[test]
    fn test_drop_threshold_must_be_finite_and_non_negative() {
        for bad in ["NaN", "inf", "-infinity", "-5"] {
            let mut vars = CREDS.to_vec();
            vars.push(("DROP_THRESHOLD", bad));
            let err = Config::from_lookup(lookup(&vars)).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidNumber { key: "DROP_THRESHOLD", .. }),
                "{bad} accepted"
            );
        }

        let mut vars = CREDS.to_vec();
        vars.push(("DROP_THRESHOLD", "0"));
        assert_eq!(Config::from_lookup(lookup(&vars)).unwrap().drop_threshold, 0.0);
    }

    #[test]
    fn test_sites_file_cascade_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.json");
        fs::write(
            &path,
            r#"[
                {"site": "falabella", "url": "https://f.pe/ofertas"},
                {"site": "nueva", "url": "https://n.pe/sale"},
                {"site": "custom", "url": "https://c.pe", "selectors": ["div.card"]}
            ]"#,
        )
        .unwrap();

        let mut vars = CREDS.to_vec();
        let path_str = path.to_string_lossy().to_string();
        vars.push(("SITES_FILE", path_str.as_str()));
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.sites.len(), 3);
        assert_eq!(config.sites[0].url, "https://f.pe/ofertas");
        assert_eq!(config.sites[0].cascade.patterns(), ["div.pod", "article", "li"]);
        assert_eq!(config.sites[1].cascade.patterns(), ["article", "li", "div"]);
        assert_eq!(config.sites[2].cascade.patterns(), ["div.card"]);
    }

    #[test]
    fn test_sites_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.json");
        let path_str = path.to_string_lossy().to_string();
        let mut vars = CREDS.to_vec();
        vars.push(("SITES_FILE", path_str.as_str()));

        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::SitesFileRead { .. }));

        fs::write(&path, "{not json").unwrap();
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::SitesFileFormat { .. }));

        fs::write(&path, "[]").unwrap();
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::NoSites));

        fs::write(&path, r#"[{"site": "x", "url": "https://x.pe", "selectors": ["li[["]}]"#).unwrap();
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSelector { .. }));
    }
}
