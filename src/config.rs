use std::{path::Path, time::Duration};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    error::{ConfigError, FeedResult, RequestError},
    source::horizon::{DEFAULT_HORIZON_BUCKET, DEFAULT_HORIZON_KEY},
};

/// Engine settings.
///
/// Every field has a default, so an empty JSON object is a valid configuration.
///
/// # Examples
///
/// ```
/// # use ledger_movements::prelude::*;
/// let config = FeedConfig::from_json_str(r#"{ "max_page_size": 50, "request_timeout": "5s" }"#).unwrap();
/// assert_eq!(config.max_page_size, 50);
/// assert_eq!(config.request_timeout, Some(std::time::Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Page size used when a request does not ask for one.
    pub default_page_size: usize,
    /// Largest page a request may ask for.
    pub max_page_size: usize,
    /// Deadline for one whole page computation, upstream calls included.
    /// `null` disables it.
    #[serde(
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Option<Duration>,
    /// Key-value bucket holding the stability horizon.
    pub horizon_bucket: String,
    /// Key, inside `horizon_bucket`, of the stability horizon.
    pub horizon_key: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 200,
            request_timeout: Some(Duration::from_secs(30)),
            horizon_bucket: DEFAULT_HORIZON_BUCKET.to_string(),
            horizon_key: DEFAULT_HORIZON_KEY.to_string(),
        }
    }
}

impl FeedConfig {
    pub fn from_json_str(json: &str) -> FeedResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> FeedResult<Self> {
        let json = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> FeedResult<()> {
        if self.max_page_size == 0 {
            return Err(ConfigError::Invalid("`max_page_size` must be at least 1".into()).into());
        }
        if !(1..=self.max_page_size).contains(&self.default_page_size) {
            return Err(ConfigError::Invalid(format!(
                "`default_page_size` ({}) must be within 1..={}",
                self.default_page_size, self.max_page_size
            ))
            .into());
        }
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::Invalid("`request_timeout` must be non-zero".into()).into());
        }
        Ok(())
    }

    /// Applies the default to an absent page size and checks the bounds.
    pub fn page_size(&self, requested: Option<usize>) -> Result<usize, RequestError> {
        let size = requested.unwrap_or(self.default_page_size);
        if (1..=self.max_page_size).contains(&size) {
            Ok(size)
        } else {
            Err(RequestError::InvalidPageSize {
                requested: size,
                max: self.max_page_size,
            })
        }
    }
}

fn serialize_duration<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => s.serialize_some(&humantime::format_duration(*d).to_string()),
        None => s.serialize_none(),
    }
}

fn deserialize_duration<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
    Option::<String>::deserialize(d)?
        .map(|raw| {
            humantime::parse_duration(&raw)
                .map_err(|e| serde::de::Error::custom(ConfigError::Duration(e)))
        })
        .transpose()
}
