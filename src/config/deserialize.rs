// ABOUTME: Custom serde deserializers for config values.
// ABOUTME: Validates host interfaces and storage paths while parsing.

use serde::Deserialize;
use std::net::IpAddr;
use std::path::PathBuf;

pub fn deserialize_host_ip<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.trim()
        .parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| serde::de::Error::custom(format!("invalid host_ip '{}'", s)))
}

pub fn deserialize_storage_root<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.trim().is_empty() {
        return Err(serde::de::Error::custom("storage_root cannot be empty"));
    }
    Ok(PathBuf::from(s.trim()))
}
