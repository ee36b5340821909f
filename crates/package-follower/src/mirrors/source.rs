//! Registry addressing and document parsing

use serde_json::Value;

use crate::error::ImportError;

/// Upstream registry a mirror reads package documents from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrySource {
    /// npm registry, serving the `javascript` ecosystem
    Npm,
    /// Packagist metadata API, serving the `php` ecosystem
    Packagist,
}

impl RegistrySource {
    /// Ecosystem tag this source registers under
    pub fn ecosystem(&self) -> &'static str {
        match self {
            RegistrySource::Npm => "javascript",
            RegistrySource::Packagist => "php",
        }
    }

    /// URL of the package document for `name` under `base`
    pub fn document_url(&self, base: &str, name: &str) -> Result<String, ImportError> {
        let base = base.trim_end_matches('/');
        let name = name.trim();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ImportError::InvalidName(name.to_string()));
        }

        match self {
            RegistrySource::Npm => {
                let path = match name.strip_prefix('@') {
                    Some(scoped) => {
                        let (scope, package) = split_pair(scoped)
                            .ok_or_else(|| ImportError::InvalidName(name.to_string()))?;
                        format!(
                            "@{}%2F{}",
                            urlencoding::encode(scope),
                            urlencoding::encode(package)
                        )
                    },
                    None if name.contains('/') => {
                        return Err(ImportError::InvalidName(name.to_string()));
                    },
                    None => urlencoding::encode(name).into_owned(),
                };
                Ok(format!("{base}/{path}"))
            },
            RegistrySource::Packagist => {
                let (vendor, package) = split_pair(name)
                    .ok_or_else(|| ImportError::InvalidName(name.to_string()))?;
                Ok(format!(
                    "{base}/p2/{}/{}.json",
                    urlencoding::encode(vendor),
                    urlencoding::encode(package)
                ))
            },
        }
    }

    /// Latest published version named by the document
    pub fn latest_version(&self, name: &str, document: &Value) -> Result<String, ImportError> {
        let version = match self {
            RegistrySource::Npm => document
                .pointer("/dist-tags/latest")
                .and_then(Value::as_str),
            RegistrySource::Packagist => self
                .latest_entry(name, document)
                .and_then(|entry| entry.get("version"))
                .and_then(Value::as_str),
        };

        version.map(str::to_string).ok_or_else(|| ImportError::InvalidDocument {
            name: name.to_string(),
            reason: match self {
                RegistrySource::Npm => "missing dist-tags.latest".to_string(),
                RegistrySource::Packagist => format!("no versions listed under packages.{name}"),
            },
        })
    }

    fn latest_entry<'a>(&self, name: &str, document: &'a Value) -> Option<&'a Value> {
        document
            .get("packages")
            .and_then(|packages| packages.get(name))
            .and_then(Value::as_array)
            .and_then(|versions| versions.first())
    }
}

impl std::fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrySource::Npm => write!(f, "npm"),
            RegistrySource::Packagist => write!(f, "packagist"),
        }
    }
}

/// `left/right` with both halves non-empty and no further slash
fn split_pair(name: &str) -> Option<(&str, &str)> {
    let (left, right) = name.split_once('/')?;
    if left.is_empty() || right.is_empty() || right.contains('/') {
        return None;
    }
    Some((left, right))
}
