//! Asset addressing.
//!
//! Assets are addressed by long package names such as `/Game/Blueprints/BP_Door`.
//! The same asset can also be written in object form,
//! `/Game/Blueprints/BP_Door.BP_Door`. [`AssetPath`] accepts both and always
//! reports the object form as its canonical spelling.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const EXPECTED_SHAPE: &str = "use long package names like /Game/MyFolder/BP_Name";

/// A validated asset path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetPath {
    package: String,
    name: String,
}

impl AssetPath {
    /// Parses a package path or object path.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        let invalid = |reason: &str| CoreError::InvalidAssetPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("path is empty"));
        }
        if !raw.starts_with('/') {
            return Err(invalid(&format!("path must start with '/'; {}", EXPECTED_SHAPE)));
        }

        let (package, object) = match raw.rsplit_once('.') {
            Some((package, object)) => (package, Some(object)),
            None => (raw, None),
        };
        validate_package_name(package).map_err(|reason| invalid(&reason))?;

        let name = package
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        if let Some(object) = object {
            if object != name {
                return Err(invalid(&format!(
                    "object name '{}' does not match package name '{}'",
                    object, name
                )));
            }
        }

        Ok(AssetPath {
            package: package.to_string(),
            name,
        })
    }

    /// Package name, e.g. `/Game/Blueprints/BP_Door`.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Asset name, e.g. `BP_Door`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Object path, e.g. `/Game/Blueprints/BP_Door.BP_Door`.
    pub fn object_path(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }

    /// Folder containing the package, e.g. `/Game/Blueprints`.
    pub fn folder(&self) -> &str {
        self.package
            .rsplit_once('/')
            .map(|(folder, _)| folder)
            .unwrap_or("/")
    }

    /// Whether this asset lives under `root` (recursively).
    ///
    /// `/Game` contains `/Game/A` and `/Game/X/B` but not `/GameData/C`.
    pub fn is_under(&self, root: &str) -> bool {
        let root = root.trim().trim_end_matches('/');
        if root.is_empty() {
            return true;
        }
        self.package
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Checks the long package name rules.
fn validate_package_name(package: &str) -> Result<(), String> {
    if package.ends_with('/') {
        return Err(format!("path must not end with '/'; {}", EXPECTED_SHAPE));
    }
    let segments: Vec<&str> = package[1..].split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(format!("path contains an empty segment; {}", EXPECTED_SHAPE));
    }
    if segments.len() < 2 {
        return Err(format!(
            "path needs a mount root and an asset name; {}",
            EXPECTED_SHAPE
        ));
    }
    for segment in &segments {
        if let Some(bad) = segment
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(format!("character '{}' is not allowed in '{}'", bad, segment));
        }
    }
    Ok(())
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

impl TryFrom<String> for AssetPath {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AssetPath::parse(&value)
    }
}

impl From<AssetPath> for String {
    fn from(path: AssetPath) -> Self {
        path.object_path()
    }
}

/// Outcome of creating a new asset.
///
/// `error` is populated iff `success` is `false`; `asset_path` iff it is `true`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CreationResult {
    pub success: bool,
    pub error: String,
    pub asset_path: String,
}

impl CreationResult {
    pub fn created(path: &AssetPath) -> Self {
        CreationResult {
            success: true,
            error: String::new(),
            asset_path: path.object_path(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        CreationResult {
            success: false,
            error: error.into(),
            asset_path: String::new(),
        }
    }
}
