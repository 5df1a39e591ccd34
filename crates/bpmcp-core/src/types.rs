//! Pin type descriptors.
//!
//! A [`PinType`] is the `{category, subcategory, container}` triple carried by
//! every pin and member variable. [`PinType::describe`] produces the canonical
//! text form used on the wire (`float`, `object:/Script/Engine.Actor[]`,
//! `name<set>`), and [`PinType::parse`] accepts that form back.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Well-known pin categories.
pub mod category {
    pub const EXEC: &str = "exec";
    pub const BOOL: &str = "bool";
    pub const BYTE: &str = "byte";
    pub const INT: &str = "int";
    pub const FLOAT: &str = "float";
    pub const NAME: &str = "name";
    pub const STRING: &str = "string";
    pub const TEXT: &str = "text";
    pub const STRUCT: &str = "struct";
    pub const OBJECT: &str = "object";
    pub const CLASS: &str = "class";
    pub const DELEGATE: &str = "delegate";
    pub const WILDCARD: &str = "wildcard";
}

/// Pin data flow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDirection {
    In,
    Out,
}

impl PinDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinDirection::In => "in",
            PinDirection::Out => "out",
        }
    }

    pub fn opposite(&self) -> PinDirection {
        match self {
            PinDirection::In => PinDirection::Out,
            PinDirection::Out => PinDirection::In,
        }
    }
}

/// Container wrapping of a pin value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PinContainer {
    #[default]
    None,
    Array,
    Set,
    Map,
}

impl PinContainer {
    /// Builds the container from the three wire flags.
    ///
    /// The flags are mutually exclusive: more than one `true` is an error.
    pub fn from_flags(is_array: bool, is_set: bool, is_map: bool) -> Result<Self, CoreError> {
        match (is_array, is_set, is_map) {
            (false, false, false) => Ok(PinContainer::None),
            (true, false, false) => Ok(PinContainer::Array),
            (false, true, false) => Ok(PinContainer::Set),
            (false, false, true) => Ok(PinContainer::Map),
            _ => Err(CoreError::InvalidPinType {
                reason: "is_array, is_set and is_map are mutually exclusive".to_string(),
            }),
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            PinContainer::None => "",
            PinContainer::Array => "[]",
            PinContainer::Set => "<set>",
            PinContainer::Map => "<map>",
        }
    }
}

/// The type carried by a pin or variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinType {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub container: PinContainer,
}

impl PinType {
    /// A scalar type of the given category.
    pub fn new(category: impl Into<String>) -> Self {
        PinType {
            category: category.into(),
            sub_category: None,
            container: PinContainer::None,
        }
    }

    /// A type with a subcategory (struct/object/class payloads, enums).
    pub fn with_sub(category: impl Into<String>, sub_category: impl Into<String>) -> Self {
        PinType {
            category: category.into(),
            sub_category: Some(sub_category.into()),
            container: PinContainer::None,
        }
    }

    pub fn exec() -> Self {
        PinType::new(category::EXEC)
    }

    pub fn object(class_path: impl Into<String>) -> Self {
        PinType::with_sub(category::OBJECT, class_path)
    }

    /// Returns the same type wrapped in `container`.
    pub fn in_container(mut self, container: PinContainer) -> Self {
        self.container = container;
        self
    }

    /// Validates and builds a type from the wire object fields.
    pub fn from_parts(
        category: &str,
        sub_category: Option<&str>,
        is_array: bool,
        is_set: bool,
        is_map: bool,
    ) -> Result<Self, CoreError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(CoreError::InvalidPinType {
                reason: "category is empty".to_string(),
            });
        }
        // These delimit the subcategory and container in the describe form.
        if category.contains(|c: char| matches!(c, ':' | '[' | ']' | '<' | '>')) {
            return Err(CoreError::InvalidPinType {
                reason: format!("category '{}' contains a reserved character", category),
            });
        }
        let container = PinContainer::from_flags(is_array, is_set, is_map)?;
        Ok(PinType {
            category: category.to_string(),
            sub_category: sub_category
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            container,
        })
    }

    /// Parses the canonical text form produced by [`PinType::describe`].
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let text = text.trim();
        let (body, container) = if let Some(body) = text.strip_suffix("[]") {
            (body, PinContainer::Array)
        } else if let Some(body) = text.strip_suffix("<set>") {
            (body, PinContainer::Set)
        } else if let Some(body) = text.strip_suffix("<map>") {
            (body, PinContainer::Map)
        } else {
            (text, PinContainer::None)
        };

        let (category, sub_category) = match body.split_once(':') {
            Some((cat, sub)) => (cat, Some(sub)),
            None => (body, None),
        };
        if sub_category.is_some_and(|s| s.trim().is_empty()) {
            return Err(CoreError::InvalidPinType {
                reason: format!("'{}' has an empty subcategory", text),
            });
        }

        let mut ty = PinType::from_parts(category, sub_category, false, false, false)?;
        ty.container = container;
        Ok(ty)
    }

    /// Canonical text form: `category[:subcategory]` plus a container suffix.
    pub fn describe(&self) -> String {
        let mut out = self.category.clone();
        if let Some(sub) = &self.sub_category {
            out.push(':');
            out.push_str(sub);
        }
        out.push_str(self.container.suffix());
        out
    }

    pub fn is_exec(&self) -> bool {
        self.category == category::EXEC
    }

    pub fn is_wildcard(&self) -> bool {
        self.category == category::WILDCARD
    }

    pub fn is_array(&self) -> bool {
        self.container == PinContainer::Array
    }

    pub fn is_set(&self) -> bool {
        self.container == PinContainer::Set
    }

    pub fn is_map(&self) -> bool {
        self.container == PinContainer::Map
    }

    /// Whether a value of this type may flow into a pin of `other`.
    ///
    /// Exec only joins exec; wildcards join any data pin; otherwise the
    /// category and container must agree. Object subcategories are not
    /// compared because class hierarchy checks belong to the backend.
    pub fn is_compatible_with(&self, other: &PinType) -> bool {
        if self.is_exec() || other.is_exec() {
            return self.is_exec() && other.is_exec();
        }
        if self.is_wildcard() || other.is_wildcard() {
            return true;
        }
        if self.category != other.category || self.container != other.container {
            return false;
        }
        match self.category.as_str() {
            category::OBJECT | category::CLASS => true,
            _ => self.sub_category == other.sub_category,
        }
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
