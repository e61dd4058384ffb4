//! Component identifiers and categories

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Separator between the type and the name in the text form of an id
const NAME_SEPARATOR: char = '/';

/// Category of a configured component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Extension,
    Receiver,
    Processor,
    Exporter,
    Pipeline,
}

impl Kind {
    /// Component categories in resolution order. Pipelines are resolved
    /// from the service section after every component category.
    pub const COMPONENTS: [Kind; 4] = [
        Kind::Extension,
        Kind::Receiver,
        Kind::Processor,
        Kind::Exporter,
    ];

    /// Name of the raw configuration section holding this category
    pub fn section(&self) -> &'static str {
        match self {
            Self::Extension => "extensions",
            Self::Receiver => "receivers",
            Self::Processor => "processors",
            Self::Exporter => "exporters",
            Self::Pipeline => "pipelines",
        }
    }

    /// Look up the component category for a top-level section name
    pub fn from_section(section: &str) -> Option<Kind> {
        Self::COMPONENTS
            .into_iter()
            .find(|kind| kind.section() == section)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extension => write!(f, "extension"),
            Self::Receiver => write!(f, "receiver"),
            Self::Processor => write!(f, "processor"),
            Self::Exporter => write!(f, "exporter"),
            Self::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// Identity of one configured component instance: a type and an optional name.
///
/// The text form is `type` or `type/name`. Ids order lexically by type, then
/// by name, with the unnamed id first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    component_type: String,
    name: String,
}

impl ComponentId {
    /// Create an id with no name
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            name: String::new(),
        }
    }

    /// Create an id with a type and a name
    pub fn with_name(component_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            name: name.into(),
        }
    }

    /// Parse the `type[/name]` text form
    pub fn parse(value: &str) -> Result<Self, String> {
        if value.chars().any(char::is_whitespace) {
            return Err("id must not contain whitespace".to_string());
        }

        let (component_type, name) = match value.split_once(NAME_SEPARATOR) {
            Some((component_type, name)) => {
                if name.is_empty() {
                    return Err(format!(
                        "name part must be specified after '{}' in id",
                        NAME_SEPARATOR
                    ));
                }
                (component_type, name)
            }
            None => (value, ""),
        };

        if component_type.is_empty() {
            return Err("id must have a non-empty type".to_string());
        }

        Ok(Self::with_name(component_type, name))
    }

    /// The type portion, matched against registered factories
    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    /// The name portion, if any
    pub fn name(&self) -> Option<&str> {
        if self.name.is_empty() {
            None
        } else {
            Some(&self.name)
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}{}{}", self.component_type, NAME_SEPARATOR, name),
            None => write!(f, "{}", self.component_type),
        }
    }
}

impl FromStr for ComponentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ComponentId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ComponentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value)
            .map_err(|reason| serde::de::Error::custom(format!("invalid id '{}': {}", value, reason)))
    }
}
