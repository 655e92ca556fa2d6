use std::fs;
use std::path::Path;

use html::Node;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_MAX_LINE_LENGTH: usize = 85;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LineNumberingConfig {
    /// Characters per line before wrapping. Per meeting policy, not a constant.
    pub max_line_length: usize,
    /// Number given to the first line of the document.
    pub first_line: u32,
    pub markup: DiffMarkup,
}

impl Default for LineNumberingConfig {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            first_line: 1,
            markup: DiffMarkup::default(),
        }
    }
}

impl LineNumberingConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_line_length == 0 {
            return Err(ConfigError::Invalid {
                field: "max_line_length",
                message: "must be at least 1".to_string(),
            });
        }
        if self.first_line == 0 {
            return Err(ConfigError::Invalid {
                field: "first_line",
                message: "line numbers start at 1".to_string(),
            });
        }
        self.markup.deletion.validate("markup.deletion.tag")?;
        self.markup.insertion.validate("markup.insertion.tag")?;
        Ok(())
    }
}

/// Elements used to mark deleted and inserted content in review output.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiffMarkup {
    pub deletion: MarkupStyle,
    pub insertion: MarkupStyle,
}

impl Default for DiffMarkup {
    fn default() -> Self {
        Self {
            deletion: MarkupStyle::new("del", Some("delete")),
            insertion: MarkupStyle::new("ins", Some("insert")),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct MarkupStyle {
    pub tag: String,
    #[serde(default)]
    pub class: Option<String>,
    /// Rendered as an inline `color` declaration when set.
    #[serde(default)]
    pub color: Option<String>,
}

impl MarkupStyle {
    pub fn new(tag: &str, class: Option<&str>) -> Self {
        Self {
            tag: tag.to_string(),
            class: class.map(str::to_string),
            color: None,
        }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    /// Childless wrapper element.
    pub fn shell(&self) -> Node {
        let mut attributes = Vec::new();
        if let Some(class) = &self.class {
            attributes.push(("class".to_string(), Some(class.clone())));
        }
        let mut node = Node::element(self.tag.clone(), attributes, Vec::new());
        if let Some(color) = &self.color {
            node.set_style_property("color", color);
        }
        node
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        let valid = !self.tag.is_empty()
            && self
                .tag
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-');
        if !valid {
            return Err(ConfigError::Invalid {
                field,
                message: format!("'{}' is not a tag name", self.tag),
            });
        }
        Ok(())
    }
}
