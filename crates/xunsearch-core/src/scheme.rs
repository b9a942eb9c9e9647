//! Field schemes: the typed, validated view of a project's fields.
//!
//! Every section of a [`ProjectConfig`] declares one field; the section name
//! is the field name and its keys are the field's attributes:
//!
//! | Attribute | Values | Default |
//! |-----------|--------|---------|
//! | `type` | `id`, `title`, `body`, `string`, `numeric`, `date` | `string` |
//! | `index` | `none`, `self`, `mixed`, `both` | `self` for id, `both` for title/body, else `none` |
//! | `tokenizer` | tokenizer spec | `default` |
//! | `cutlen` | integer | `0` |
//! | `weight` | integer | `1` |
//! | `phrase` | yes/no | `no` |
//! | `non_bool` | yes/no | `no` |
//!
//! A scheme is valid when exactly one field has type `id`, at most one has
//! `title`, at most one has `body`, and no two fields share a name. Once
//! built it never changes; a new configuration produces a new scheme.

use std::fmt;

use crate::config::{ProjectConfig, Section};
use crate::error::{Error, Result, SchemeRule};

/// Declared storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    /// Free text.
    #[default]
    String,
    /// Numeric value.
    Numeric,
    /// Date value.
    Date,
    /// Primary key.
    Id,
    /// Document title.
    Title,
    /// Document body.
    Body,
}

impl FieldType {
    /// Parse a `type` attribute; unknown values fall back to `String`.
    pub fn from_attr(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "id" => Self::Id,
            "title" => Self::Title,
            "body" => Self::Body,
            "numeric" => Self::Numeric,
            "date" => Self::Date,
            "string" => Self::String,
            other => {
                log::debug!("Unknown field type '{other}', treating as string");
                Self::String
            }
        }
    }

    /// The role this type plays in the scheme.
    pub fn role(self) -> FieldRole {
        match self {
            Self::Id => FieldRole::Identifier,
            Self::Title => FieldRole::Title,
            Self::Body => FieldRole::Body,
            Self::String | Self::Numeric | Self::Date => FieldRole::Plain,
        }
    }
}

/// Role of a field; identifier/title/body are unique within a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// The primary key field.
    Identifier,
    /// The title field.
    Title,
    /// The body field.
    Body,
    /// Any other field.
    Plain,
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::Title => write!(f, "title"),
            Self::Body => write!(f, "body"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

/// How a field participates in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// Stored only.
    NoIndex,
    /// Searchable through its own field prefix.
    SelfOnly,
    /// Searchable through the mixed (default) region.
    Mixed,
    /// Both of the above.
    Both,
}

impl IndexMode {
    fn from_attr(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Some(Self::NoIndex),
            "self" => Some(Self::SelfOnly),
            "mixed" => Some(Self::Mixed),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    fn default_for(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Id => Self::SelfOnly,
            FieldType::Title | FieldType::Body => Self::Both,
            _ => Self::NoIndex,
        }
    }
}

/// Metadata for one declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMeta {
    name: String,
    vno: usize,
    field_type: FieldType,
    index: IndexMode,
    tokenizer: String,
    cut_len: u32,
    weight: u32,
    phrase: bool,
    non_bool: bool,
    attributes: Section,
}

impl FieldMeta {
    /// Build field metadata from its declared attributes.
    pub fn from_attributes(name: &str, vno: usize, attributes: &Section) -> Self {
        let field_type = attributes
            .get("type")
            .map(FieldType::from_attr)
            .unwrap_or_default();
        let index = attributes
            .get("index")
            .and_then(IndexMode::from_attr)
            .unwrap_or_else(|| IndexMode::default_for(field_type));

        Self {
            name: name.to_string(),
            vno,
            field_type,
            index,
            tokenizer: attributes.get("tokenizer").unwrap_or("default").to_string(),
            cut_len: numeric_attr(name, attributes, "cutlen", 0),
            weight: numeric_attr(name, attributes, "weight", 1),
            phrase: bool_attr(attributes, "phrase"),
            non_bool: bool_attr(attributes, "non_bool"),
            attributes: attributes.clone(),
        }
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positional index within the scheme.
    pub fn vno(&self) -> usize {
        self.vno
    }

    /// Declared type.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Role derived from the type.
    pub fn role(&self) -> FieldRole {
        self.field_type.role()
    }

    /// Index participation.
    pub fn index_mode(&self) -> IndexMode {
        self.index
    }

    /// Tokenizer name and its arguments, e.g. `split(,)`.
    pub fn tokenizer(&self) -> &str {
        &self.tokenizer
    }

    /// Length at which values are cut when stored (0 = never).
    pub fn cut_len(&self) -> u32 {
        self.cut_len
    }

    /// Relevance weight.
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Whether phrase search is enabled.
    pub fn has_phrase(&self) -> bool {
        self.phrase
    }

    /// Whether boolean query syntax is disabled for this field.
    pub fn is_non_bool(&self) -> bool {
        self.non_bool
    }

    /// Whether the field is numeric.
    pub fn is_numeric(&self) -> bool {
        self.field_type == FieldType::Numeric
    }

    /// Any declared attribute, including ones without a typed accessor.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key)
    }
}

fn numeric_attr(field: &str, attributes: &Section, key: &str, default: u32) -> u32 {
    match attributes.get(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Field '{field}': ignoring non-numeric {key} '{raw}'");
            default
        }),
        None => default,
    }
}

fn bool_attr(attributes: &Section, key: &str) -> bool {
    attributes
        .get(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "yes" | "true" | "on" | "1"))
        .unwrap_or(false)
}

/// Field lookup key: a name or a positional index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey<'a> {
    /// Look up by field name.
    Name(&'a str),
    /// Look up by position.
    Index(usize),
}

impl<'a> From<&'a str> for FieldKey<'a> {
    fn from(name: &'a str) -> Self {
        FieldKey::Name(name)
    }
}

impl From<usize> for FieldKey<'_> {
    fn from(index: usize) -> Self {
        FieldKey::Index(index)
    }
}

impl fmt::Display for FieldKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Name(name) => write!(f, "{name}"),
            FieldKey::Index(index) => write!(f, "#{index}"),
        }
    }
}

/// Validated, immutable collection of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldScheme {
    fields: Vec<FieldMeta>,
    id: usize,
    title: Option<usize>,
    body: Option<usize>,
}

impl FieldScheme {
    /// Start building a scheme field by field.
    pub fn builder() -> FieldSchemeBuilder {
        FieldSchemeBuilder::default()
    }

    /// Build a scheme from every section of a parsed configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemeInvalid`] naming the first rule that fails.
    pub fn from_config(config: &ProjectConfig) -> Result<Self> {
        config
            .sections()
            .fold(Self::builder(), |builder, (name, attrs)| {
                builder.add_field(name, attrs)
            })
            .build()
    }

    /// Strict lookup by name or index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldNotFound`] when nothing matches.
    pub fn field<'a>(&self, key: impl Into<FieldKey<'a>>) -> Result<&FieldMeta> {
        let key = key.into();
        self.try_field(key).ok_or_else(|| Error::field_not_found(key))
    }

    /// Lenient lookup by name or index.
    pub fn try_field<'a>(&self, key: impl Into<FieldKey<'a>>) -> Option<&FieldMeta> {
        match key.into() {
            FieldKey::Name(name) => self.fields.iter().find(|f| f.name == name),
            FieldKey::Index(index) => self.fields.get(index),
        }
    }

    /// The identifier field; always present in a valid scheme.
    pub fn field_id(&self) -> &FieldMeta {
        &self.fields[self.id]
    }

    /// The title field, if declared.
    pub fn field_title(&self) -> Option<&FieldMeta> {
        self.title.map(|i| &self.fields[i])
    }

    /// The body field, if declared.
    pub fn field_body(&self) -> Option<&FieldMeta> {
        self.body.map(|i| &self.fields[i])
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false for a valid scheme; provided for completeness.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Collects fields, then validates them into a [`FieldScheme`].
#[derive(Debug, Default)]
pub struct FieldSchemeBuilder {
    fields: Vec<FieldMeta>,
}

impl FieldSchemeBuilder {
    /// Declare a field with the given attributes.
    pub fn add_field(mut self, name: &str, attributes: &Section) -> Self {
        let vno = self.fields.len();
        self.fields
            .push(FieldMeta::from_attributes(name, vno, attributes));
        self
    }

    /// Validate and freeze the scheme.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemeInvalid`] naming the first rule that fails.
    pub fn build(self) -> Result<FieldScheme> {
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::scheme(
                    SchemeRule::DuplicateName,
                    format!("field '{}' is declared more than once", field.name),
                ));
            }
        }

        let id = self.unique_role(FieldRole::Identifier, SchemeRule::DuplicateIdentifier)?;
        let Some(id) = id else {
            return Err(Error::scheme(
                SchemeRule::MissingIdentifier,
                "no field declares type = id",
            ));
        };
        let title = self.unique_role(FieldRole::Title, SchemeRule::DuplicateTitle)?;
        let body = self.unique_role(FieldRole::Body, SchemeRule::DuplicateBody)?;

        Ok(FieldScheme {
            fields: self.fields,
            id,
            title,
            body,
        })
    }

    fn unique_role(&self, role: FieldRole, rule: SchemeRule) -> Result<Option<usize>> {
        let mut found: Option<usize> = None;
        for (i, field) in self.fields.iter().enumerate() {
            if field.role() != role {
                continue;
            }
            if let Some(prev) = found {
                return Err(Error::scheme(
                    rule,
                    format!(
                        "fields '{}' and '{}' both declare the {role} role",
                        self.fields[prev].name, field.name
                    ),
                ));
            }
            found = Some(i);
        }
        Ok(found)
    }
}

// ============================================================================
// Tests
// ============================================================================
