use crate::errors::FiqlError;
use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use strsim::jaro_winkler;

const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Value kind of a searchable attribute, as reported in errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Date,
    Enum,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::String => write!(f, "string"),
            ValueKind::Number => write!(f, "number"),
            ValueKind::Boolean => write!(f, "boolean"),
            ValueKind::Date => write!(f, "date"),
            ValueKind::Enum => write!(f, "enum"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberFormat {
    Integer,
    /// Integers stay integers, anything else parses as a finite float
    #[default]
    Decimal,
    /// Humanized sizes such as `512`, `10 MB` or `1GiB`, as a byte count
    Bytes,
}

impl FromStr for NumberFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "integer" | "int" | "long" => Ok(NumberFormat::Integer),
            "decimal" | "float" | "double" => Ok(NumberFormat::Decimal),
            "bytes" | "size" => Ok(NumberFormat::Bytes),
            _ => anyhow::bail!("Invalid number format: {}", s),
        }
    }
}

/// Kind of a leaf attribute together with what is needed to parse its values
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Number(NumberFormat),
    Boolean,
    /// Optional chrono format tried before the configured defaults
    Date(Option<String>),
    Enum(Vec<String>),
}

impl FieldKind {
    pub fn value_kind(&self) -> ValueKind {
        match self {
            FieldKind::String => ValueKind::String,
            FieldKind::Number(_) => ValueKind::Number,
            FieldKind::Boolean => ValueKind::Boolean,
            FieldKind::Date(_) => ValueKind::Date,
            FieldKind::Enum(_) => ValueKind::Enum,
        }
    }
}

/// Resolved metadata for one searchable attribute
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Dotted path as declared in the schema
    pub path: String,
    /// Dotted path used in generated queries
    pub index_path: String,
    pub kind: FieldKind,
    pub wildcards: bool,
    pub searchable: bool,
}

impl FieldDescriptor {
    pub fn value_kind(&self) -> ValueKind {
        self.kind.value_kind()
    }
}

/// Implemented by document types that describe their own searchable fields
pub trait Searchable {
    fn schema() -> Schema;
}

/// Immutable lookup from dotted selectors to field descriptors.
///
/// Built once, then shared between threads; resolution never allocates
/// except when producing an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: IndexMap<String, FieldDescriptor>,
    objects: IndexSet<String>,
    aliases: HashMap<String, String>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Resolve a selector (alias or dotted path) to its descriptor
    pub fn resolve(&self, token: &str) -> Result<&FieldDescriptor, FiqlError> {
        let path = self.aliases.get(token).map(String::as_str).unwrap_or(token);
        if let Some(field) = self.fields.get(path) {
            if !field.searchable {
                return Err(FiqlError::unknown_field(
                    token,
                    Some("field is not searchable".to_string()),
                ));
            }
            return Ok(field);
        }
        if self.objects.contains(path) {
            return Err(FiqlError::unknown_field(
                token,
                Some("refers to a nested object, select one of its attributes".to_string()),
            ));
        }
        Err(FiqlError::unknown_field(
            token,
            self.suggest(token)
                .map(|candidate| format!("did you mean '{}'?", candidate)),
        ))
    }

    fn suggest(&self, token: &str) -> Option<&str> {
        self.fields
            .iter()
            .filter(|(_, field)| field.searchable)
            .map(|(path, _)| path.as_str())
            .chain(self.aliases.keys().map(String::as_str))
            .map(|candidate| (candidate, jaro_winkler(token, candidate)))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate)
    }

    /// Searchable selectors in declaration order
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.fields
            .values()
            .filter(|field| field.searchable)
            .map(|field| field.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let def: SchemaDef = serde_yaml_ng::from_str(yaml).context("Failed to parse YAML schema")?;
        Self::from_def(def)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let def: SchemaDef = serde_json::from_str(json).context("Failed to parse JSON schema")?;
        Self::from_def(def)
    }

    /// Load a schema file; `.json` files are read as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs_err::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let schema = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        };
        schema.with_context(|| format!("Invalid schema file {}", path.display()))
    }

    pub fn from_def(def: SchemaDef) -> Result<Self> {
        let validator = DefValidator::new()?;
        validator.validate_fields(&def.fields, "")?;
        let schema = Self::compile(def.fields, def.aliases)?;
        for (alias, target) in &schema.aliases {
            validator.check_name(alias, "alias")?;
            if schema.fields.contains_key(alias) || schema.objects.contains(alias) {
                anyhow::bail!("Alias {} shadows a schema field", alias);
            }
            if !schema.fields.contains_key(target) {
                anyhow::bail!("Alias {} points to unknown field {}", alias, target);
            }
        }
        Ok(schema)
    }

    fn compile(fields: Vec<FieldDef>, aliases: HashMap<String, String>) -> Result<Self> {
        let mut schema = Schema {
            fields: IndexMap::new(),
            objects: IndexSet::new(),
            aliases,
        };
        schema.flatten(fields, None)?;
        Ok(schema)
    }

    fn flatten(&mut self, fields: Vec<FieldDef>, parent: Option<(&str, &str)>) -> Result<()> {
        for def in fields {
            let index_name = def.index_name.as_deref().unwrap_or(&def.name);
            let (path, index_path) = match parent {
                Some((path, index_path)) => (
                    format!("{}.{}", path, def.name),
                    format!("{}.{}", index_path, index_name),
                ),
                None => (def.name.clone(), index_name.to_string()),
            };
            let kind = match def.kind {
                KindDef::Object => {
                    self.objects.insert(path.clone());
                    self.flatten(def.fields, Some((&path, &index_path)))?;
                    continue;
                }
                KindDef::String => FieldKind::String,
                KindDef::Number => FieldKind::Number(match def.format.as_deref() {
                    Some(format) => NumberFormat::from_str(format)
                        .with_context(|| format!("Field {}", path))?,
                    None => NumberFormat::default(),
                }),
                KindDef::Boolean => FieldKind::Boolean,
                KindDef::Date => FieldKind::Date(def.format),
                KindDef::Enum => FieldKind::Enum(def.values),
            };
            self.fields.insert(
                path.clone(),
                FieldDescriptor {
                    path,
                    index_path,
                    kind,
                    wildcards: def.wildcards,
                    searchable: def.searchable,
                },
            );
        }
        Ok(())
    }
}

struct DefValidator {
    name: Regex,
    index_name: Regex,
}

impl DefValidator {
    fn new() -> Result<Self> {
        Ok(Self {
            name: Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$")?,
            index_name: Regex::new(r"^[^\s.]+$")?,
        })
    }

    fn check_name(&self, name: &str, what: &str) -> Result<()> {
        if !self.name.is_match(name) {
            anyhow::bail!("Invalid {} name: {:?}", what, name);
        }
        Ok(())
    }

    fn validate_fields(&self, fields: &[FieldDef], prefix: &str) -> Result<()> {
        let mut seen = IndexSet::new();
        for field in fields {
            self.check_name(&field.name, "field")?;
            let path = format!("{}{}", prefix, field.name);
            if !seen.insert(field.name.as_str()) {
                anyhow::bail!("Duplicate field {}", path);
            }
            if let Some(index_name) = &field.index_name {
                if !self.index_name.is_match(index_name) {
                    anyhow::bail!("Invalid index name {:?} for field {}", index_name, path);
                }
            }
            match field.kind {
                KindDef::Object => {
                    if field.fields.is_empty() {
                        anyhow::bail!("Object field {} declares no fields", path);
                    }
                    self.validate_fields(&field.fields, &format!("{}.", path))?;
                }
                KindDef::Enum if field.values.is_empty() => {
                    anyhow::bail!("Enum field {} declares no values", path);
                }
                KindDef::Number => {
                    if let Some(format) = &field.format {
                        NumberFormat::from_str(format)
                            .with_context(|| format!("Field {}", path))?;
                    }
                }
                _ => {}
            }
            if field.kind != KindDef::Object && !field.fields.is_empty() {
                anyhow::bail!("Field {} is not an object but declares nested fields", path);
            }
        }
        Ok(())
    }
}

/// Serializable schema description, the format read by [`Schema::from_yaml`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaDef {
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: KindDef,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub index_name: Option<String>,
    #[serde(default = "default_true")]
    pub searchable: bool,
    #[serde(default = "default_true")]
    pub wildcards: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindDef {
    String,
    Number,
    Boolean,
    Date,
    Enum,
    Object,
}

impl FieldDef {
    fn new(name: &str, kind: KindDef) -> Self {
        Self {
            name: name.to_string(),
            kind,
            format: None,
            values: Vec::new(),
            fields: Vec::new(),
            index_name: None,
            searchable: true,
            wildcards: true,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, KindDef::String)
    }

    pub fn number(name: &str, format: NumberFormat) -> Self {
        let format = match format {
            NumberFormat::Integer => "integer",
            NumberFormat::Decimal => "decimal",
            NumberFormat::Bytes => "bytes",
        };
        Self::new(name, KindDef::Number).format(format)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, KindDef::Boolean)
    }

    pub fn date(name: &str) -> Self {
        Self::new(name, KindDef::Date)
    }

    pub fn enumeration(name: &str, values: &[&str]) -> Self {
        let mut def = Self::new(name, KindDef::Enum);
        def.values = values.iter().map(|v| v.to_string()).collect();
        def
    }

    pub fn object(name: &str, fields: Vec<FieldDef>) -> Self {
        let mut def = Self::new(name, KindDef::Object);
        def.fields = fields;
        def
    }

    pub fn format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn index_name(mut self, index_name: &str) -> Self {
        self.index_name = Some(index_name.to_string());
        self
    }

    pub fn not_searchable(mut self) -> Self {
        self.searchable = false;
        self
    }

    pub fn without_wildcards(mut self) -> Self {
        self.wildcards = false;
        self
    }
}

/// In-code schema declaration, used by [`Searchable`] implementations
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    def: SchemaDef,
}

impl SchemaBuilder {
    pub fn field(mut self, field: FieldDef) -> Self {
        self.def.fields.push(field);
        self
    }

    pub fn alias(mut self, alias: &str, target: &str) -> Self {
        self.def.aliases.insert(alias.to_string(), target.to_string());
        self
    }

    /// Validates like [`Schema::from_def`]
    pub fn try_build(self) -> Result<Schema> {
        Schema::from_def(self.def)
    }

    /// Like [`try_build`](Self::try_build) for schemas fixed at compile time.
    ///
    /// # Panics
    ///
    /// When the declaration is invalid, with the validation error as message.
    pub fn build(self) -> Schema {
        self.try_build()
            .unwrap_or_else(|e| panic!("Invalid schema declaration: {:#}", e))
    }
}
