//! Declarative schema surface exposed to the orchestrator.
//!
//! Every resource and data source describes its attributes here. The
//! description is what `vaultform schema` prints, and [`Schema::validate`]
//! is the gate every JSON config passes before it is turned into a typed
//! config.

use crate::error::ProviderError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    StringSet,
    StringList,
    StringMap,
    Int,
}

impl AttributeKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            AttributeKind::String => value.is_string(),
            AttributeKind::StringSet | AttributeKind::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            AttributeKind::StringMap => value
                .as_object()
                .is_some_and(|map| map.values().all(Value::is_string)),
            AttributeKind::Int => value.is_i64() || value.is_u64(),
        }
    }
}

/// Checks one attribute value; receives the attribute name and the value.
pub type Validator = fn(&str, &Value) -> Result<(), String>;

#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub sensitive: bool,
    pub description: &'static str,
    #[serde(skip)]
    pub validate: Option<Validator>,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            description: "",
            validate: None,
        }
    }

    pub fn required(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            required: true,
            ..Self::new(name, kind)
        }
    }

    pub fn optional(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            optional: true,
            ..Self::new(name, kind)
        }
    }

    pub fn computed(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            computed: true,
            ..Self::new(name, kind)
        }
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn validate_with(mut self, validator: Validator) -> Self {
        self.validate = Some(validator);
        self
    }

    fn settable(&self) -> bool {
        self.required || self.optional
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(description: &'static str) -> Self {
        Self {
            description,
            attributes: Vec::new(),
        }
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Validates a JSON config object against this schema. `null` values
    /// count as unset.
    pub fn validate(&self, config: &Value) -> Result<(), ProviderError> {
        let Some(object) = config.as_object() else {
            return Err(ProviderError::validation(
                "configuration must be a JSON object",
            ));
        };

        for (key, value) in object {
            let attribute = self
                .get(key)
                .ok_or_else(|| ProviderError::validation(format!("unsupported argument {:?}", key)))?;
            if value.is_null() {
                continue;
            }
            if !attribute.settable() {
                return Err(ProviderError::validation(format!(
                    "{:?} is computed and cannot be set",
                    key
                )));
            }
            if !attribute.kind.accepts(value) {
                return Err(ProviderError::validation(format!(
                    "{:?} must be of type {:?}",
                    key, attribute.kind
                )));
            }
            if let Some(validator) = attribute.validate {
                validator(key, value).map_err(ProviderError::Validation)?;
            }
        }

        for attribute in self.attributes.iter().filter(|a| a.required) {
            if object.get(attribute.name).map_or(true, Value::is_null) {
                return Err(ProviderError::validation(format!(
                    "the argument {:?} is required, but no definition was found",
                    attribute.name
                )));
            }
        }
        Ok(())
    }
}

pub fn validate_no_trailing_slash(name: &str, value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some(s) if s.ends_with('/') => {
            Err(format!("invalid value for {:?}, contains trailing '/'", name))
        }
        _ => Ok(()),
    }
}

pub fn validate_json_object(name: &str, value: &Value) -> Result<(), String> {
    let Some(text) = value.as_str() else {
        return Ok(());
    };
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(_)) => Ok(()),
        Ok(_) => Err(format!("{:?} must encode a JSON object", name)),
        Err(e) => Err(format!("{:?} is not valid JSON: {}", name, e)),
    }
}
