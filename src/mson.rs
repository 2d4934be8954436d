//! @ai:module:intent Parse the compact MSON field notation used by param, pathparam and data tags
//! @ai:module:layer domain
//! @ai:module:public_api FieldType, EnumValue, MsonField, TypeExpression, parse, parse_type_expression
//! @ai:module:depends_on error
//! @ai:module:stateless true

use crate::error::MsonError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][\w.\-]*").expect("Invalid regex"));

static TYPE_EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\\\w:]+)(?:<([\\\w:]+)>)?\s*(?:\[([^\]]*)\])?$").expect("Invalid regex")
});

static MEMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s*`([^`]*)`\s*(?:-\s*(.*))?$").expect("Invalid regex"));

/// @ai:intent Field types understood by the documentation DSL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FieldType {
    Array,
    Boolean,
    Date,
    Datetime,
    Enum,
    Float,
    Identifier,
    Integer,
    Number,
    Object,
    String,
    Timestamp,
    Uri,
    /// Another documented representation, by class name
    Representation(String),
}

impl FieldType {
    /// @ai:intent Resolve a type token
    /// @ai:example ("integer") -> Ok(Integer)
    /// @ai:example ("\\App\\Person") -> Ok(Representation)
    /// @ai:example ("varchar") -> Err(UnsupportedType)
    /// @ai:effects pure
    pub fn parse(token: &str) -> Result<Self, MsonError> {
        let ty = match token.to_ascii_lowercase().as_str() {
            "array" => FieldType::Array,
            "boolean" => FieldType::Boolean,
            "date" => FieldType::Date,
            "datetime" => FieldType::Datetime,
            "enum" => FieldType::Enum,
            "float" => FieldType::Float,
            "identifier" => FieldType::Identifier,
            "integer" => FieldType::Integer,
            "number" => FieldType::Number,
            "object" => FieldType::Object,
            "string" => FieldType::String,
            "timestamp" => FieldType::Timestamp,
            "uri" => FieldType::Uri,
            _ if looks_like_class(token) => FieldType::Representation(token.to_string()),
            _ => return Err(MsonError::UnsupportedType(token.to_string())),
        };
        Ok(ty)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Array => "array",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Enum => "enum",
            FieldType::Float => "float",
            FieldType::Identifier => "identifier",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Object => "object",
            FieldType::String => "string",
            FieldType::Timestamp => "timestamp",
            FieldType::Uri => "uri",
            FieldType::Representation(class) => class,
        }
    }

    pub fn representation(&self) -> Option<&str> {
        match self {
            FieldType::Representation(class) => Some(class),
            _ => None,
        }
    }

    fn accepts_subtype(&self) -> bool {
        matches!(self, FieldType::Array)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        FieldType::parse(&value).unwrap_or(FieldType::Representation(value))
    }
}

fn looks_like_class(token: &str) -> bool {
    token.starts_with('\\')
        || token
            .chars()
            .next()
            .map(|c| c.is_ascii_uppercase())
            .unwrap_or(false)
}

/// @ai:intent One enumerated value with its optional description
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumValue {
    pub value: String,
    pub description: String,
}

/// @ai:intent A type with its optional subtype and inline option list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpression {
    pub ty: FieldType,
    pub subtype: Option<FieldType>,
    pub options: Vec<EnumValue>,
}

/// @ai:intent Fully parsed MSON field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsonField {
    pub identifier: String,
    pub sample: Option<String>,
    #[serde(rename = "type")]
    pub ty: FieldType,
    pub subtype: Option<FieldType>,
    pub nullable: bool,
    pub required: bool,
    pub capability: Option<String>,
    pub vendor_tags: Vec<String>,
    pub values: Vec<EnumValue>,
    pub description: String,
}

/// @ai:intent Parse an MSON field declaration with an optional `+ Members` block
/// @ai:example ("id `1` (integer, required) - Movie ID") -> MsonField { identifier: "id", .. }
/// @ai:post enum types always carry at least one value
/// @ai:effects pure
pub fn parse(content: &str) -> Result<MsonField, MsonError> {
    let (header, members) = split_members(content);
    let syntax = |field: &'static str| MsonError::InvalidSyntax {
        field,
        content: header.clone(),
    };

    let identifier = IDENTIFIER
        .find(&header)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| syntax("identifier"))?;
    let mut rest = header[identifier.len()..].trim_start();

    let mut sample = None;
    if let Some(after) = rest.strip_prefix('`') {
        let end = after.find('`').ok_or_else(|| syntax("sample"))?;
        sample = Some(after[..end].to_string());
        rest = after[end + 1..].trim_start();
    }

    let inner = rest.strip_prefix('(').ok_or_else(|| syntax("type"))?;
    let close = inner.find(')').ok_or_else(|| syntax("type"))?;
    let type_list = &inner[..close];
    rest = inner[close + 1..].trim();

    let description = rest
        .strip_prefix('-')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| syntax("description"))?
        .to_string();

    let mut items = type_list.split(',').map(str::trim);
    let expression = parse_type_expression(items.next().unwrap_or_default())?;
    let mut field = MsonField {
        identifier,
        sample,
        ty: expression.ty,
        subtype: expression.subtype,
        nullable: false,
        required: false,
        capability: None,
        vendor_tags: Vec::new(),
        values: expression.options,
        description,
    };

    for item in items.filter(|i| !i.is_empty()) {
        apply_modifier(&mut field, item).ok_or_else(|| syntax("type"))??;
    }

    for line in members.iter().filter(|l| !l.is_empty()) {
        let captures = MEMBER.captures(line).ok_or_else(|| syntax("members"))?;
        field.values.push(EnumValue {
            value: captures[1].to_string(),
            description: captures
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
        });
    }

    if field.ty == FieldType::Enum && field.values.is_empty() {
        return Err(MsonError::MissingOptions {
            identifier: field.identifier,
            ty: field.ty.to_string(),
        });
    }

    Ok(field)
}

/// @ai:intent Parse `type[<subtype>] [[a|b|c]]`
/// @ai:example ("array<Person>") -> TypeExpression { ty: Array, subtype: Some(Representation("Person")) }
/// @ai:example ("enum [G|PG]") -> TypeExpression { ty: Enum, options: [G, PG] }
/// @ai:effects pure
pub fn parse_type_expression(expression: &str) -> Result<TypeExpression, MsonError> {
    let expression = expression.trim();
    let captures = TYPE_EXPRESSION
        .captures(expression)
        .ok_or_else(|| MsonError::InvalidSyntax {
            field: "type",
            content: expression.to_string(),
        })?;

    let ty = FieldType::parse(&captures[1])?;
    let subtype = match captures.get(2) {
        Some(sub) => Some(check_subtype(&ty, sub.as_str())?),
        None => None,
    };
    let options = match captures.get(3) {
        Some(list) => parse_option_list(list.as_str())?,
        None => Vec::new(),
    };

    Ok(TypeExpression {
        ty,
        subtype,
        options,
    })
}

/// @ai:intent Parse the body of an `[a|b|c]` option list
/// @ai:effects pure
fn parse_option_list(list: &str) -> Result<Vec<EnumValue>, MsonError> {
    list.split('|')
        .map(str::trim)
        .map(|value| {
            if value.is_empty() {
                Err(MsonError::InvalidSyntax {
                    field: "options",
                    content: format!("[{}]", list),
                })
            } else {
                Ok(EnumValue {
                    value: value.to_string(),
                    description: String::new(),
                })
            }
        })
        .collect()
}

fn check_subtype(ty: &FieldType, subtype: &str) -> Result<FieldType, MsonError> {
    if !ty.accepts_subtype() {
        return Err(MsonError::UnsupportedSubtype {
            ty: ty.to_string(),
            subtype: subtype.to_string(),
        });
    }
    FieldType::parse(subtype)
}

/// @ai:intent Apply one modifier from the parenthesised list; None means it is not a modifier
fn apply_modifier(field: &mut MsonField, item: &str) -> Option<Result<(), MsonError>> {
    match item {
        "required" => field.required = true,
        "optional" => field.required = false,
        "nullable" => field.nullable = true,
        _ if item.starts_with("tag:") => field.vendor_tags.push(item.to_string()),
        _ if item.starts_with("capability:") => {
            field.capability = Some(item["capability:".len()..].trim().to_string());
        }
        _ if field.ty.accepts_subtype() && field.subtype.is_none() => {
            return Some(FieldType::parse(item).map(|sub| field.subtype = Some(sub)));
        }
        _ => return None,
    }
    Some(Ok(()))
}

/// @ai:intent Separate the declaration line(s) from a trailing `+ Members` block
fn split_members(content: &str) -> (String, Vec<String>) {
    let mut header = Vec::new();
    let mut members = Vec::new();
    let mut in_members = false;

    for line in content.lines().map(str::trim) {
        if line.trim_start_matches('+').trim().eq_ignore_ascii_case("members") && line.starts_with('+') {
            in_members = true;
            continue;
        }
        if in_members {
            members.push(line.to_string());
        } else if !line.is_empty() {
            header.push(line);
        }
    }

    (header.join(" "), members)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_field() {
        let field = parse("id `1234` (integer, required, nullable, tag:BUY_TICKETS, capability:NONE) - Movie ID").unwrap();

        assert_eq!(field.identifier, "id");
        assert_eq!(field.sample.as_deref(), Some("1234"));
        assert_eq!(field.ty, FieldType::Integer);
        assert!(field.required);
        assert!(field.nullable);
        assert_eq!(field.vendor_tags, vec!["tag:BUY_TICKETS".to_string()]);
        assert_eq!(field.capability.as_deref(), Some("NONE"));
        assert_eq!(field.description, "Movie ID");
    }

    #[test]
    fn test_parse_members_block_keeps_order() {
        let field = parse("rating (enum) - MPAA rating\n+ Members\n- `R` - Restricted\n- `G` - General audiences\n- `PG`").unwrap();

        let values: Vec<_> = field.values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(values, vec!["R", "G", "PG"]);
        assert_eq!(field.values[1].description, "General audiences");
        assert_eq!(field.values[2].description, "");
    }

    #[test]
    fn test_inline_option_list() {
        let field = parse("sort (enum [title|release_date], optional) - Sort order").unwrap();
        assert_eq!(field.values.len(), 2);
        assert_eq!(field.values[0].value, "title");
    }

    #[test]
    fn test_enum_without_values() {
        assert_eq!(
            parse("rating (enum) - Rating"),
            Err(MsonError::MissingOptions {
                identifier: "rating".to_string(),
                ty: "enum".to_string()
            })
        );
    }

    #[test]
    fn test_unsupported_type() {
        assert_eq!(
            parse("name (varchar) - Name"),
            Err(MsonError::UnsupportedType("varchar".to_string()))
        );
    }

    #[test]
    fn test_subtype_only_on_arrays() {
        let field = parse("cast (array<\\App\\Person>) - Cast").unwrap();
        assert_eq!(field.subtype, Some(FieldType::Representation("\\App\\Person".to_string())));

        let listed = parse("genres (array, string) - Genres").unwrap();
        assert_eq!(listed.subtype, Some(FieldType::String));

        assert!(matches!(
            parse("name (string<uri>) - Name"),
            Err(MsonError::UnsupportedSubtype { .. })
        ));
    }

    #[test]
    fn test_invalid_syntax_names_the_field() {
        let missing_type = parse("name - Name").unwrap_err();
        assert!(matches!(missing_type, MsonError::InvalidSyntax { field: "type", .. }));

        let missing_description = parse("name (string)").unwrap_err();
        assert!(matches!(
            missing_description,
            MsonError::InvalidSyntax { field: "description", .. }
        ));

        let missing_identifier = parse("(string) - Name").unwrap_err();
        assert!(matches!(
            missing_identifier,
            MsonError::InvalidSyntax { field: "identifier", .. }
        ));
    }

    #[test]
    fn test_empty_option_is_rejected() {
        assert!(matches!(
            parse_type_expression("enum [a||b]"),
            Err(MsonError::InvalidSyntax { field: "options", .. })
        ));
    }
}
