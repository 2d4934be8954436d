//! @ai:module:intent Turn tokenized tags into validated annotations, one builder per tag kind
//! @ai:module:layer application
//! @ai:module:public_api build_block, BuiltBlock
//! @ai:module:depends_on docblock, mson, version, config, annotation, error
//! @ai:module:stateless true

use super::http::{self, RepresentationRule, ReturnType};
use super::{Annotation, Field, Parameter, ParameterLocation, Payload};
use crate::config::Config;
use crate::docblock::{tokenize, Docblock, RawTag};
use crate::error::{AnnotationError, Error, MsonError, Origin, Result, Warning};
use crate::mson::{self, FieldType, MsonField};
use crate::version::Version;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static CLASS_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\\\w:]+)(?:<([^>]*)>)?").expect("Invalid regex"));

static FIELD_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][\w.\-]*$").expect("Invalid regex"));

/// @ai:intent Every annotation built from one docblock, plus its description and warnings
#[derive(Debug, Clone, Serialize)]
pub struct BuiltBlock {
    pub origin: Origin,
    pub description: Annotation,
    pub annotations: Vec<Annotation>,
    pub warnings: Vec<Warning>,
}

impl BuiltBlock {
    pub fn short_description(&self) -> Option<&str> {
        match &self.description.payload {
            Payload::Description { short, .. } => short.as_deref(),
            _ => None,
        }
    }

    pub fn long_description(&self) -> Option<&str> {
        match &self.description.payload {
            Payload::Description { long, .. } => long.as_deref(),
            _ => None,
        }
    }

    /// @ai:intent Count annotations produced by a given tag name
    pub fn count(&self, tag_name: &str) -> usize {
        self.annotations
            .iter()
            .filter(|a| a.payload.tag_name() == tag_name)
            .count()
    }
}

/// @ai:intent Build every DSL annotation in a docblock
/// @ai:pre config has been validated
/// @ai:post the first fatal annotation error aborts the block, tagged with the docblock origin
/// @ai:effects pure
pub fn build_block(docblock: &Docblock, config: &Config) -> Result<BuiltBlock> {
    let origin = &docblock.origin;
    let tokens = tokenize(docblock, &config.tag_prefix);
    let builder = TagBuilder { config };
    let mut warnings = Vec::new();
    let mut annotations = Vec::new();
    let mut scoped_version: Option<Version> = None;

    for tag in &tokens.tags {
        report_unknown_decorators(tag, origin, &mut warnings);

        if tag.name == "version" {
            for decorator in &tag.decorators {
                warn(&mut warnings, unsupported(decorator.name(), tag, origin));
            }
            scoped_version = match tag.content.as_str() {
                "*" => None,
                "" => {
                    return Err(Error::annotation(
                        origin,
                        AnnotationError::MissingRequiredField {
                            field: "version",
                            tag: "version".to_string(),
                        },
                    ))
                }
                constraint => Some(
                    Version::parse(constraint).map_err(|e| Error::annotation(origin, e))?,
                ),
            };
            continue;
        }

        let Some(mut annotation) = builder
            .build(tag)
            .map_err(|e| Error::annotation(origin, e))?
        else {
            warn(
                &mut warnings,
                Warning::UnknownTag {
                    tag: tag.name.clone(),
                    origin: origin.clone(),
                },
            );
            continue;
        };

        for decorator in &tag.decorators {
            if let Err(rejected) = annotation.decorate(*decorator) {
                warn(&mut warnings, unsupported(rejected.name(), tag, origin));
            }
        }

        if let Some(version) = &scoped_version {
            if annotation.payload.supports().versioning {
                annotation.set_version(version.clone());
            }
        }

        annotations.push(annotation);
    }

    Ok(BuiltBlock {
        origin: origin.clone(),
        description: Annotation::new(Payload::Description {
            short: tokens.short_description,
            long: tokens.long_description,
        }),
        annotations,
        warnings,
    })
}

fn report_unknown_decorators(tag: &RawTag, origin: &Origin, warnings: &mut Vec<Warning>) {
    for name in &tag.unknown_decorators {
        warn(warnings, unsupported(name, tag, origin));
    }
}

fn unsupported(decorator: &str, tag: &RawTag, origin: &Origin) -> Warning {
    Warning::UnsupportedDecorator {
        decorator: decorator.to_string(),
        tag: tag.name.clone(),
        origin: origin.clone(),
    }
}

fn warn(warnings: &mut Vec<Warning>, warning: Warning) {
    tracing::warn!("{}", warning);
    warnings.push(warning);
}

/// @ai:intent Per-tag parsing and configuration cross-checks
struct TagBuilder<'a> {
    config: &'a Config,
}

impl TagBuilder<'_> {
    /// @ai:intent Dispatch a raw tag to its builder; None for tags this DSL does not define
    fn build(&self, tag: &RawTag) -> std::result::Result<Option<Annotation>, AnnotationError> {
        let content = tag.content.as_str();
        let annotation = match tag.name.as_str() {
            "group" => Annotation::new(Payload::Group {
                name: required(content, "group", "group")?.to_string(),
            }),
            "path" => self.build_path(content)?,
            "pathparam" => Annotation::new(Payload::PathParameter(Parameter {
                location: ParameterLocation::Path,
                field: self.build_field(content)?,
            })),
            "param" => self.build_parameter(content, ParameterLocation::Body)?,
            "queryparam" => self.build_parameter(content, ParameterLocation::Query)?,
            "return" => self.build_return(content)?,
            "throws" | "error" => self.build_throws(content)?,
            "contenttype" => Annotation::new(Payload::ContentType {
                media_type: single_token(content, "media type", "contenttype")?,
            }),
            "scope" => self.build_scope(content)?,
            "vendortag" => {
                let name = single_token(content, "vendor tag", "vendortag")?;
                self.check_tagging(std::slice::from_ref(&name), None)?;
                Annotation::new(Payload::VendorTag { name })
            }
            "capability" => {
                let name = single_token(content, "capability", "capability")?;
                self.check_tagging(&[], Some(&name))?;
                Annotation::new(Payload::Capability { name })
            }
            "minversion" => Annotation::new(Payload::MinVersion {
                version: Version::parse_absolute(required(content, "version", "minversion")?)?,
            }),
            "maxversion" => Annotation::new(Payload::MaxVersion {
                version: Version::parse_absolute(required(content, "version", "maxversion")?)?,
            }),
            "operationid" => Annotation::new(Payload::OperationId {
                id: single_token(content, "operation id", "operationid")?,
            }),
            "field" => {
                let identifier = required(content, "identifier", "field")?;
                if !FIELD_IDENTIFIER.is_match(identifier) {
                    return Err(MsonError::InvalidSyntax {
                        field: "identifier",
                        content: identifier.to_string(),
                    }
                    .into());
                }
                Annotation::new(Payload::RepresentationField {
                    identifier: identifier.to_string(),
                })
            }
            "type" => {
                let expression = mson::parse_type_expression(required(content, "type", "type")?)?;
                Annotation::new(Payload::RepresentationType {
                    ty: self.resolve_field_type(expression.ty)?,
                    subtype: self.resolve_subtype(expression.subtype)?,
                    values: expression.options,
                })
            }
            "data" => self.build_data(content)?,
            _ => return Ok(None),
        };

        Ok(Some(annotation))
    }

    fn build_path(&self, content: &str) -> std::result::Result<Annotation, AnnotationError> {
        let path = required(content, "path", "path")?;
        if !path.starts_with('/') || path.contains(char::is_whitespace) {
            return Err(AnnotationError::InvalidPath(path.to_string()));
        }
        Ok(Annotation::new(Payload::Path {
            path: path.to_string(),
        }))
    }

    fn build_parameter(
        &self,
        content: &str,
        location: ParameterLocation,
    ) -> std::result::Result<Annotation, AnnotationError> {
        let field = self.build_field(content)?;
        let vendor_tags = field.vendor_tags.clone();
        let capability = field.capability.clone();
        let mut annotation = Annotation::new(Payload::Parameter(Parameter { location, field }));
        annotation.set_tagging(vendor_tags, capability);
        Ok(annotation)
    }

    /// @ai:intent Parse an MSON parameter and check its tagging and type against the config
    fn build_field(&self, content: &str) -> std::result::Result<MsonField, AnnotationError> {
        let mut field = mson::parse(content)?;
        self.check_tagging(&field.vendor_tags, field.capability.as_deref())?;
        field.ty = self.resolve_type(field.ty, AnnotationError::UnknownRepresentation)?;
        if let Some(subtype) = field.subtype.take() {
            field.subtype = Some(self.resolve_type(subtype, AnnotationError::UnknownRepresentation)?);
        }
        Ok(field)
    }

    /// @ai:intent `{type} [Representation] [- description]`
    fn build_return(&self, content: &str) -> std::result::Result<Annotation, AnnotationError> {
        let (token, rest) = braced(content).ok_or_else(|| AnnotationError::MissingRequiredField {
            field: "type",
            tag: "return".to_string(),
        })?;
        let return_type =
            ReturnType::parse(token).ok_or_else(|| AnnotationError::UnknownReturnType(token.to_string()))?;
        let rule = return_type.representation_rule();

        let (representation, rest) = match rule {
            RepresentationRule::Forbidden => (None, rest),
            _ => self.split_representation(rest, rule == RepresentationRule::Required),
        };

        let representation = match representation {
            Some(class) => {
                self.config
                    .representation(class)
                    .map_err(|_| AnnotationError::UnknownRepresentation(class.to_string()))?;
                Some(self.canonical(class))
            }
            None if rule == RepresentationRule::Required => {
                return Err(AnnotationError::MissingRequiredField {
                    field: "representation",
                    tag: "return".to_string(),
                })
            }
            None => None,
        };

        Ok(Annotation::new(Payload::Return {
            return_type,
            http_code: return_type.http_code(),
            representation,
            description: description(rest),
        }))
    }

    /// @ai:intent `{code} Representation[<error_code>] [(modifiers)] [- description]`
    fn build_throws(&self, content: &str) -> std::result::Result<Annotation, AnnotationError> {
        let (token, rest) = braced(content).ok_or_else(|| AnnotationError::MissingRequiredField {
            field: "http code",
            tag: "throws".to_string(),
        })?;
        let http_code = token
            .parse::<u16>()
            .ok()
            .filter(|code| http::is_error_code(*code))
            .ok_or_else(|| AnnotationError::UnknownReturnCode(token.to_string()))?;

        let captures = CLASS_REFERENCE
            .captures(rest)
            .ok_or_else(|| AnnotationError::MissingRequiredField {
                field: "representation",
                tag: "throws".to_string(),
            })?;
        let class = captures[1].to_string();
        let error_code = captures
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|code| !code.is_empty());
        let mut rest = rest[captures[0].len()..].trim_start();

        let mut vendor_tags = Vec::new();
        let mut capability = None;
        if let Some(inner) = rest.strip_prefix('(') {
            let close = inner.find(')').ok_or_else(|| MsonError::InvalidSyntax {
                field: "modifiers",
                content: content.to_string(),
            })?;
            for item in inner[..close].split(',').map(str::trim).filter(|i| !i.is_empty()) {
                if item.starts_with("tag:") {
                    vendor_tags.push(item.to_string());
                } else if let Some(name) = item.strip_prefix("capability:") {
                    capability = Some(name.trim().to_string());
                } else {
                    return Err(MsonError::InvalidSyntax {
                        field: "modifiers",
                        content: content.to_string(),
                    }
                    .into());
                }
            }
            rest = inner[close + 1..].trim_start();
        }

        let error_representation = self
            .config
            .error_representation(&class)
            .ok_or_else(|| AnnotationError::UnknownErrorRepresentation(class.clone()))?;
        if error_representation.needs_error_code && error_code.is_none() {
            return Err(AnnotationError::MissingRepresentationErrorCode(class));
        }
        self.check_tagging(&vendor_tags, capability.as_deref())?;

        let mut annotation = Annotation::new(Payload::Throws {
            http_code,
            representation: error_representation.class.clone(),
            error_code,
            description: description(rest),
        });
        annotation.set_tagging(vendor_tags, capability);
        Ok(annotation)
    }

    fn build_scope(&self, content: &str) -> std::result::Result<Annotation, AnnotationError> {
        let content = required(content, "scope", "scope")?;
        let (name, rest) = content
            .split_once(char::is_whitespace)
            .unwrap_or((content, ""));
        if !self.config.has_scope(name) {
            return Err(AnnotationError::InvalidScopeSupplied(name.to_string()));
        }
        Ok(Annotation::new(Payload::Scope {
            name: name.to_string(),
            description: description(rest),
        }))
    }

    fn build_data(&self, content: &str) -> std::result::Result<Annotation, AnnotationError> {
        let parsed = mson::parse(content)?;
        self.check_tagging(&parsed.vendor_tags, parsed.capability.as_deref())?;

        let vendor_tags = parsed.vendor_tags.clone();
        let capability = parsed.capability.clone();
        let mut field = Field::from(parsed);
        field.ty = self.resolve_field_type(field.ty)?;
        field.subtype = self.resolve_subtype(field.subtype)?;

        let mut annotation = Annotation::new(Payload::RepresentationData(field));
        annotation.set_tagging(vendor_tags, capability);
        Ok(annotation)
    }

    /// @ai:intent Vendor tags and capabilities must appear in their configured allow-lists
    fn check_tagging(
        &self,
        vendor_tags: &[String],
        capability: Option<&str>,
    ) -> std::result::Result<(), AnnotationError> {
        if let Some(tag) = vendor_tags.iter().find(|t| !self.config.has_vendor_tag(t)) {
            return Err(AnnotationError::InvalidVendorTagSupplied(tag.clone()));
        }
        if let Some(capability) = capability.filter(|c| !self.config.has_capability(c)) {
            return Err(AnnotationError::InvalidCapabilitySupplied(capability.to_string()));
        }
        Ok(())
    }

    fn resolve_field_type(&self, ty: FieldType) -> std::result::Result<FieldType, AnnotationError> {
        self.resolve_type(ty, AnnotationError::UnconfiguredRepresentation)
    }

    fn resolve_subtype(
        &self,
        subtype: Option<FieldType>,
    ) -> std::result::Result<Option<FieldType>, AnnotationError> {
        subtype.map(|s| self.resolve_field_type(s)).transpose()
    }

    /// @ai:intent Representation references must be registered (or explicitly excluded)
    fn resolve_type(
        &self,
        ty: FieldType,
        unknown: fn(String) -> AnnotationError,
    ) -> std::result::Result<FieldType, AnnotationError> {
        match ty {
            FieldType::Representation(class) => {
                self.config.representation(&class).map_err(|_| unknown(class.clone()))?;
                Ok(FieldType::Representation(self.canonical(&class)))
            }
            other => Ok(other),
        }
    }

    fn canonical(&self, class: &str) -> String {
        self.config.canonical_class(class).unwrap_or(class).to_string()
    }

    /// @ai:intent Split a leading representation reference from the rest of a return tag
    fn split_representation<'c>(&self, rest: &'c str, force: bool) -> (Option<&'c str>, &'c str) {
        let (word, after) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let is_reference = !word.is_empty()
            && !word.starts_with('-')
            && (force || word.starts_with('\\') || self.config.canonical_class(word).is_some());

        if is_reference {
            (Some(word), after.trim_start())
        } else {
            (None, rest)
        }
    }
}

fn required<'c>(
    content: &'c str,
    field: &'static str,
    tag: &str,
) -> std::result::Result<&'c str, AnnotationError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AnnotationError::MissingRequiredField {
            field,
            tag: tag.to_string(),
        });
    }
    Ok(content)
}

fn single_token(
    content: &str,
    field: &'static str,
    tag: &str,
) -> std::result::Result<String, AnnotationError> {
    let content = required(content, field, tag)?;
    if content.contains(char::is_whitespace) {
        return Err(MsonError::InvalidSyntax {
            field,
            content: content.to_string(),
        }
        .into());
    }
    Ok(content.to_string())
}

/// @ai:example ("{404} Error") -> Some(("404", "Error"))
fn braced(content: &str) -> Option<(&str, &str)> {
    let inner = content.trim_start().strip_prefix('{')?;
    let close = inner.find('}')?;
    Some((inner[..close].trim(), inner[close + 1..].trim()))
}

fn description(rest: &str) -> Option<String> {
    let rest = rest.trim();
    let rest = rest.strip_prefix('-').unwrap_or(rest).trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Faceted;
    use crate::version::VersionNumber;

    const CONFIG: &str = r#"
vendor_tags = ["tag:BUY_TICKETS", "tag:FEATURE_FLAG"]
scopes = ["public", "edit"]
capabilities = ["NONE", "BUY_TICKETS"]
excluded_representations = ["Internal"]

[[versions]]
version = "1.0"

[[versions]]
version = "1.1"

[[representations]]
class = "Movie"
method = "create"

[[error_representations]]
class = "\\App\\Error"
method = "create"
needs_error_code = true

[[error_representations]]
class = "NotFound"
method = "create"
"#;

    fn config() -> Config {
        Config::from_toml_str(CONFIG).unwrap()
    }

    fn build(text: &str) -> Result<BuiltBlock> {
        build_block(
            &Docblock::new(text, Origin::method("MovieController", "GET")),
            &config(),
        )
    }

    fn error_of(text: &str) -> AnnotationError {
        build(text)
            .unwrap_err()
            .annotation_error()
            .cloned()
            .expect("annotation error")
    }

    #[test]
    fn test_build_group_and_paths() {
        let block = build("@api-group Movies\n@api-path /movies/{id}\n@api-path:private:alias /movie/{id}").unwrap();

        assert_eq!(block.annotations.len(), 3);
        assert!(block.annotations[1].is_visible());
        assert!(!block.annotations[2].is_visible());
        assert!(block.annotations[2].is_aliased());
        assert!(block.warnings.is_empty());
    }

    #[test]
    fn test_unsupported_decorator_is_a_warning() {
        let block = build("@api-group:private Movies\n@api-path:bogus /movies").unwrap();

        assert_eq!(block.annotations.len(), 2);
        assert_eq!(block.warnings.len(), 2);
        assert!(matches!(
            &block.warnings[0],
            Warning::UnsupportedDecorator { decorator, tag, .. } if decorator == "private" && tag == "group"
        ));
    }

    #[test]
    fn test_return_with_representation() {
        let block = build("@api-return:private {collection} Movie - All movies").unwrap();

        match &block.annotations[0].payload {
            Payload::Return {
                http_code,
                representation,
                description,
                ..
            } => {
                assert_eq!(*http_code, 200);
                assert_eq!(representation.as_deref(), Some("Movie"));
                assert_eq!(description.as_deref(), Some("All movies"));
            }
            other => panic!("unexpected payload {:?}", other),
        }
        assert!(!block.annotations[0].is_visible());
    }

    #[test]
    fn test_return_forbidden_representation_is_description() {
        let block = build("@api-return {notmodified} If nothing changed").unwrap();
        match &block.annotations[0].payload {
            Payload::Return {
                http_code,
                representation,
                description,
                ..
            } => {
                assert_eq!(*http_code, 304);
                assert_eq!(*representation, None);
                assert_eq!(description.as_deref(), Some("If nothing changed"));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_return_errors() {
        assert_eq!(
            error_of("@api-return {object}"),
            AnnotationError::MissingRequiredField {
                field: "representation",
                tag: "return".to_string()
            }
        );
        assert_eq!(
            error_of("@api-return {object} Person"),
            AnnotationError::UnknownRepresentation("Person".to_string())
        );
        assert_eq!(
            error_of("@api-return {fine} Movie"),
            AnnotationError::UnknownReturnType("fine".to_string())
        );
    }

    #[test]
    fn test_throws_requires_error_code_when_configured() {
        assert_eq!(
            error_of("@api-throws {404} \\App\\Error"),
            AnnotationError::MissingRepresentationErrorCode("\\App\\Error".to_string())
        );

        let block = build("@api-throws {404} \\App\\Error<1337> (tag:BUY_TICKETS) - Movie not found").unwrap();
        match &block.annotations[0].payload {
            Payload::Throws {
                http_code,
                error_code,
                description,
                ..
            } => {
                assert_eq!(*http_code, 404);
                assert_eq!(error_code.as_deref(), Some("1337"));
                assert_eq!(description.as_deref(), Some("Movie not found"));
            }
            other => panic!("unexpected payload {:?}", other),
        }
        assert_eq!(block.annotations[0].vendor_tags(), ["tag:BUY_TICKETS".to_string()]);
    }

    #[test]
    fn test_throws_validation() {
        assert_eq!(
            error_of("@api-throws {299} NotFound"),
            AnnotationError::UnknownReturnCode("299".to_string())
        );
        assert_eq!(
            error_of("@api-throws {404} Movie"),
            AnnotationError::UnknownErrorRepresentation("Movie".to_string())
        );
        assert_eq!(
            error_of("@api-throws {404} NotFound (tag:NOPE)"),
            AnnotationError::InvalidVendorTagSupplied("tag:NOPE".to_string())
        );
    }

    #[test]
    fn test_config_allow_lists() {
        assert_eq!(
            error_of("@api-scope admin"),
            AnnotationError::InvalidScopeSupplied("admin".to_string())
        );
        assert_eq!(
            error_of("@api-vendortag tag:NOPE"),
            AnnotationError::InvalidVendorTagSupplied("tag:NOPE".to_string())
        );
        assert_eq!(
            error_of("@api-capability ROOT"),
            AnnotationError::InvalidCapabilitySupplied("ROOT".to_string())
        );
        assert_eq!(
            error_of("@api-queryparam page (integer, capability:ROOT) - Page"),
            AnnotationError::InvalidCapabilitySupplied("ROOT".to_string())
        );
    }

    #[test]
    fn test_path_parameter_checks_tagging_and_type() {
        assert_eq!(
            error_of("@api-pathparam id (integer, tag:BOGUS) - Movie ID"),
            AnnotationError::InvalidVendorTagSupplied("tag:BOGUS".to_string())
        );
        assert_eq!(
            error_of("@api-pathparam id (integer, capability:ROOT) - Movie ID"),
            AnnotationError::InvalidCapabilitySupplied("ROOT".to_string())
        );
        assert_eq!(
            error_of("@api-pathparam id (Person) - Movie ID"),
            AnnotationError::UnknownRepresentation("Person".to_string())
        );

        let block = build("@api-pathparam id (integer, tag:BUY_TICKETS) - Movie ID").unwrap();
        assert!(matches!(&block.annotations[0].payload, Payload::PathParameter(_)));
    }

    #[test]
    fn test_single_token_tags_reject_trailing_tokens() {
        assert_eq!(
            error_of("@api-vendortag tag:BUY_TICKETS tag:BOGUS"),
            AnnotationError::Mson(MsonError::InvalidSyntax {
                field: "vendor tag",
                content: "tag:BUY_TICKETS tag:BOGUS".to_string(),
            })
        );
        assert_eq!(
            error_of("@api-capability NONE ROOT"),
            AnnotationError::Mson(MsonError::InvalidSyntax {
                field: "capability",
                content: "NONE ROOT".to_string(),
            })
        );
        assert!(matches!(
            error_of("@api-contenttype application/json text/html"),
            AnnotationError::Mson(MsonError::InvalidSyntax { field: "media type", .. })
        ));
        assert!(matches!(
            error_of("@api-operationid getMovie extra"),
            AnnotationError::Mson(MsonError::InvalidSyntax { field: "operation id", .. })
        ));
    }

    #[test]
    fn test_error_carries_origin() {
        let err = build("@api-scope admin").unwrap_err();
        match err {
            Error::Annotation { origin, .. } => {
                assert_eq!(origin.class, "MovieController");
                assert_eq!(origin.method.as_deref(), Some("GET"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_max_version_requires_absolute() {
        assert_eq!(
            error_of("@api-maxversion ~1.2"),
            AnnotationError::Version(crate::error::VersionError::AbsoluteVersionRequired(
                "~1.2".to_string()
            ))
        );

        let block = build("@api-maxversion 1.2").unwrap();
        match &block.annotations[0].payload {
            Payload::MaxVersion { version } => {
                assert_eq!(version, &VersionNumber::parse("1.2").unwrap());
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_version_scope_applies_to_following_tags() {
        let block = build(
            "@api-contenttype application/json\n@api-version 1.1 -\n@api-contenttype application/vnd.movie+json\n@api-group Movies\n@api-version *\n@api-queryparam page (integer) - Page",
        )
        .unwrap();

        assert_eq!(block.annotations[0].version(), None);
        assert_eq!(block.annotations[1].version().unwrap().as_str(), "1.1 -");
        assert_eq!(block.annotations[2].version(), None);
        assert_eq!(block.annotations[3].version(), None);
    }

    #[test]
    fn test_data_field_with_unconfigured_reference() {
        assert_eq!(
            error_of("@api-data director (Person) - Director"),
            AnnotationError::UnconfiguredRepresentation("Person".to_string())
        );

        let block = build("@api-data:deprecated internal (Internal) - Hidden details").unwrap();
        assert!(block.annotations[0].is_deprecated());
    }

    #[test]
    fn test_unknown_dsl_tag_warns() {
        let block = build("@api-label Something\n@api-group Movies").unwrap();
        assert_eq!(block.annotations.len(), 1);
        assert!(matches!(block.warnings[0], Warning::UnknownTag { .. }));
    }

    #[test]
    fn test_public_decorator_after_private() {
        let block = build("@api-param:private:public title (string) - Title").unwrap();
        assert!(block.annotations[0].is_visible());
        assert!(!block.annotations[0].is_deprecated());
    }
}
