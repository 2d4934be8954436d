//! @ai:module:intent Assemble one resource action per declared path and derive filtered per-version views of it
//! @ai:module:layer domain
//! @ai:module:public_api ResourceAction, HTTP_METHODS, http_method, placeholders
//! @ai:module:depends_on annotation, config, filter, version, error
//! @ai:module:stateless true

use crate::annotation::{Annotation, BuiltBlock, Faceted, Parameter, Payload};
use crate::config::Config;
use crate::error::{AnnotationError, Error, Result, VersionError};
use crate::filter::FilterPolicy;
use crate::version::VersionNumber;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}/]+)\}").expect("Invalid regex"));

pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// @ai:intent Map a controller method name onto its HTTP method
/// @ai:example ("get") -> Ok("GET")
/// @ai:example ("fetch") -> Err(UnsupportedHttpMethod)
pub fn http_method(name: &str) -> std::result::Result<String, AnnotationError> {
    let upper = name.to_ascii_uppercase();
    if HTTP_METHODS.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(AnnotationError::UnsupportedHttpMethod(name.to_string()))
    }
}

/// @ai:intent One HTTP method on one concrete path with every annotation that describes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAction {
    pub class: String,
    pub method: String,
    pub path: String,
    pub clean_path: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub group: String,
    pub operation_id: Option<String>,
    pub visible: bool,
    pub deprecated: bool,
    pub aliased: bool,
    /// Aliased paths of the same method; only set on the primary path
    pub aliases: Vec<String>,
    pub vendor_tags: Vec<String>,
    pub capability: Option<String>,
    pub min_version: Option<VersionNumber>,
    pub max_version: Option<VersionNumber>,
    pub path_parameters: Vec<Annotation>,
    pub parameters: Vec<Annotation>,
    pub returns: Vec<Annotation>,
    pub throws: Vec<Annotation>,
    pub content_types: Vec<Annotation>,
    pub scopes: Vec<Annotation>,
}

/// Annotations of a method docblock sorted by role
#[derive(Default)]
struct MethodParts<'a> {
    group: Option<&'a str>,
    operation_id: Option<&'a str>,
    capability: Option<&'a str>,
    min_version: Option<&'a VersionNumber>,
    max_version: Option<&'a VersionNumber>,
    paths: Vec<&'a Annotation>,
    vendor_tags: Vec<String>,
    path_parameters: Vec<&'a Annotation>,
    parameters: Vec<Annotation>,
    returns: Vec<Annotation>,
    throws: Vec<Annotation>,
    content_types: Vec<Annotation>,
    scopes: Vec<Annotation>,
}

impl<'a> MethodParts<'a> {
    fn collect(block: &'a BuiltBlock) -> std::result::Result<Self, AnnotationError> {
        let mut parts = MethodParts::default();

        for annotation in &block.annotations {
            match &annotation.payload {
                Payload::Group { name } => once(&mut parts.group, name.as_str(), "group")?,
                Payload::OperationId { id } => {
                    once(&mut parts.operation_id, id.as_str(), "operationid")?
                }
                Payload::Capability { name } => {
                    once(&mut parts.capability, name.as_str(), "capability")?
                }
                Payload::MinVersion { version } => once(&mut parts.min_version, version, "minversion")?,
                Payload::MaxVersion { version } => once(&mut parts.max_version, version, "maxversion")?,
                Payload::Path { .. } => parts.paths.push(annotation),
                Payload::VendorTag { name } => parts.vendor_tags.push(name.clone()),
                Payload::PathParameter(_) => parts.path_parameters.push(annotation),
                Payload::Parameter(_) => parts.parameters.push(annotation.clone()),
                Payload::Return { .. } => parts.returns.push(annotation.clone()),
                Payload::Throws { .. } => parts.throws.push(annotation.clone()),
                Payload::ContentType { .. } => parts.content_types.push(annotation.clone()),
                Payload::Scope { .. } => parts.scopes.push(annotation.clone()),
                // representation tags have no meaning on a controller method
                _ => {}
            }
        }

        if let (Some(min), Some(max)) = (parts.min_version, parts.max_version) {
            if max < min {
                return Err(VersionError::InvertedRange(format!("{} - {}", min, max)).into());
            }
        }

        Ok(parts)
    }
}

fn once<'a, T: ?Sized>(
    slot: &mut Option<&'a T>,
    value: &'a T,
    tag: &str,
) -> std::result::Result<(), AnnotationError> {
    if slot.is_some() {
        return Err(AnnotationError::DuplicateAnnotation {
            tag: tag.to_string(),
        });
    }
    *slot = Some(value);
    Ok(())
}

fn missing(field: &'static str) -> AnnotationError {
    AnnotationError::MissingRequiredField {
        field,
        tag: field.to_string(),
    }
}

/// @ai:intent Placeholder names of a path, in order
/// @ai:example ("/movies/{id}/showtimes/{date}") -> ["id", "date"]
pub fn placeholders(path: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(path)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

fn path_parameter_name(annotation: &Annotation) -> &str {
    match &annotation.payload {
        Payload::PathParameter(Parameter { field, .. }) => &field.identifier,
        _ => "",
    }
}

impl ResourceAction {
    /// @ai:intent Build one canonical, unfiltered action per declared path of a method
    /// @ai:pre block was built from the docblock of `class::method_name`
    /// @ai:post aliased paths get `<operationid>_alt<n>` numbered in declaration order
    /// @ai:effects pure
    pub fn from_block(
        class: &str,
        method_name: &str,
        block: &BuiltBlock,
        config: &Config,
    ) -> Result<Vec<ResourceAction>> {
        Self::assemble(class, method_name, block, config)
            .map_err(|e| Error::annotation(&block.origin, e))
    }

    fn assemble(
        class: &str,
        method_name: &str,
        block: &BuiltBlock,
        config: &Config,
    ) -> std::result::Result<Vec<ResourceAction>, AnnotationError> {
        let method = http_method(method_name)?;
        let parts = MethodParts::collect(block)?;
        let group = parts.group.ok_or_else(|| missing("group"))?;
        if parts.paths.is_empty() {
            return Err(missing("path"));
        }
        if parts.returns.is_empty() {
            return Err(missing("return"));
        }
        if parts.content_types.is_empty() {
            return Err(missing("contenttype"));
        }

        let paths: Vec<(&Annotation, &str)> = parts
            .paths
            .iter()
            .filter_map(|a| match &a.payload {
                Payload::Path { path } => Some((*a, path.as_str())),
                _ => None,
            })
            .collect();

        for parameter in &parts.path_parameters {
            let name = path_parameter_name(parameter);
            if !paths.iter().any(|(_, path)| placeholders(path).contains(&name)) {
                return Err(AnnotationError::UnknownPathParameter(name.to_string()));
            }
        }

        let aliases: Vec<String> = paths
            .iter()
            .filter(|(a, _)| a.is_aliased())
            .map(|(_, path)| path.to_string())
            .collect();

        let mut alias_index = 0;
        let mut actions = Vec::with_capacity(paths.len());
        for (annotation, path) in paths {
            let operation_id = if annotation.is_aliased() {
                alias_index += 1;
                parts.operation_id.map(|id| format!("{}_alt{}", id, alias_index))
            } else {
                parts.operation_id.map(str::to_string)
            };

            let present = placeholders(path);
            let path_parameters = parts
                .path_parameters
                .iter()
                .filter(|p| present.contains(&path_parameter_name(p)))
                .map(|p| (*p).clone())
                .collect();

            actions.push(ResourceAction {
                class: class.to_string(),
                method: method.clone(),
                path: path.to_string(),
                clean_path: clean_path(path, config),
                label: block.short_description().map(str::to_string),
                description: block.long_description().map(str::to_string),
                group: group.to_string(),
                operation_id,
                visible: annotation.is_visible(),
                deprecated: annotation.is_deprecated(),
                aliased: annotation.is_aliased(),
                aliases: if annotation.is_aliased() {
                    Vec::new()
                } else {
                    aliases.clone()
                },
                vendor_tags: parts.vendor_tags.clone(),
                capability: parts.capability.map(str::to_string),
                min_version: parts.min_version.cloned(),
                max_version: parts.max_version.cloned(),
                path_parameters,
                parameters: parts.parameters.clone(),
                returns: parts.returns.clone(),
                throws: parts.throws.clone(),
                content_types: parts.content_types.clone(),
                scopes: parts.scopes.clone(),
            });
        }

        Ok(actions)
    }

    /// @ai:intent Stable identifier within a snapshot
    /// @ai:example () -> "/movies/{id}::GET"
    pub fn identifier(&self) -> String {
        format!("{}::{}", self.path, self.method)
    }

    /// @ai:intent Whether min/max version bounds admit a version (both inclusive)
    pub fn supports_version(&self, version: &VersionNumber) -> bool {
        self.min_version.as_ref().map(|min| version >= min).unwrap_or(true)
            && self.max_version.as_ref().map(|max| version <= max).unwrap_or(true)
    }

    /// @ai:intent Filtered projection under a visibility/vendor-tag policy
    /// @ai:post None when the path itself is rejected; applying the same policy again is a no-op
    /// @ai:effects pure
    pub fn filtered(&self, policy: &FilterPolicy) -> Option<ResourceAction> {
        if !policy.should_parse_path(self.visible, &self.vendor_tags) {
            return None;
        }
        Some(self.project(|annotation| policy.allows(annotation)))
    }

    /// @ai:intent Projection for one API version
    /// @ai:post None when min/max bounds exclude the version
    /// @ai:effects pure
    pub fn for_version(&self, version: &VersionNumber) -> Option<ResourceAction> {
        if !self.supports_version(version) {
            return None;
        }
        Some(self.project(|annotation| annotation.applies_to(version)))
    }

    /// @ai:intent Representation classes referenced by returns and errors
    pub fn referenced_representations(&self) -> impl Iterator<Item = &str> {
        self.returns
            .iter()
            .chain(self.throws.iter())
            .filter_map(|annotation| match &annotation.payload {
                Payload::Return { representation, .. } => representation.as_deref(),
                Payload::Throws { representation, .. } => Some(representation.as_str()),
                _ => None,
            })
    }

    fn project(&self, keep: impl Fn(&Annotation) -> bool) -> ResourceAction {
        let retain = |annotations: &[Annotation]| -> Vec<Annotation> {
            annotations.iter().filter(|a| keep(a)).cloned().collect()
        };

        ResourceAction {
            path_parameters: retain(&self.path_parameters),
            parameters: retain(&self.parameters),
            returns: retain(&self.returns),
            throws: retain(&self.throws),
            content_types: retain(&self.content_types),
            scopes: retain(&self.scopes),
            ..self.clone()
        }
    }
}

/// @ai:intent Apply configured placeholder translations to a path
/// @ai:example ("/movies/{id}") -> "/movies/{movie_id}" with id = "movie_id"
fn clean_path(path: &str, config: &Config) -> String {
    PLACEHOLDER
        .replace_all(path, |captures: &regex::Captures| {
            format!("{{{}}}", config.translate_path_param(&captures[1]))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::build_block;
    use crate::docblock::Docblock;
    use crate::error::Origin;

    const CONFIG: &str = r#"
vendor_tags = ["tag:BUY_TICKETS"]
scopes = ["public"]

[[versions]]
version = "1.0"

[[versions]]
version = "1.1"

[[representations]]
class = "Movie"
method = "create"

[path_param_translations]
id = "movie_id"
"#;

    const GET_MOVIE: &str = "Get a single movie.

@api-group Movies
@api-path /movies/{id}
@api-path:alias /movie/{id}
@api-path:alias:private /films/{id}
@api-operationid getMovie
@api-pathparam id `1234` (integer) - Movie ID
@api-scope public
@api-contenttype application/json
@api-return {object} Movie
@api-version 1.1 -
@api-queryparam locale (string) - Locale";

    fn actions(text: &str) -> Result<Vec<ResourceAction>> {
        let config = Config::from_toml_str(CONFIG).unwrap();
        let block = build_block(
            &Docblock::new(text, Origin::method("MovieController", "get")),
            &config,
        )?;
        ResourceAction::from_block("MovieController", "get", &block, &config)
    }

    #[test]
    fn test_one_action_per_path_with_alias_ids() {
        let actions = actions(GET_MOVIE).unwrap();

        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].identifier(), "/movies/{id}::GET");
        assert_eq!(actions[0].clean_path, "/movies/{movie_id}");
        assert_eq!(actions[0].operation_id.as_deref(), Some("getMovie"));
        assert_eq!(actions[0].aliases, vec!["/movie/{id}".to_string(), "/films/{id}".to_string()]);
        assert_eq!(actions[1].operation_id.as_deref(), Some("getMovie_alt1"));
        assert_eq!(actions[2].operation_id.as_deref(), Some("getMovie_alt2"));
        assert!(!actions[2].visible);
        assert_eq!(actions[0].label.as_deref(), Some("Get a single movie."));
    }

    #[test]
    fn test_only_present_path_parameters_are_attached() {
        let text = "@api-group Movies
@api-path /movies/{id}
@api-path /movies
@api-pathparam id (integer) - Movie ID
@api-contenttype application/json
@api-return {collection} Movie";
        let actions = actions(text).unwrap();

        assert_eq!(actions[0].path_parameters.len(), 1);
        assert!(actions[1].path_parameters.is_empty());
    }

    #[test]
    fn test_unknown_path_parameter() {
        let text = "@api-group Movies
@api-path /movies
@api-pathparam id (integer) - Movie ID
@api-contenttype application/json
@api-return {collection} Movie";
        let err = actions(text).unwrap_err();
        assert_eq!(
            err.annotation_error(),
            Some(&AnnotationError::UnknownPathParameter("id".to_string()))
        );
    }

    #[test]
    fn test_required_tags() {
        let err = actions("@api-path /movies\n@api-contenttype application/json\n@api-return {ok}").unwrap_err();
        assert_eq!(
            err.annotation_error(),
            Some(&AnnotationError::MissingRequiredField {
                field: "group",
                tag: "group".to_string()
            })
        );
    }

    #[test]
    fn test_unsupported_http_method() {
        let config = Config::from_toml_str(CONFIG).unwrap();
        let block = build_block(
            &Docblock::new(GET_MOVIE, Origin::method("MovieController", "fetch")),
            &config,
        )
        .unwrap();
        let err = ResourceAction::from_block("MovieController", "fetch", &block, &config).unwrap_err();

        assert_eq!(
            err.annotation_error(),
            Some(&AnnotationError::UnsupportedHttpMethod("fetch".to_string()))
        );
    }

    #[test]
    fn test_version_projection_drops_unsatisfied_annotations() {
        let action = actions(GET_MOVIE).unwrap().remove(0);
        let v10 = VersionNumber::parse("1.0").unwrap();
        let v11 = VersionNumber::parse("1.1").unwrap();

        assert!(action.for_version(&v10).unwrap().parameters.is_empty());
        assert_eq!(action.for_version(&v11).unwrap().parameters.len(), 1);
        assert_eq!(action.parameters.len(), 1);
    }

    #[test]
    fn test_min_max_bounds() {
        let text = format!("{}\n@api-minversion 1.1\n@api-maxversion 1.1", GET_MOVIE);
        let action = actions(&text).unwrap().remove(0);

        assert!(action.for_version(&VersionNumber::parse("1.0").unwrap()).is_none());
        assert!(action.supports_version(&VersionNumber::parse("1.1.0").unwrap()));
        assert!(!action.supports_version(&VersionNumber::parse("1.2").unwrap()));
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let text = format!("{}\n@api-version *\n@api-param:private secret (string) - Hidden", GET_MOVIE);
        let action = actions(&text).unwrap().remove(0);
        let policy = FilterPolicy::default();

        let once = action.filtered(&policy).unwrap();
        let twice = once.filtered(&policy).unwrap();

        assert_eq!(once.parameters.len(), 1);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_private_path_filtered_out() {
        let hidden = actions(GET_MOVIE).unwrap().remove(2);
        assert!(hidden.filtered(&FilterPolicy::default()).is_none());
        assert!(hidden.filtered(&FilterPolicy::new(true, None)).is_some());
    }
}
