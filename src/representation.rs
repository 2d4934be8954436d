//! @ai:module:intent Assemble documented data shapes from their field docblocks
//! @ai:module:layer domain
//! @ai:module:public_api Representation, RepresentationField
//! @ai:module:depends_on annotation, filter, version, error
//! @ai:module:stateless true

use crate::annotation::{BuiltBlock, Faceted, Facets, Field, Payload, Supports};
use crate::error::{AnnotationError, Error, MsonError, Result};
use crate::filter::FilterPolicy;
use crate::mson::{EnumValue, FieldType};
use crate::version::VersionNumber;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const FIELD_SUPPORTS: Supports = Supports {
    visibility: true,
    deprecation: true,
    aliasing: false,
    versioning: true,
    vendor_tags: true,
};

/// @ai:intent A single documented field with the facets of the tags that declared it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentationField {
    #[serde(flatten)]
    pub field: Field,
    pub facets: Facets,
}

impl Faceted for RepresentationField {
    fn supports(&self) -> Supports {
        FIELD_SUPPORTS
    }

    fn facets(&self) -> &Facets {
        &self.facets
    }
}

/// @ai:intent A documented data shape keyed by (dotted) field identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Representation {
    pub class: String,
    pub label: String,
    pub description: Option<String>,
    pub fields: BTreeMap<String, RepresentationField>,
}

/// Pending `field` + `type` pair inside one docblock
#[derive(Default)]
struct FieldPair<'a> {
    identifier: Option<(&'a str, &'a Facets)>,
    ty: Option<(&'a FieldType, &'a Option<FieldType>, &'a [EnumValue], &'a Facets)>,
}

impl Representation {
    /// @ai:intent Build a representation from its class docblock and field docblocks
    /// @ai:pre blocks are in declaration order
    /// @ai:post every field identifier is unique; field/type pairs are complete
    /// @ai:effects pure
    pub fn from_blocks(
        class: &str,
        header: Option<&BuiltBlock>,
        blocks: &[BuiltBlock],
    ) -> Result<Self> {
        let mut fields = BTreeMap::new();

        for block in blocks {
            for field in fields_of(block).map_err(|e| Error::annotation(&block.origin, e))? {
                let identifier = field.field.identifier.clone();
                if fields.insert(identifier.clone(), field).is_some() {
                    return Err(Error::annotation(
                        &block.origin,
                        AnnotationError::DuplicateAnnotation { tag: identifier },
                    ));
                }
            }
        }

        Ok(Representation {
            class: class.to_string(),
            label: header
                .and_then(BuiltBlock::short_description)
                .unwrap_or(class)
                .to_string(),
            description: header
                .and_then(BuiltBlock::long_description)
                .map(str::to_string),
            fields,
        })
    }

    /// @ai:intent Fields kept under a visibility/vendor-tag policy
    pub fn filtered(&self, policy: &FilterPolicy) -> Representation {
        self.retain(|field| policy.allows(field))
    }

    /// @ai:intent Fields that apply to one API version
    pub fn for_version(&self, version: &VersionNumber) -> Representation {
        self.retain(|field| field.applies_to(version))
    }

    /// @ai:intent (field identifier, referenced class) for every field pointing at another representation
    pub fn references(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter_map(|(identifier, field)| {
                field
                    .field
                    .referenced_representation()
                    .map(|class| (identifier.clone(), class.to_string()))
            })
            .collect()
    }

    /// @ai:intent Copy another representation's fields under `prefix.`
    /// @ai:post explicitly declared fields are never overwritten
    pub fn inline(&mut self, prefix: &str, other: &Representation) {
        for (identifier, field) in &other.fields {
            let dotted = format!("{}.{}", prefix, identifier);
            self.fields.entry(dotted.clone()).or_insert_with(|| {
                let mut field = field.clone();
                field.field.identifier = dotted;
                field
            });
        }
    }

    fn retain(&self, keep: impl Fn(&RepresentationField) -> bool) -> Representation {
        Representation {
            fields: self
                .fields
                .iter()
                .filter(|(_, field)| keep(field))
                .map(|(identifier, field)| (identifier.clone(), field.clone()))
                .collect(),
            ..self.clone()
        }
    }
}

/// @ai:intent Every field a single docblock declares
fn fields_of(block: &BuiltBlock) -> std::result::Result<Vec<RepresentationField>, AnnotationError> {
    let mut fields = Vec::new();
    let mut pair = FieldPair::default();

    for annotation in &block.annotations {
        match &annotation.payload {
            Payload::RepresentationData(field) => fields.push(RepresentationField {
                field: field.clone(),
                facets: annotation.facets.clone(),
            }),
            Payload::RepresentationField { identifier } => {
                if pair.identifier.is_some() {
                    return Err(AnnotationError::DuplicateAnnotation {
                        tag: "field".to_string(),
                    });
                }
                pair.identifier = Some((identifier.as_str(), &annotation.facets));
            }
            Payload::RepresentationType { ty, subtype, values } => {
                if pair.ty.is_some() {
                    return Err(AnnotationError::DuplicateAnnotation {
                        tag: "type".to_string(),
                    });
                }
                pair.ty = Some((ty, subtype, values.as_slice(), &annotation.facets));
            }
            _ => {}
        }
    }

    match (pair.identifier, pair.ty) {
        (None, None) => {}
        (Some(_), None) => {
            return Err(AnnotationError::MissingRequiredField {
                field: "type",
                tag: "field".to_string(),
            })
        }
        (None, Some(_)) => {
            return Err(AnnotationError::MissingRequiredField {
                field: "field",
                tag: "type".to_string(),
            })
        }
        (Some((identifier, field_facets)), Some((ty, subtype, values, type_facets))) => {
            if *ty == FieldType::Enum && values.is_empty() {
                return Err(MsonError::MissingOptions {
                    identifier: identifier.to_string(),
                    ty: ty.to_string(),
                }
                .into());
            }
            let description = block.short_description().ok_or_else(|| {
                AnnotationError::MissingRequiredField {
                    field: "description",
                    tag: "field".to_string(),
                }
            })?;

            fields.push(RepresentationField {
                field: Field {
                    identifier: identifier.to_string(),
                    sample: None,
                    ty: ty.clone(),
                    subtype: subtype.clone(),
                    nullable: false,
                    required: false,
                    values: values.to_vec(),
                    description: description.to_string(),
                },
                facets: merge_facets(field_facets, type_facets),
            });
        }
    }

    Ok(fields)
}

/// @ai:intent Combine the decorators of a field tag and its type tag
fn merge_facets(field: &Facets, ty: &Facets) -> Facets {
    let mut vendor_tags = field.vendor_tags.clone();
    for tag in &ty.vendor_tags {
        if !vendor_tags.contains(tag) {
            vendor_tags.push(tag.clone());
        }
    }

    Facets {
        visible: field.visible && ty.visible,
        deprecated: field.deprecated || ty.deprecated,
        aliased: false,
        aliases: Vec::new(),
        version: field.version.clone().or_else(|| ty.version.clone()),
        vendor_tags,
        capability: field.capability.clone().or_else(|| ty.capability.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::build_block;
    use crate::config::Config;
    use crate::docblock::Docblock;
    use crate::error::Origin;

    const CONFIG: &str = r#"
vendor_tags = ["tag:BUY_TICKETS"]

[[versions]]
version = "1.0"

[[versions]]
version = "1.1"

[[representations]]
class = "Movie"
method = "create"

[[representations]]
class = "Person"
method = "create"
"#;

    fn blocks(texts: &[&str]) -> Result<Vec<BuiltBlock>> {
        let config = Config::from_toml_str(CONFIG).unwrap();
        texts
            .iter()
            .map(|text| build_block(&Docblock::new(*text, Origin::method("Movie", "create")), &config))
            .collect()
    }

    fn movie(texts: &[&str]) -> Result<Representation> {
        Representation::from_blocks("Movie", None, &blocks(texts)?)
    }

    #[test]
    fn test_data_and_field_type_styles() {
        let representation = movie(&[
            "@api-data id (integer) - Movie ID\n@api-data:private internal_note (string) - Note",
            "The movie title.\n\n@api-field title\n@api-type string",
            "MPAA rating.\n\n@api-field rating\n@api-type enum [G|PG|R]",
        ])
        .unwrap();

        let keys: Vec<_> = representation.fields.keys().cloned().collect();
        assert_eq!(keys, vec!["id", "internal_note", "rating", "title"]);
        assert_eq!(representation.fields["title"].field.description, "The movie title.");
        assert_eq!(representation.fields["rating"].field.values.len(), 3);
        assert_eq!(representation.label, "Movie");

        let public = representation.filtered(&FilterPolicy::default());
        assert!(!public.fields.contains_key("internal_note"));
        assert_eq!(public.filtered(&FilterPolicy::default()), public);
    }

    #[test]
    fn test_field_without_type() {
        let err = movie(&["Title.\n\n@api-field title"]).unwrap_err();
        assert_eq!(
            err.annotation_error(),
            Some(&AnnotationError::MissingRequiredField {
                field: "type",
                tag: "field".to_string()
            })
        );
    }

    #[test]
    fn test_second_field_tag_is_duplicate() {
        let err = movie(&["Title.\n\n@api-field title\n@api-field name\n@api-type string"]).unwrap_err();
        assert_eq!(
            err.annotation_error(),
            Some(&AnnotationError::DuplicateAnnotation {
                tag: "field".to_string()
            })
        );
    }

    #[test]
    fn test_versioned_fields() {
        let representation = movie(&[
            "@api-data external_urls (object) - External URLs\n@api-version 1.0\n@api-data external_urls.tickets (uri, tag:BUY_TICKETS) - Tickets",
        ])
        .unwrap();

        let v10 = representation.for_version(&VersionNumber::parse("1.0").unwrap());
        let v11 = representation.for_version(&VersionNumber::parse("1.1").unwrap());
        assert!(v10.fields.contains_key("external_urls.tickets"));
        assert!(!v11.fields.contains_key("external_urls.tickets"));

        let untagged = representation.filtered(&FilterPolicy::new(false, Some(Vec::new())));
        assert!(!untagged.fields.contains_key("external_urls.tickets"));
    }

    #[test]
    fn test_inline_referenced_fields() {
        let mut representation = movie(&["@api-data director (Person) - Director"]).unwrap();
        let person = Representation::from_blocks(
            "Person",
            None,
            &blocks(&["@api-data name (string) - Name"]).unwrap(),
        )
        .unwrap();

        assert_eq!(
            representation.references(),
            vec![("director".to_string(), "Person".to_string())]
        );
        representation.inline("director", &person);
        assert_eq!(
            representation.fields["director.name"].field.identifier,
            "director.name"
        );
    }
}
