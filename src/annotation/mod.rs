//! @ai:module:intent Typed annotation records and the facets each kind supports
//! @ai:module:layer domain
//! @ai:module:public_api Annotation, Payload, Facets, Supports, Faceted, Parameter, ParameterLocation, Field
//! @ai:module:depends_on mson, version, docblock
//! @ai:module:stateless true

pub mod builder;
pub mod http;

pub use builder::{build_block, BuiltBlock};
pub use http::ReturnType;

use crate::docblock::Decorator;
use crate::mson::{EnumValue, FieldType, MsonField};
use crate::version::{Version, VersionNumber};
use serde::{Deserialize, Serialize};

/// @ai:intent Which shared facets an annotation kind accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Supports {
    pub visibility: bool,
    pub deprecation: bool,
    pub aliasing: bool,
    pub versioning: bool,
    pub vendor_tags: bool,
}

impl Supports {
    const NONE: Supports = Supports {
        visibility: false,
        deprecation: false,
        aliasing: false,
        versioning: false,
        vendor_tags: false,
    };

    /// @ai:intent Whether a decorator maps onto a facet this kind supports
    pub fn accepts(&self, decorator: Decorator) -> bool {
        match decorator {
            Decorator::Private | Decorator::Public => self.visibility,
            Decorator::Deprecated => self.deprecation,
            Decorator::Alias => self.aliasing,
        }
    }
}

/// @ai:intent Shared optional facets; only those declared by `Supports` are ever set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    pub visible: bool,
    pub deprecated: bool,
    pub aliased: bool,
    pub aliases: Vec<String>,
    pub version: Option<Version>,
    pub vendor_tags: Vec<String>,
    pub capability: Option<String>,
}

impl Default for Facets {
    fn default() -> Self {
        Self {
            visible: true,
            deprecated: false,
            aliased: false,
            aliases: Vec::new(),
            version: None,
            vendor_tags: Vec::new(),
            capability: None,
        }
    }
}

/// @ai:intent Where a request parameter is carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Body,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Body => "body",
        }
    }
}

/// @ai:intent A request parameter parsed from MSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub location: ParameterLocation,
    #[serde(flatten)]
    pub field: MsonField,
}

/// @ai:intent A representation field, whichever tag style declared it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub identifier: String,
    pub sample: Option<String>,
    #[serde(rename = "type")]
    pub ty: FieldType,
    pub subtype: Option<FieldType>,
    pub nullable: bool,
    pub required: bool,
    pub values: Vec<EnumValue>,
    pub description: String,
}

impl Field {
    /// @ai:intent The representation this field points at through its type or subtype
    pub fn referenced_representation(&self) -> Option<&str> {
        self.ty
            .representation()
            .or_else(|| self.subtype.as_ref().and_then(FieldType::representation))
    }
}

impl From<MsonField> for Field {
    fn from(field: MsonField) -> Self {
        Self {
            identifier: field.identifier,
            sample: field.sample,
            ty: field.ty,
            subtype: field.subtype,
            nullable: field.nullable,
            required: field.required,
            values: field.values,
            description: field.description,
        }
    }
}

/// @ai:intent Tag-specific content of an annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Group {
        name: String,
    },
    Path {
        path: String,
    },
    PathParameter(Parameter),
    Parameter(Parameter),
    Return {
        return_type: ReturnType,
        http_code: u16,
        representation: Option<String>,
        description: Option<String>,
    },
    Throws {
        http_code: u16,
        representation: String,
        error_code: Option<String>,
        description: Option<String>,
    },
    ContentType {
        media_type: String,
    },
    Scope {
        name: String,
        description: Option<String>,
    },
    VendorTag {
        name: String,
    },
    Capability {
        name: String,
    },
    MinVersion {
        version: VersionNumber,
    },
    MaxVersion {
        version: VersionNumber,
    },
    OperationId {
        id: String,
    },
    RepresentationField {
        identifier: String,
    },
    RepresentationType {
        #[serde(rename = "type")]
        ty: FieldType,
        subtype: Option<FieldType>,
        values: Vec<EnumValue>,
    },
    RepresentationData(Field),
    Description {
        short: Option<String>,
        long: Option<String>,
    },
}

impl Payload {
    /// @ai:intent Facet support table, fixed per kind
    pub fn supports(&self) -> Supports {
        match self {
            Payload::Path { .. } => Supports {
                visibility: true,
                deprecation: true,
                aliasing: true,
                ..Supports::NONE
            },
            Payload::Parameter(_) => Supports {
                visibility: true,
                deprecation: true,
                versioning: true,
                vendor_tags: true,
                ..Supports::NONE
            },
            Payload::Return { .. } => Supports {
                visibility: true,
                versioning: true,
                ..Supports::NONE
            },
            Payload::Throws { .. } => Supports {
                visibility: true,
                versioning: true,
                vendor_tags: true,
                ..Supports::NONE
            },
            Payload::ContentType { .. } => Supports {
                versioning: true,
                ..Supports::NONE
            },
            Payload::RepresentationField { .. }
            | Payload::RepresentationType { .. }
            | Payload::RepresentationData(_) => Supports {
                visibility: true,
                deprecation: true,
                versioning: true,
                vendor_tags: true,
                ..Supports::NONE
            },
            _ => Supports::NONE,
        }
    }

    pub fn tag_name(&self) -> &'static str {
        match self {
            Payload::Group { .. } => "group",
            Payload::Path { .. } => "path",
            Payload::PathParameter(_) => "pathparam",
            Payload::Parameter(p) if p.location == ParameterLocation::Query => "queryparam",
            Payload::Parameter(_) => "param",
            Payload::Return { .. } => "return",
            Payload::Throws { .. } => "throws",
            Payload::ContentType { .. } => "contenttype",
            Payload::Scope { .. } => "scope",
            Payload::VendorTag { .. } => "vendortag",
            Payload::Capability { .. } => "capability",
            Payload::MinVersion { .. } => "minversion",
            Payload::MaxVersion { .. } => "maxversion",
            Payload::OperationId { .. } => "operationid",
            Payload::RepresentationField { .. } => "field",
            Payload::RepresentationType { .. } => "type",
            Payload::RepresentationData(_) => "data",
            Payload::Description { .. } => "description",
        }
    }
}

/// @ai:intent Read access to the facets an annotation actually declares
pub trait Faceted {
    fn supports(&self) -> Supports;
    fn facets(&self) -> &Facets;

    fn is_visible(&self) -> bool {
        !self.supports().visibility || self.facets().visible
    }

    fn is_deprecated(&self) -> bool {
        self.supports().deprecation && self.facets().deprecated
    }

    fn is_aliased(&self) -> bool {
        self.supports().aliasing && self.facets().aliased
    }

    fn version(&self) -> Option<&Version> {
        if self.supports().versioning {
            self.facets().version.as_ref()
        } else {
            None
        }
    }

    fn vendor_tags(&self) -> &[String] {
        if self.supports().vendor_tags {
            &self.facets().vendor_tags
        } else {
            &[]
        }
    }

    fn capability(&self) -> Option<&str> {
        if self.supports().vendor_tags {
            self.facets().capability.as_deref()
        } else {
            None
        }
    }

    /// @ai:intent Whether this annotation applies to a concrete version
    fn applies_to(&self, version: &VersionNumber) -> bool {
        self.version().map(|v| v.satisfies(version)).unwrap_or(true)
    }
}

/// @ai:intent One typed, validated record parsed from a single documentation tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(flatten)]
    pub payload: Payload,
    pub facets: Facets,
}

impl Annotation {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            facets: Facets::default(),
        }
    }

    /// @ai:intent Apply a decorator; hands it back when the kind does not support it
    pub fn decorate(&mut self, decorator: Decorator) -> Result<(), Decorator> {
        if !self.supports().accepts(decorator) {
            return Err(decorator);
        }
        match decorator {
            Decorator::Private => self.facets.visible = false,
            Decorator::Public => self.facets.visible = true,
            Decorator::Deprecated => self.facets.deprecated = true,
            Decorator::Alias => self.facets.aliased = true,
        }
        Ok(())
    }

    /// @ai:pre the kind supports versioning
    pub fn set_version(&mut self, version: Version) {
        debug_assert!(
            self.supports().versioning,
            "`{}` does not support versioning",
            self.payload.tag_name()
        );
        if self.supports().versioning {
            self.facets.version = Some(version);
        }
    }

    /// @ai:pre the kind supports vendor tags
    pub fn set_tagging(&mut self, vendor_tags: Vec<String>, capability: Option<String>) {
        debug_assert!(
            self.supports().vendor_tags,
            "`{}` does not support vendor tags",
            self.payload.tag_name()
        );
        if self.supports().vendor_tags {
            self.facets.vendor_tags = vendor_tags;
            self.facets.capability = capability;
        }
    }
}

impl Faceted for Annotation {
    fn supports(&self) -> Supports {
        self.payload.supports()
    }

    fn facets(&self) -> &Facets {
        &self.facets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_rejects_every_decorator() {
        let mut group = Annotation::new(Payload::Group {
            name: "Movies".to_string(),
        });

        assert_eq!(group.decorate(Decorator::Private), Err(Decorator::Private));
        assert!(group.is_visible());
        assert_eq!(group.version(), None);
    }

    #[test]
    fn test_path_accepts_alias_and_visibility() {
        let mut path = Annotation::new(Payload::Path {
            path: "/movie/{id}".to_string(),
        });

        path.decorate(Decorator::Alias).unwrap();
        path.decorate(Decorator::Private).unwrap();

        assert!(path.is_aliased());
        assert!(!path.is_visible());
    }

    #[test]
    fn test_versioned_annotation_applies_to() {
        let mut content_type = Annotation::new(Payload::ContentType {
            media_type: "application/json".to_string(),
        });
        content_type.set_version(Version::parse("1.1 -").unwrap());

        assert!(!content_type.applies_to(&VersionNumber::parse("1.0").unwrap()));
        assert!(content_type.applies_to(&VersionNumber::parse("1.2").unwrap()));
    }
}
