//! @ai:module:intent Fixed HTTP status table and the named return types of the return tag
//! @ai:module:layer domain
//! @ai:module:public_api reason_phrase, is_error_code, ReturnType
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};

const HTTP_CODES: &[(u16, &str)] = &[
    (200, "OK"),
    (201, "Created"),
    (202, "Accepted"),
    (203, "Non-Authoritative Information"),
    (204, "No Content"),
    (205, "Reset Content"),
    (206, "Partial Content"),
    (300, "Multiple Choices"),
    (301, "Moved Permanently"),
    (302, "Found"),
    (303, "See Other"),
    (304, "Not Modified"),
    (307, "Temporary Redirect"),
    (308, "Permanent Redirect"),
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (402, "Payment Required"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (406, "Not Acceptable"),
    (407, "Proxy Authentication Required"),
    (408, "Request Timeout"),
    (409, "Conflict"),
    (410, "Gone"),
    (411, "Length Required"),
    (412, "Precondition Failed"),
    (413, "Payload Too Large"),
    (414, "URI Too Long"),
    (415, "Unsupported Media Type"),
    (416, "Range Not Satisfiable"),
    (417, "Expectation Failed"),
    (418, "I'm a teapot"),
    (422, "Unprocessable Entity"),
    (423, "Locked"),
    (424, "Failed Dependency"),
    (426, "Upgrade Required"),
    (428, "Precondition Required"),
    (429, "Too Many Requests"),
    (431, "Request Header Fields Too Large"),
    (451, "Unavailable For Legal Reasons"),
    (500, "Internal Server Error"),
    (501, "Not Implemented"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (504, "Gateway Timeout"),
    (505, "HTTP Version Not Supported"),
];

/// @ai:example (404) -> Some("Not Found")
/// @ai:example (299) -> None
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    HTTP_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, phrase)| *phrase)
}

pub fn is_error_code(code: u16) -> bool {
    code >= 400 && reason_phrase(code).is_some()
}

/// @ai:intent Named response kinds accepted by the return tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    Ok,
    Object,
    Collection,
    Directory,
    Created,
    Added,
    Accepted,
    Updated,
    Deleted,
    NoContent,
    NotModified,
}

/// @ai:intent Whether a return type needs, forbids, or may carry a representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepresentationRule {
    Required,
    Optional,
    Forbidden,
}

impl ReturnType {
    /// @ai:example ("collection") -> Some(Collection)
    pub fn parse(token: &str) -> Option<Self> {
        let ty = match token.to_ascii_lowercase().as_str() {
            "ok" => ReturnType::Ok,
            "object" => ReturnType::Object,
            "collection" => ReturnType::Collection,
            "directory" => ReturnType::Directory,
            "created" => ReturnType::Created,
            "added" => ReturnType::Added,
            "accepted" => ReturnType::Accepted,
            "updated" => ReturnType::Updated,
            "deleted" => ReturnType::Deleted,
            "nocontent" => ReturnType::NoContent,
            "notmodified" => ReturnType::NotModified,
            _ => return None,
        };
        Some(ty)
    }

    pub fn http_code(&self) -> u16 {
        match self {
            ReturnType::Ok
            | ReturnType::Object
            | ReturnType::Collection
            | ReturnType::Directory
            | ReturnType::Updated => 200,
            ReturnType::Created | ReturnType::Added => 201,
            ReturnType::Accepted => 202,
            ReturnType::Deleted | ReturnType::NoContent => 204,
            ReturnType::NotModified => 304,
        }
    }

    pub fn representation_rule(&self) -> RepresentationRule {
        match self {
            ReturnType::Object | ReturnType::Collection | ReturnType::Directory => {
                RepresentationRule::Required
            }
            ReturnType::Deleted | ReturnType::NoContent | ReturnType::NotModified => {
                RepresentationRule::Forbidden
            }
            _ => RepresentationRule::Optional,
        }
    }
}
