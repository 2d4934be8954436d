//! @ai:module:intent Compare adjacent compiled versions and group their differences by content hash
//! @ai:module:layer application
//! @ai:module:public_api Changelog, VersionChangelog, ChangeSet, ChangeRecord, ChangeKind, Category, ChangeType, diff_snapshots, content_hash
//! @ai:module:depends_on compiler, action, annotation, config, version
//! @ai:module:stateless true

use crate::action::ResourceAction;
use crate::annotation::{Annotation, Parameter, Payload};
use crate::compiler::{Compiled, Snapshot};
use crate::config::Config;
use crate::representation::Representation;
use crate::version::VersionNumber;
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use xxhash_rust::xxh64::xxh64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Resources,
    Representations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Action,
    Parameter,
    Return,
    Throws,
    ContentType,
    Field,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Action => "action",
            ChangeType::Parameter => "parameter",
            ChangeType::Return => "return",
            ChangeType::Throws => "throws",
            ChangeType::ContentType => "content_type",
            ChangeType::Field => "field",
        }
    }
}

/// @ai:intent One independently renderable change
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ChangeRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// content hash -> records sharing it
pub type Buckets = BTreeMap<String, Vec<ChangeRecord>>;

/// kind -> category -> group/class -> path/field -> change type -> buckets
type ChangeTree =
    BTreeMap<ChangeKind, BTreeMap<Category, BTreeMap<String, BTreeMap<String, BTreeMap<ChangeType, Buckets>>>>>;

/// @ai:intent Every change of one version transition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    tree: ChangeTree,
}

/// @ai:intent Stable 16-hex-digit hash over the fields that identify a change
/// @ai:post descriptions never contribute, so description-only differences share a bucket
/// @ai:effects pure
pub fn content_hash(change_type: ChangeType, record: &ChangeRecord) -> String {
    // serde_json maps are key-sorted, which makes this canonical
    let canonical = match change_type {
        ChangeType::Field => json!({
            "type": change_type.as_str(),
            "class": record.class,
            "field": record.field,
        }),
        _ => json!({
            "type": change_type.as_str(),
            "method": record.method,
            "path": record.path,
            "http_code": record.http_code,
            "representation": record.representation,
        }),
    };
    format!("{:016x}", xxh64(canonical.to_string().as_bytes(), 0))
}

impl ChangeSet {
    /// @ai:intent File a record under its kind/category/owner/subject/type and content hash
    /// @ai:post records within a bucket stay sorted
    pub fn push(
        &mut self,
        kind: ChangeKind,
        category: Category,
        owner: &str,
        subject: &str,
        change_type: ChangeType,
        record: ChangeRecord,
    ) {
        let bucket = self
            .tree
            .entry(kind)
            .or_default()
            .entry(category)
            .or_default()
            .entry(owner.to_string())
            .or_default()
            .entry(subject.to_string())
            .or_default()
            .entry(change_type)
            .or_default()
            .entry(content_hash(change_type, &record))
            .or_default();

        let position = bucket.binary_search(&record).unwrap_or_else(|p| p);
        bucket.insert(position, record);
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// @ai:intent Buckets of one change type for a path or field
    pub fn buckets(
        &self,
        kind: ChangeKind,
        category: Category,
        owner: &str,
        subject: &str,
        change_type: ChangeType,
    ) -> Option<&Buckets> {
        self.tree
            .get(&kind)?
            .get(&category)?
            .get(owner)?
            .get(subject)?
            .get(&change_type)
    }

    /// @ai:intent Flat walk over every bucket
    pub fn iter(&self) -> impl Iterator<Item = ChangeEntry<'_>> {
        self.tree.iter().flat_map(|(kind, categories)| {
            categories.iter().flat_map(move |(category, owners)| {
                owners.iter().flat_map(move |(owner, subjects)| {
                    subjects.iter().flat_map(move |(subject, types)| {
                        types.iter().flat_map(move |(change_type, buckets)| {
                            buckets.iter().map(move |(hash, records)| ChangeEntry {
                                kind: *kind,
                                category: *category,
                                owner,
                                subject,
                                change_type: *change_type,
                                hash,
                                records,
                            })
                        })
                    })
                })
            })
        })
    }

    /// @ai:intent Total number of records
    pub fn len(&self) -> usize {
        self.iter().map(|entry| entry.records.len()).sum()
    }
}

/// @ai:intent A single bucket together with its position in the change tree
#[derive(Debug, Clone, Copy)]
pub struct ChangeEntry<'a> {
    pub kind: ChangeKind,
    pub category: Category,
    pub owner: &'a str,
    pub subject: &'a str,
    pub change_type: ChangeType,
    pub hash: &'a str,
    pub records: &'a [ChangeRecord],
}

/// @ai:intent Release metadata and the changes introduced by one version
#[derive(Debug, Clone, Serialize)]
pub struct VersionChangelog {
    pub version: VersionNumber,
    pub release_date: Option<String>,
    pub description: Option<String>,
    /// None for the first compiled version
    pub changes: Option<ChangeSet>,
}

/// @ai:intent Changelog of every compiled version, newest first
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Changelog {
    entries: Vec<VersionChangelog>,
}

impl Changelog {
    /// @ai:intent Diff each compiled version against the previous one
    /// @ai:post entries are ordered newest-first; the oldest has no changes
    /// @ai:effects pure
    pub fn build(compiled: &Compiled, config: &Config) -> Self {
        let snapshots: Vec<&Snapshot> = compiled.snapshots().collect();
        let mut entries: Vec<VersionChangelog> = snapshots
            .iter()
            .enumerate()
            .map(|(index, newer)| {
                let release = config.release(&newer.version);
                let changes = index
                    .checked_sub(1)
                    .map(|previous| diff_snapshots(snapshots[previous], newer));
                if let Some(changes) = &changes {
                    tracing::debug!("{} changes in {}", changes.len(), newer.version);
                }

                VersionChangelog {
                    version: newer.version.clone(),
                    release_date: release.and_then(|r| r.release_date.clone()),
                    description: release.and_then(|r| r.description.clone()),
                    changes,
                }
            })
            .collect();

        entries.reverse();
        Self { entries }
    }

    pub fn entries(&self) -> &[VersionChangelog] {
        &self.entries
    }

    pub fn version(&self, version: &VersionNumber) -> Option<&VersionChangelog> {
        self.entries.iter().find(|e| &e.version == version)
    }

    /// @ai:intent Error buckets holding more than one record, i.e. responses that cannot be told apart
    pub fn duplicate_error_responses(&self) -> Vec<(&VersionNumber, ChangeEntry<'_>)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.changes.as_ref().map(|changes| (&entry.version, changes)))
            .flat_map(|(version, changes)| {
                changes
                    .iter()
                    .filter(|e| e.change_type == ChangeType::Throws && e.records.len() > 1)
                    .map(move |e| (version, e))
            })
            .collect()
    }
}

/// @ai:intent Changes that take `older` to `newer`
/// @ai:effects pure
pub fn diff_snapshots(older: &Snapshot, newer: &Snapshot) -> ChangeSet {
    let mut changes = ChangeSet::default();

    let old_actions: BTreeMap<String, &ResourceAction> =
        older.actions().map(|a| (a.identifier(), a)).collect();
    let new_actions: BTreeMap<String, &ResourceAction> =
        newer.actions().map(|a| (a.identifier(), a)).collect();

    for (identifier, action) in &new_actions {
        match old_actions.get(identifier) {
            None => push_action(&mut changes, ChangeKind::Added, ChangeType::Action, action, None),
            Some(old) => diff_action(&mut changes, old, action),
        }
    }
    for (identifier, action) in &old_actions {
        if !new_actions.contains_key(identifier) {
            push_action(&mut changes, ChangeKind::Removed, ChangeType::Action, action, None);
        }
    }

    let classes: BTreeSet<&String> = older
        .representations
        .keys()
        .chain(newer.representations.keys())
        .collect();
    for class in classes {
        diff_representation(
            &mut changes,
            class,
            older.representations.get(class),
            newer.representations.get(class),
        );
    }

    changes
}

fn action_record(action: &ResourceAction) -> ChangeRecord {
    ChangeRecord {
        group: Some(action.group.clone()),
        method: Some(action.method.clone()),
        path: Some(action.path.clone()),
        operation_id: action.operation_id.clone(),
        ..Default::default()
    }
}

fn push_action(
    changes: &mut ChangeSet,
    kind: ChangeKind,
    change_type: ChangeType,
    action: &ResourceAction,
    detail: Option<&Annotation>,
) {
    let mut record = action_record(action);
    match detail.map(|a| &a.payload) {
        Some(Payload::Parameter(Parameter { field, .. }))
        | Some(Payload::PathParameter(Parameter { field, .. })) => {
            record.parameter = Some(field.identifier.clone());
            record.description = Some(field.description.clone());
        }
        Some(Payload::Return {
            http_code,
            representation,
            description,
            ..
        }) => {
            record.http_code = Some(*http_code);
            record.representation = representation.clone();
            record.description = description.clone();
        }
        Some(Payload::Throws {
            http_code,
            representation,
            description,
            ..
        }) => {
            record.http_code = Some(*http_code);
            record.representation = Some(representation.clone());
            record.description = description.clone();
        }
        _ => record.description = action.label.clone(),
    }

    changes.push(
        kind,
        Category::Resources,
        &action.group,
        &action.path,
        change_type,
        record,
    );
}

/// @ai:intent Sub-annotation differences of an action present on both sides
fn diff_action(changes: &mut ChangeSet, old: &ResourceAction, new: &ResourceAction) {
    let groups: [(ChangeType, fn(&ResourceAction) -> Vec<&Annotation>); 3] = [
        (ChangeType::Parameter, |a| {
            a.path_parameters.iter().chain(a.parameters.iter()).collect()
        }),
        (ChangeType::Return, |a| a.returns.iter().collect()),
        (ChangeType::Throws, |a| a.throws.iter().collect()),
    ];

    for (change_type, select) in groups {
        let before = select(old);
        let after = select(new);

        for annotation in &after {
            if !before.iter().any(|b| same_payload(b, annotation)) {
                push_action(changes, ChangeKind::Added, change_type, new, Some(annotation));
            }
        }
        for annotation in &before {
            if !after.iter().any(|a| same_payload(a, annotation)) {
                push_action(changes, ChangeKind::Removed, change_type, new, Some(annotation));
            }
        }
    }

    let old_types = media_types(old);
    let new_types = media_types(new);
    if old_types != new_types {
        let mut record = action_record(new);
        record.content_type = Some(new_types.join(", "));
        record.description = Some(old_types.join(", "));
        changes.push(
            ChangeKind::Changed,
            Category::Resources,
            &new.group,
            &new.path,
            ChangeType::ContentType,
            record,
        );
    }
}

/// Facets such as attached versions differ between projections; compare content only
fn same_payload(a: &Annotation, b: &Annotation) -> bool {
    a.payload == b.payload
}

fn media_types(action: &ResourceAction) -> Vec<String> {
    let types: BTreeSet<String> = action
        .content_types
        .iter()
        .filter_map(|a| match &a.payload {
            Payload::ContentType { media_type } => Some(media_type.clone()),
            _ => None,
        })
        .collect();
    types.into_iter().collect()
}

fn diff_representation(
    changes: &mut ChangeSet,
    class: &str,
    older: Option<&Representation>,
    newer: Option<&Representation>,
) {
    let empty = BTreeMap::new();
    let old_fields = older.map(|r| &r.fields).unwrap_or(&empty);
    let new_fields = newer.map(|r| &r.fields).unwrap_or(&empty);

    let mut push = |kind: ChangeKind, identifier: &str, description: &str| {
        changes.push(
            kind,
            Category::Representations,
            class,
            identifier,
            ChangeType::Field,
            ChangeRecord {
                class: Some(class.to_string()),
                field: Some(identifier.to_string()),
                description: Some(description.to_string()),
                ..Default::default()
            },
        );
    };

    for (identifier, field) in new_fields {
        if !old_fields.contains_key(identifier) {
            push(ChangeKind::Added, identifier, &field.field.description);
        }
    }
    for (identifier, field) in old_fields {
        if !new_fields.contains_key(identifier) {
            push(ChangeKind::Removed, identifier, &field.field.description);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompileOptions, Compiler};
    use crate::source::MemoryDocSource;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"
controllers = ["MovieController"]

[[versions]]
version = "1.0"
release_date = "2017-01-01"

[[versions]]
version = "1.1"
release_date = "2017-02-01"
description = "Errors"

[[representations]]
class = "Movie"
method = "create"

[[error_representations]]
class = "Error"
method = "create"
"#;

    fn changelog(get: &str) -> Changelog {
        let config = Config::from_toml_str(CONFIG).unwrap();
        let source = MemoryDocSource::new()
            .with_class("MovieController", "Movies.")
            .with_method("MovieController", "GET", get)
            .with_method(
                "Movie",
                "create",
                "@api-data id (integer) - ID\n@api-version 1.1\n@api-data title (string) - Title",
            )
            .with_method("Error", "create", "@api-data error (string) - Message");
        let compiled = Compiler::new(&config, &source)
            .with_options(CompileOptions::default())
            .compile()
            .unwrap();
        Changelog::build(&compiled, &config)
    }

    const GET: &str = "@api-group Movies
@api-path /movies/{id}
@api-contenttype application/json
@api-return {object} Movie
@api-version 1.1 -
@api-throws {404} Error - Movie not found
@api-throws {404} Error - Showtime not found";

    #[test]
    fn test_newest_first_with_release_metadata() {
        let changelog = changelog(GET);
        let versions: Vec<_> = changelog.entries().iter().map(|e| e.version.to_string()).collect();

        assert_eq!(versions, vec!["1.1", "1.0"]);
        assert_eq!(changelog.entries()[0].description.as_deref(), Some("Errors"));
        assert_eq!(changelog.entries()[0].release_date.as_deref(), Some("2017-02-01"));
        assert!(changelog.entries()[1].changes.is_none());
    }

    #[test]
    fn test_errors_with_same_code_share_a_bucket() {
        let changelog = changelog(GET);
        let changes = changelog.entries()[0].changes.as_ref().unwrap();

        let buckets = changes
            .buckets(
                ChangeKind::Added,
                Category::Resources,
                "Movies",
                "/movies/{id}",
                ChangeType::Throws,
            )
            .unwrap();
        assert_eq!(buckets.len(), 1);
        let records = buckets.values().next().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description.as_deref(), Some("Movie not found"));

        assert_eq!(changelog.duplicate_error_responses().len(), 1);
    }

    #[test]
    fn test_representation_field_added() {
        let changelog = changelog(GET);
        let changes = changelog.entries()[0].changes.as_ref().unwrap();

        let added = changes
            .buckets(
                ChangeKind::Added,
                Category::Representations,
                "Movie",
                "title",
                ChangeType::Field,
            )
            .unwrap();
        assert_eq!(added.values().map(Vec::len).sum::<usize>(), 1);
        assert!(changes
            .iter()
            .all(|e| e.kind != ChangeKind::Removed));
    }

    #[test]
    fn test_content_hash_is_stable_and_ignores_description() {
        let record = ChangeRecord {
            method: Some("GET".to_string()),
            path: Some("/movies/{id}".to_string()),
            http_code: Some(404),
            representation: Some("Error".to_string()),
            description: Some("one".to_string()),
            ..Default::default()
        };
        let other = ChangeRecord {
            description: Some("two".to_string()),
            ..record.clone()
        };

        let hash = content_hash(ChangeType::Throws, &record);
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hash, content_hash(ChangeType::Throws, &other));
        assert_ne!(hash, content_hash(ChangeType::Return, &record));
    }

    #[test]
    fn test_content_type_change() {
        let config = Config::from_toml_str(CONFIG).unwrap();
        let source = MemoryDocSource::new()
            .with_method(
                "MovieController",
                "GET",
                "@api-group Movies
@api-path /movies
@api-return {ok}
@api-version 1.0
@api-contenttype application/json
@api-version 1.1 -
@api-contenttype application/vnd.movies+json",
            )
            .with_method("Movie", "create", "@api-data id (integer) - ID");
        let compiled = Compiler::new(&config, &source).compile().unwrap();
        let changelog = Changelog::build(&compiled, &config);
        let changes = changelog.entries()[0].changes.as_ref().unwrap();

        let entry = changes
            .iter()
            .find(|e| e.change_type == ChangeType::ContentType)
            .unwrap();
        assert_eq!(entry.kind, ChangeKind::Changed);
        assert_eq!(
            entry.records[0].content_type.as_deref(),
            Some("application/vnd.movies+json")
        );
    }
}
