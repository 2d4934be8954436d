//! @ai:module:intent Format compiled snapshots, changelogs and parsed docblocks as text or JSON
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_compiled, format_changelog, format_blocks, to_json
//! @ai:module:depends_on compiler, changelog, annotation
//! @ai:module:stateless true

use crate::annotation::{BuiltBlock, Faceted, Payload};
use crate::changelog::{Category, ChangeKind, Changelog};
use crate::compiler::{Compiled, Snapshot};
use crate::error::Warning;
use colored::Colorize;
use serde::Serialize;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// @ai:intent Format any serializable value as JSON
/// @ai:effects pure
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_default()
    } else {
        serde_json::to_string(value).unwrap_or_default()
    }
}

fn render<T: Serialize>(value: &T, format: OutputFormat, text: impl FnOnce(&T) -> String) -> String {
    match format {
        OutputFormat::Json => to_json(value, false),
        OutputFormat::JsonPretty => to_json(value, true),
        OutputFormat::Text => text(value),
    }
}

/// @ai:intent Format every compiled version
/// @ai:effects pure
pub fn format_compiled(compiled: &Compiled, format: OutputFormat) -> String {
    render(compiled, format, format_compiled_text)
}

fn format_compiled_text(compiled: &Compiled) -> String {
    let mut output = String::new();

    for snapshot in compiled.snapshots() {
        format_snapshot_text(snapshot, &mut output);
    }

    output.push_str(&format_warnings(compiled.warnings()));
    output.push_str(&format!(
        "Compiled {} controllers, {} actions, {} representations\n",
        compiled.stats().controllers,
        compiled.stats().actions,
        compiled.stats().representation_parses.len()
    ));
    output
}

fn format_snapshot_text(snapshot: &Snapshot, output: &mut String) {
    output.push_str(&format!("{} {}\n", "Version".bold(), snapshot.version.to_string().bold()));

    for (group, resources) in &snapshot.resources {
        output.push_str(&format!("  {}\n", group.cyan()));
        for resource in resources.values() {
            output.push_str(&format!("    {}\n", resource.label));
            for action in resource.actions.values() {
                let mut line = format!("      {:7} {}", action.method.yellow(), action.clean_path);
                if let Some(id) = &action.operation_id {
                    line.push_str(&format!(" {}", id.dimmed()));
                }
                if action.deprecated {
                    line.push_str(&format!(" {}", "deprecated".red()));
                }
                if !action.visible {
                    line.push_str(&format!(" {}", "private".dimmed()));
                }
                output.push_str(&line);
                output.push('\n');
            }
        }
    }

    if !snapshot.representations.is_empty() {
        output.push_str("  Representations\n");
        for representation in snapshot.representations.values() {
            output.push_str(&format!(
                "    {} ({} fields)\n",
                representation.class.cyan(),
                representation.fields.len()
            ));
        }
    }
    output.push('\n');
}

/// @ai:intent Format a changelog, newest version first
/// @ai:effects pure
pub fn format_changelog(changelog: &Changelog, format: OutputFormat) -> String {
    render(changelog, format, format_changelog_text)
}

fn format_changelog_text(changelog: &Changelog) -> String {
    let mut output = String::new();

    for entry in changelog.entries() {
        output.push_str(&format!("{} {}", "Version".bold(), entry.version.to_string().bold()));
        if let Some(date) = &entry.release_date {
            output.push_str(&format!(" ({})", date.dimmed()));
        }
        output.push('\n');
        if let Some(description) = &entry.description {
            output.push_str(&format!("  {}\n", description));
        }

        let Some(changes) = &entry.changes else {
            output.push_str("  Initial release\n\n");
            continue;
        };
        if changes.is_empty() {
            output.push_str("  No changes\n\n");
            continue;
        }

        for change in changes.iter() {
            let marker = match change.kind {
                ChangeKind::Added => "+".green().bold(),
                ChangeKind::Changed => "~".yellow().bold(),
                ChangeKind::Removed => "-".red().bold(),
            };
            let place = match change.category {
                Category::Resources => {
                    let method = change.records[0].method.as_deref().unwrap_or_default();
                    format!("{} {}", method, change.subject)
                }
                Category::Representations => format!("{}.{}", change.owner, change.subject),
            };

            output.push_str(&format!(
                "  {} {} {}\n",
                marker,
                change.change_type.as_str().cyan(),
                place
            ));
            for record in change.records {
                let mut detail = Vec::new();
                if let Some(code) = record.http_code {
                    detail.push(code.to_string());
                }
                if let Some(representation) = &record.representation {
                    detail.push(representation.clone());
                }
                if let Some(parameter) = &record.parameter {
                    detail.push(parameter.clone());
                }
                if let Some(content_type) = &record.content_type {
                    detail.push(content_type.clone());
                }
                if let Some(description) = &record.description {
                    detail.push(description.dimmed().to_string());
                }
                if !detail.is_empty() {
                    output.push_str(&format!("      {}\n", detail.join(" ")));
                }
            }
        }
        output.push('\n');
    }

    let duplicates = changelog.duplicate_error_responses();
    if !duplicates.is_empty() {
        output.push_str(&format!(
            "{} {} error responses share a code and representation:\n",
            "WARN".yellow().bold(),
            duplicates.len()
        ));
        for (version, entry) in duplicates {
            output.push_str(&format!("  {} {} {}\n", version, entry.owner, entry.subject));
        }
    }

    output
}

/// @ai:intent Format the annotations built from docblocks
/// @ai:effects pure
pub fn format_blocks(blocks: &[BuiltBlock], format: OutputFormat) -> String {
    render(&blocks, format, |blocks| format_blocks_text(blocks))
}

fn format_blocks_text(blocks: &[BuiltBlock]) -> String {
    let mut output = String::new();

    for block in blocks {
        output.push_str(&format!("{}\n", block.origin.to_string().bold()));
        if let Some(short) = block.short_description() {
            output.push_str(&format!("  {}\n", short));
        }

        for annotation in &block.annotations {
            let mut flags = Vec::new();
            if !annotation.is_visible() {
                flags.push("private".to_string());
            }
            if annotation.is_deprecated() {
                flags.push("deprecated".to_string());
            }
            if annotation.is_aliased() {
                flags.push("alias".to_string());
            }
            if let Some(version) = annotation.version() {
                flags.push(format!("version {}", version));
            }
            flags.extend(annotation.vendor_tags().iter().cloned());

            output.push_str(&format!(
                "    {:12} {}",
                annotation.payload.tag_name().cyan(),
                summary(&annotation.payload)
            ));
            if !flags.is_empty() {
                output.push_str(&format!(" {}", format!("[{}]", flags.join(", ")).dimmed()));
            }
            output.push('\n');
        }
    }

    let warnings: Vec<Warning> = blocks.iter().flat_map(|b| b.warnings.iter().cloned()).collect();
    output.push_str(&format_warnings(&warnings));
    output
}

fn summary(payload: &Payload) -> String {
    match payload {
        Payload::Group { name } => name.clone(),
        Payload::Path { path } => path.clone(),
        Payload::PathParameter(p) | Payload::Parameter(p) => {
            format!("{} ({}) {}", p.field.identifier, p.field.ty, p.location.as_str())
        }
        Payload::Return {
            http_code,
            representation,
            ..
        } => format!("{} {}", http_code, representation.as_deref().unwrap_or("")),
        Payload::Throws {
            http_code,
            representation,
            error_code,
            ..
        } => match error_code {
            Some(code) => format!("{} {}<{}>", http_code, representation, code),
            None => format!("{} {}", http_code, representation),
        },
        Payload::ContentType { media_type } => media_type.clone(),
        Payload::Scope { name, .. }
        | Payload::VendorTag { name }
        | Payload::Capability { name } => name.clone(),
        Payload::MinVersion { version } | Payload::MaxVersion { version } => version.to_string(),
        Payload::OperationId { id } => id.clone(),
        Payload::RepresentationField { identifier } => identifier.clone(),
        Payload::RepresentationType { ty, subtype, .. } => match subtype {
            Some(sub) => format!("{}<{}>", ty, sub),
            None => ty.to_string(),
        },
        Payload::RepresentationData(field) => format!("{} ({})", field.identifier, field.ty),
        Payload::Description { short, .. } => short.clone().unwrap_or_default(),
    }
}

fn format_warnings(warnings: &[Warning]) -> String {
    warnings
        .iter()
        .map(|w| format!("{} {}\n", "WARN".yellow().bold(), w))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::build_block;
    use crate::config::Config;
    use crate::docblock::Docblock;
    use crate::error::Origin;

    #[test]
    fn test_blocks_text_lists_annotations_and_warnings() {
        colored::control::set_override(false);
        let config = Config::from_toml_str("[[versions]]\nversion = \"1.0\"\n").unwrap();
        let block = build_block(
            &Docblock::new(
                "Get movies.\n\n@api-group:private Movies\n@api-path:deprecated /movies",
                Origin::method("MovieController", "GET"),
            ),
            &config,
        )
        .unwrap();

        let text = format_blocks(&[block], OutputFormat::Text);
        assert!(text.contains("MovieController::GET"));
        assert!(text.contains("/movies [deprecated]"));
        assert!(text.contains("WARN"));
    }

    #[test]
    fn test_blocks_json() {
        let config = Config::from_toml_str("[[versions]]\nversion = \"1.0\"\n").unwrap();
        let block = build_block(
            &Docblock::new("@api-group Movies", Origin::class("MovieController")),
            &config,
        )
        .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&format_blocks(&[block], OutputFormat::Json)).unwrap();
        assert_eq!(json[0]["annotations"][0]["kind"], "group");
        assert_eq!(json[0]["annotations"][0]["name"], "Movies");
    }
}
