//! @ai:module:intent Supply raw docblocks for documented classes and methods
//! @ai:module:layer infrastructure
//! @ai:module:public_api DocSource, MemoryDocSource, FileDocSource
//! @ai:module:depends_on parser, language, docblock, error
//! @ai:module:stateless false

use crate::docblock::Docblock;
use crate::error::{Error, Origin, Result};
use crate::language::is_supported_file;
use crate::parser::{parse_file, DeclarationKind, ParsedSource};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent Read access to documentation comments, by class and method
pub trait DocSource {
    /// @ai:intent Docblock of a class (`method = None`) or one of its methods
    /// @ai:post ClassNotFound / MethodNotImplemented when the target does not exist
    fn read(&self, class: &str, method: Option<&str>) -> Result<Docblock>;

    /// @ai:intent Documented methods of a class, in declaration order
    fn methods(&self, class: &str) -> Result<Vec<String>>;

    /// @ai:intent The method docblock followed by any docblocks inside the method body
    fn read_all(&self, class: &str, method: &str) -> Result<Vec<Docblock>> {
        Ok(vec![self.read(class, Some(method))?])
    }
}

/// Class names are matched on their last path segment
fn short_name(class: &str) -> &str {
    class
        .rsplit(['\\', ':', '.'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(class)
}

#[derive(Debug, Clone, Default)]
struct MethodDocs {
    name: String,
    docblock: Docblock,
    inner: Vec<Docblock>,
}

#[derive(Debug, Clone, Default)]
struct ClassDocs {
    docblock: Option<Docblock>,
    methods: Vec<MethodDocs>,
}

impl ClassDocs {
    fn method(&self, class: &str, name: &str) -> Result<&MethodDocs> {
        self.methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::MethodNotImplemented {
                class: class.to_string(),
                method: name.to_string(),
            })
    }
}

/// Shared lookup for both sources
#[derive(Debug, Clone, Default)]
struct ClassIndex {
    classes: BTreeMap<String, ClassDocs>,
}

impl ClassIndex {
    fn class(&self, class: &str) -> Result<&ClassDocs> {
        self.classes
            .get(short_name(class))
            .ok_or_else(|| Error::ClassNotFound(class.to_string()))
    }

    fn read(&self, class: &str, method: Option<&str>) -> Result<Docblock> {
        let docs = self.class(class)?;
        match method {
            None => Ok(docs
                .docblock
                .clone()
                .unwrap_or_else(|| Docblock::new("", Origin::class(class)))),
            Some(name) => Ok(docs.method(class, name)?.docblock.clone()),
        }
    }

    fn methods(&self, class: &str) -> Result<Vec<String>> {
        Ok(self
            .class(class)?
            .methods
            .iter()
            .map(|m| m.name.clone())
            .collect())
    }

    fn read_all(&self, class: &str, method: &str) -> Result<Vec<Docblock>> {
        let docs = self.class(class)?.method(class, method)?;
        let mut blocks = Vec::with_capacity(docs.inner.len() + 1);
        blocks.push(docs.docblock.clone());
        blocks.extend(docs.inner.iter().cloned());
        Ok(blocks)
    }
}

/// @ai:intent In-memory doc source for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryDocSource {
    index: ClassIndex,
}

impl MemoryDocSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Register a class docblock
    pub fn with_class(mut self, class: &str, text: &str) -> Self {
        self.entry(class).docblock = Some(Docblock::new(text, Origin::class(class)));
        self
    }

    /// @ai:intent Register a documented method; methods keep insertion order
    pub fn with_method(self, class: &str, method: &str, text: &str) -> Self {
        self.with_method_blocks(class, method, text, &[])
    }

    /// @ai:intent Register a method together with the docblocks inside its body
    pub fn with_method_blocks(mut self, class: &str, method: &str, text: &str, inner: &[&str]) -> Self {
        let origin = Origin::method(class, method);
        self.entry(class).methods.push(MethodDocs {
            name: method.to_string(),
            docblock: Docblock::new(text, origin.clone()),
            inner: inner
                .iter()
                .map(|block| Docblock::new(*block, origin.clone()))
                .collect(),
        });
        self
    }

    fn entry(&mut self, class: &str) -> &mut ClassDocs {
        self.index
            .classes
            .entry(short_name(class).to_string())
            .or_default()
    }
}

impl DocSource for MemoryDocSource {
    fn read(&self, class: &str, method: Option<&str>) -> Result<Docblock> {
        self.index.read(class, method)
    }

    fn methods(&self, class: &str) -> Result<Vec<String>> {
        self.index.methods(class)
    }

    fn read_all(&self, class: &str, method: &str) -> Result<Vec<Docblock>> {
        self.index.read_all(class, method)
    }
}

/// @ai:intent Doc source backed by a directory of source files
#[derive(Debug, Clone, Default)]
pub struct FileDocSource {
    root: PathBuf,
    index: ClassIndex,
}

impl FileDocSource {
    /// @ai:intent Walk a directory and index every documented class and method
    /// @ai:pre root is a readable directory
    /// @ai:post a method belongs to the nearest class declaration above it
    /// @ai:effects fs:read
    pub fn open(root: &Path) -> Result<Self> {
        let mut index = ClassIndex::default();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_supported_file(path) {
                continue;
            }

            let parsed = parse_file(path)?;
            index_file(&mut index, path, &parsed);
        }

        tracing::debug!(
            "Indexed {} classes under {}",
            index.classes.len(),
            root.display()
        );

        Ok(Self {
            root: root.to_path_buf(),
            index,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DocSource for FileDocSource {
    fn read(&self, class: &str, method: Option<&str>) -> Result<Docblock> {
        self.index.read(class, method)
    }

    fn methods(&self, class: &str) -> Result<Vec<String>> {
        self.index.methods(class)
    }

    fn read_all(&self, class: &str, method: &str) -> Result<Vec<Docblock>> {
        self.index.read_all(class, method)
    }
}

/// @ai:intent Fold one parsed file into the class index
fn index_file(index: &mut ClassIndex, path: &Path, parsed: &ParsedSource) {
    let docblock = |block: usize, origin: Origin| {
        let comment = &parsed.comment_blocks[block];
        Docblock::new(
            comment.text(),
            origin.with_location(path.to_path_buf(), comment.start_line, comment.end_line),
        )
    };

    let mut current: Option<String> = None;
    for (position, declaration) in parsed.declarations.iter().enumerate() {
        match declaration.kind {
            DeclarationKind::Type => {
                let class = declaration.name.clone();
                let docs = index.classes.entry(class.clone()).or_default();
                if docs.docblock.is_none() {
                    docs.docblock = declaration
                        .doc
                        .map(|block| docblock(block, Origin::class(&class)));
                }
                current = Some(class);
            }
            DeclarationKind::Method => {
                let (Some(class), Some(doc)) = (&current, declaration.doc) else {
                    continue;
                };
                let next_line = parsed
                    .declarations
                    .get(position + 1)
                    .map(|d| d.line)
                    .unwrap_or(usize::MAX);
                let origin = Origin::method(class, &declaration.name);
                let inner = parsed
                    .comment_blocks
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| b.start_line > declaration.line && b.end_line < next_line)
                    .filter(|(i, _)| !parsed.declarations.iter().any(|d| d.doc == Some(*i)))
                    .map(|(i, _)| docblock(i, origin.clone()))
                    .collect();

                let method = MethodDocs {
                    name: declaration.name.clone(),
                    docblock: docblock(doc, origin.clone()),
                    inner,
                };
                index.classes.entry(class.clone()).or_default().methods.push(method);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_memory_source_errors() {
        let source = MemoryDocSource::new()
            .with_class("MovieController", "Movies.")
            .with_method("MovieController", "GET", "@api-group Movies");

        assert!(source.read("\\App\\MovieController", None).is_ok());
        assert!(matches!(
            source.read("TheaterController", None),
            Err(Error::ClassNotFound(_))
        ));
        assert!(matches!(
            source.read("MovieController", Some("DELETE")),
            Err(Error::MethodNotImplemented { .. })
        ));
        assert_eq!(source.methods("MovieController").unwrap(), vec!["GET".to_string()]);
    }

    #[test]
    fn test_file_source_indexes_classes_and_inner_blocks() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(
            src.join("movie.rs"),
            r#"
/// A movie.
pub struct Movie;

impl Movie {
    /// @api-data id (integer) - Movie ID
    pub fn create(&self) {
        /// The title.
        ///
        /// @api-field title
        /// @api-type string
        let _ = ();
    }
}
"#,
        )
        .unwrap();
        fs::write(src.join("notes.txt"), "/// not source").unwrap();

        let source = FileDocSource::open(dir.path()).unwrap();

        assert_eq!(source.read("Movie", None).unwrap().text, "A movie.");
        assert_eq!(source.methods("Movie").unwrap(), vec!["create".to_string()]);

        let blocks = source.read_all("Movie", "create").unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "@api-data id (integer) - Movie ID");
        assert_eq!(blocks[1].text, "The title.\n\n@api-field title\n@api-type string");
        assert_eq!(blocks[1].origin.lines, Some((8, 11)));
        assert!(blocks[1].origin.file.as_ref().unwrap().ends_with("movie.rs"));
    }

    #[test]
    fn test_undocumented_methods_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("controller.py"),
            "class MovieController:\n    def helper(self):\n        pass\n\n    # @api-group Movies\n    def get(self):\n        pass\n",
        )
        .unwrap();

        let source = FileDocSource::open(dir.path()).unwrap();
        assert_eq!(source.methods("MovieController").unwrap(), vec!["get".to_string()]);
    }
}
