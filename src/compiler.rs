//! @ai:module:intent Compile documented controllers and representations into per-version snapshots
//! @ai:module:layer application
//! @ai:module:public_api Compiler, CompileOptions, Compiled, Snapshot, Resource, CompileStats
//! @ai:module:depends_on action, representation, annotation, filter, source, config, version, error
//! @ai:module:stateless true

use crate::action::ResourceAction;
use crate::annotation::{build_block, BuiltBlock};
use crate::config::{Config, RepresentationLookup};
use crate::error::{Error, Origin, Result, Warning};
use crate::filter::FilterPolicy;
use crate::representation::Representation;
use crate::source::DocSource;
use crate::version::{Version, VersionNumber};
use serde::Serialize;
use std::collections::BTreeMap;

/// @ai:intent Knobs for one compile run
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub load_private: bool,
    pub vendor_tags: Option<Vec<String>>,
    /// Only compile configured versions satisfying this constraint
    pub version: Option<Version>,
}

impl CompileOptions {
    pub fn policy(&self) -> FilterPolicy {
        FilterPolicy::new(self.load_private, self.vendor_tags.clone())
    }
}

/// @ai:intent One controller's actions within a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub label: String,
    pub description: Option<String>,
    pub actions: BTreeMap<String, ResourceAction>,
}

/// @ai:intent Everything compiled for one API version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub version: VersionNumber,
    /// group -> resource label -> resource
    pub resources: BTreeMap<String, BTreeMap<String, Resource>>,
    pub representations: BTreeMap<String, Representation>,
}

impl Snapshot {
    fn new(version: VersionNumber) -> Self {
        Self {
            version,
            resources: BTreeMap::new(),
            representations: BTreeMap::new(),
        }
    }

    /// @ai:intent All actions, in group/resource/identifier order
    pub fn actions(&self) -> impl Iterator<Item = &ResourceAction> {
        self.resources
            .values()
            .flat_map(|resources| resources.values())
            .flat_map(|resource| resource.actions.values())
    }

    /// @ai:example ("/movies/{id}::GET") -> Some(action)
    pub fn action(&self, identifier: &str) -> Option<&ResourceAction> {
        self.actions().find(|a| a.identifier() == identifier)
    }

    pub fn representation(&self, class: &str) -> Option<&Representation> {
        self.representations.get(class)
    }
}

/// @ai:intent Counters describing a compile run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileStats {
    pub controllers: usize,
    pub actions: usize,
    /// Times each representation class was parsed from its docblocks
    pub representation_parses: BTreeMap<String, usize>,
}

/// @ai:intent Result of a compile run
#[derive(Debug, Clone, Serialize)]
pub struct Compiled {
    snapshots: BTreeMap<VersionNumber, Snapshot>,
    unversioned: Vec<ResourceAction>,
    warnings: Vec<Warning>,
    stats: CompileStats,
}

impl Compiled {
    /// @ai:intent Compiled versions in ascending order
    pub fn versions(&self) -> impl Iterator<Item = &VersionNumber> {
        self.snapshots.keys()
    }

    pub fn snapshot(&self, version: &VersionNumber) -> Option<&Snapshot> {
        self.snapshots.get(version)
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.values()
    }

    /// @ai:intent Filtered actions before any version projection
    pub fn unversioned(&self) -> &[ResourceAction] {
        &self.unversioned
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn stats(&self) -> &CompileStats {
        &self.stats
    }
}

/// @ai:intent Drives doc source reads, annotation building and per-version projection
pub struct Compiler<'a, S: DocSource + ?Sized> {
    config: &'a Config,
    source: &'a S,
    options: CompileOptions,
}

impl<'a, S: DocSource + ?Sized> Compiler<'a, S> {
    pub fn new(config: &'a Config, source: &'a S) -> Self {
        Self {
            config,
            source,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// @ai:intent Compile every configured controller for every selected version
    /// @ai:pre config is validated
    /// @ai:post each representation class is parsed at most once; maps are key-sorted
    /// @ai:effects fs:read (through the doc source)
    pub fn compile(&self) -> Result<Compiled> {
        let versions = self.selected_versions()?;
        tracing::info!(
            "Compiling {} controllers for versions {}",
            self.config.controllers.len(),
            versions
                .iter()
                .map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut run = Run {
            config: self.config,
            source: self.source,
            policy: self.options.policy(),
            canonical: BTreeMap::new(),
            views: BTreeMap::new(),
            warnings: Vec::new(),
            stats: CompileStats::default(),
        };
        let mut snapshots: BTreeMap<VersionNumber, Snapshot> = versions
            .iter()
            .map(|v| (v.clone(), Snapshot::new(v.clone())))
            .collect();
        let mut unversioned = Vec::new();
        // Declaring class of every `path::METHOD` per version
        let mut owners: BTreeMap<(VersionNumber, String), String> = BTreeMap::new();

        for class in &self.config.controllers {
            run.stats.controllers += 1;
            let header = run.build(self.source.read(class, None)?)?;
            let label = header.short_description().unwrap_or(class).to_string();
            let description = header.long_description().map(str::to_string);

            for method in self.source.methods(class)? {
                let block = run.build(self.source.read(class, Some(&method))?)?;

                for action in ResourceAction::from_block(class, &method, &block, self.config)? {
                    let Some(action) = action.filtered(&run.policy) else {
                        tracing::debug!("Skipping {} by filter policy", action.identifier());
                        continue;
                    };
                    run.stats.actions += 1;

                    for (version, snapshot) in snapshots.iter_mut() {
                        let Some(view) = action.for_version(version) else {
                            continue;
                        };
                        tracing::debug!("Compiled {} for {}", view.identifier(), version);

                        let owner = (version.clone(), view.identifier());
                        if let Some(first) = owners.get(&owner) {
                            return Err(Error::DuplicateAction {
                                identifier: owner.1,
                                version: version.to_string(),
                                first: first.clone(),
                                second: class.clone(),
                            });
                        }
                        owners.insert(owner, class.clone());

                        for referenced in view.referenced_representations() {
                            run.collect(version, referenced, &mut snapshot.representations)?;
                        }

                        snapshot
                            .resources
                            .entry(view.group.clone())
                            .or_default()
                            .entry(label.clone())
                            .or_insert_with(|| Resource {
                                label: label.clone(),
                                description: description.clone(),
                                actions: BTreeMap::new(),
                            })
                            .actions
                            .insert(view.identifier(), view);
                    }

                    unversioned.push(action);
                }
            }
        }

        tracing::info!(
            "Compiled {} actions and {} representations ({} warnings)",
            run.stats.actions,
            run.canonical.len(),
            run.warnings.len()
        );

        Ok(Compiled {
            snapshots,
            unversioned,
            warnings: run.warnings,
            stats: run.stats,
        })
    }

    /// @ai:intent Build the annotations of a class or method docblock, plus any inner docblocks
    /// @ai:effects fs:read (through the doc source)
    pub fn parse(&self, class: &str, method: Option<&str>) -> Result<Vec<BuiltBlock>> {
        let docblocks = match method {
            Some(method) => self.source.read_all(class, method)?,
            None => vec![self.source.read(class, None)?],
        };
        docblocks
            .iter()
            .map(|docblock| build_block(docblock, self.config))
            .collect()
    }

    fn selected_versions(&self) -> Result<Vec<VersionNumber>> {
        let versions: Vec<VersionNumber> = self
            .config
            .versions()
            .filter(|v| {
                self.options
                    .version
                    .as_ref()
                    .map(|constraint| constraint.satisfies(v))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        match (&self.options.version, versions.is_empty()) {
            (Some(constraint), true) => Err(Error::UnknownVersion(constraint.to_string())),
            _ => Ok(versions),
        }
    }
}

/// Mutable state of one compile run
struct Run<'a, S: DocSource + ?Sized> {
    config: &'a Config,
    source: &'a S,
    policy: FilterPolicy,
    /// Unfiltered representations keyed by configured class name
    canonical: BTreeMap<String, Option<Representation>>,
    /// Filtered, version-projected, inlined views keyed by (version, class)
    views: BTreeMap<(VersionNumber, String), Option<Representation>>,
    warnings: Vec<Warning>,
    stats: CompileStats,
}

impl<S: DocSource + ?Sized> Run<'_, S> {
    fn build(&mut self, docblock: crate::docblock::Docblock) -> Result<BuiltBlock> {
        let block = build_block(&docblock, self.config)?;
        self.warnings.extend(block.warnings.iter().cloned());
        Ok(block)
    }

    /// @ai:intent Configured class name and parse method, or None when excluded
    fn resolve(&self, class: &str) -> Result<Option<(String, String)>> {
        match self.config.representation(class) {
            Ok(RepresentationLookup::Configured { class, method }) => {
                Ok(Some((class.to_string(), method.to_string())))
            }
            Ok(RepresentationLookup::Excluded) => Ok(None),
            Err(e) => Err(Error::annotation(&Origin::class(class), e)),
        }
    }

    /// @ai:intent Parse a representation once per run
    fn canonical(&mut self, class: &str) -> Result<Option<Representation>> {
        let Some((class, method)) = self.resolve(class)? else {
            tracing::debug!("Representation {} is excluded", class);
            return Ok(None);
        };
        if let Some(cached) = self.canonical.get(&class) {
            return Ok(cached.clone());
        }

        tracing::debug!("Parsing representation {}", class);
        let header = self.build(self.source.read(&class, None)?)?;
        let blocks = self
            .source
            .read_all(&class, &method)?
            .into_iter()
            .map(|docblock| self.build(docblock))
            .collect::<Result<Vec<_>>>()?;
        let representation = Representation::from_blocks(&class, Some(&header), &blocks)?;

        *self
            .stats
            .representation_parses
            .entry(class.clone())
            .or_default() += 1;
        self.canonical.insert(class, Some(representation.clone()));
        Ok(Some(representation))
    }

    /// @ai:intent Filtered view for one version with referenced representations inlined
    /// @ai:post a class already on the resolution stack is not inlined again
    fn view(
        &mut self,
        version: &VersionNumber,
        class: &str,
        stack: &mut Vec<String>,
    ) -> Result<Option<Representation>> {
        let Some(canonical) = self.canonical(class)? else {
            return Ok(None);
        };
        // Nested views depend on the stack they were resolved under; only top-level ones are cached
        let top_level = stack.is_empty();
        let key = (version.clone(), canonical.class.clone());
        if top_level {
            if let Some(view) = self.views.get(&key) {
                return Ok(view.clone());
            }
        }

        let mut view = canonical.filtered(&self.policy).for_version(version);
        stack.push(canonical.class.clone());
        for (field, referenced) in view.references() {
            let target = match self.resolve(&referenced)? {
                Some((target, _)) => target,
                None => continue,
            };
            if stack.contains(&target) {
                tracing::debug!("Not inlining {} into {}.{}: cycle", target, canonical.class, field);
                continue;
            }
            if let Some(nested) = self.view(version, &target, stack)? {
                view.inline(&field, &nested);
            }
        }
        stack.pop();

        if top_level {
            self.views.insert(key, Some(view.clone()));
        }
        Ok(Some(view))
    }

    /// @ai:intent Add a representation and everything it references to a snapshot
    fn collect(
        &mut self,
        version: &VersionNumber,
        class: &str,
        into: &mut BTreeMap<String, Representation>,
    ) -> Result<()> {
        let Some(view) = self.view(version, class, &mut Vec::new())? else {
            return Ok(());
        };
        if into.contains_key(&view.class) {
            return Ok(());
        }

        let references = view.references();
        into.insert(view.class.clone(), view);
        for (_, referenced) in references {
            self.collect(version, &referenced, into)?;
        }
        Ok(())
    }
}
