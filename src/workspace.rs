//! Explicit session context.
//!
//! A [`Workspace`] owns everything one analysis session works with: the
//! current profile set, the cache manager, and the relationships and graph
//! derived from them. Callers pass it around instead of keeping globals.
//!
//! A new scan replaces the profile set wholesale and re-registers the cache;
//! relationships and graph are dropped and recomputed on demand.

use std::path::{Path, PathBuf};

use crate::cache::{CacheManager, CacheResult, ProfileStore};
use crate::config::Settings;
use crate::graph::RelationshipGraph;
use crate::inference::{Relationship, RelationshipMiner};
use crate::scan::{scan_directory, ProfileSet, ProgressObserver, ScanResult};

#[derive(Debug)]
pub struct Workspace {
    settings: Settings,
    cache: CacheManager,
    source_dir: Option<PathBuf>,
    profiles: ProfileSet,
    relationships: Option<Vec<Relationship>>,
    graph: Option<RelationshipGraph>,
}

impl Workspace {
    /// Create a workspace whose cache lives where `settings.cache` says.
    pub fn new(settings: Settings) -> CacheResult<Self> {
        let cache = CacheManager::from_settings(&settings.cache)?;
        Ok(Self::with_cache(settings, cache))
    }

    /// Create a workspace around an existing cache manager.
    pub fn with_cache(settings: Settings, cache: CacheManager) -> Self {
        Self {
            settings,
            cache,
            source_dir: None,
            profiles: ProfileSet::new(),
            relationships: None,
            graph: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Directory of the current profile set, if any.
    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    /// Scan `dir`, replacing the current profile set.
    pub fn scan(&mut self, dir: &Path, observer: &dyn ProgressObserver) -> ScanResult<&ProfileSet> {
        let profiles = scan_directory(dir, &self.settings.scan, observer)?;
        self.replace_profiles(dir, profiles);
        Ok(&self.profiles)
    }

    /// Adopt a previously stored profile set for `dir`. Returns false if none was stored.
    pub fn restore(&mut self, store: &ProfileStore, dir: &Path) -> CacheResult<bool> {
        match store.load(dir)? {
            Some(profiles) => {
                self.replace_profiles(dir, profiles);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Store the current profile set under its source directory.
    ///
    /// Does nothing before the first scan or restore.
    pub fn persist(&self, store: &mut ProfileStore) -> CacheResult<()> {
        if let Some(dir) = &self.source_dir {
            store.save(dir, &self.profiles)?;
        }
        Ok(())
    }

    fn replace_profiles(&mut self, dir: &Path, profiles: ProfileSet) {
        self.cache.register(&profiles);
        self.profiles = profiles;
        self.source_dir = Some(dir.to_path_buf());
        self.relationships = None;
        self.graph = None;
    }

    /// Mine relationships from the current profiles, replacing earlier results.
    pub fn mine(&mut self) -> &[Relationship] {
        let relationships = RelationshipMiner::new(&self.settings.mining).mine(&self.profiles);
        self.graph = None;
        self.relationships.insert(relationships)
    }

    /// Relationships from the last [`Workspace::mine`], if any.
    pub fn relationships(&self) -> Option<&[Relationship]> {
        self.relationships.as_deref()
    }

    /// Build the graph at `min_confidence`, mining first if needed.
    pub fn build_graph(&mut self, min_confidence: f64) -> &RelationshipGraph {
        if self.relationships.is_none() {
            self.mine();
        }
        let relationships = self.relationships.as_deref().unwrap_or_default();
        let graph = RelationshipGraph::build(&self.profiles, relationships, min_confidence)
            .with_indirect_path_cap(self.settings.graph.indirect_path_cap);
        self.graph.insert(graph)
    }

    /// Graph from the last [`Workspace::build_graph`], if any.
    pub fn graph(&self) -> Option<&RelationshipGraph> {
        self.graph.as_ref()
    }
}
