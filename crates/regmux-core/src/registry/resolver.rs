//! Merged builtin + custom registry namespace.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::config::{CustomRegistry, DocumentStore, RegistryDocument};
use crate::latency::{LatencyProber, LatencyResult, LatencyTarget, ProbeOptions};
use crate::manager::{PackageManagerAdapter, PackageManagerKind};
use crate::types::{RegistryEntry, RegistryOrigin};

use super::validate::{validate_name, validate_url};
use super::{BuiltinCatalog, RegistryError};

/// File requested from each registry when testing it
pub const PROBE_PATH: &str = "package.json";

/// Manager whose configured URL defines the active registry
pub const REFERENCE_MANAGER: PackageManagerKind = PackageManagerKind::Npm;

/// Outcome of a successful `use`
#[derive(Debug, Clone)]
pub struct UseReport {
    pub registry: RegistryEntry,
    /// Managers now pointing at the registry, in application order
    pub applied: Vec<PackageManagerKind>,
}

/// Outcome of a successful rename
#[derive(Debug)]
pub struct RenameReport {
    pub old: String,
    pub new: RegistryEntry,
    /// `None` when the renamed registry was not active. A failed re-apply
    /// does not undo the rename.
    pub reapplied: Option<Result<UseReport, RegistryError>>,
}

/// Outcome of removing every custom registry
#[derive(Debug, Default)]
pub struct RemoveAllReport {
    pub removed: Vec<String>,
    pub failed: Vec<(String, RegistryError)>,
}

/// Resolves registry names against the builtin catalog and the custom
/// registries of the configuration document.
///
/// The in-memory document only ever reflects what was last saved: each
/// mutation edits a copy, persists it, and swaps it in on success.
#[derive(Debug)]
pub struct RegistryResolver {
    catalog: BuiltinCatalog,
    store: Arc<dyn DocumentStore>,
    adapter: Arc<dyn PackageManagerAdapter>,
    prober: LatencyProber,
    document: Mutex<RegistryDocument>,
}

impl RegistryResolver {
    /// Load the document from `store` and build a resolver over it.
    ///
    /// Probe concurrency is seeded from `max_concurrent_requests`.
    pub fn open(
        catalog: BuiltinCatalog,
        store: Arc<dyn DocumentStore>,
        adapter: Arc<dyn PackageManagerAdapter>,
    ) -> Result<Self, RegistryError> {
        let document = store.load()?;
        let prober = LatencyProber::new(ProbeOptions::with_concurrency(document.concurrency()))
            .map_err(RegistryError::Prober)?;
        debug!(
            custom = document.custom_registries.len(),
            concurrency = document.concurrency(),
            "registry resolver opened"
        );

        Ok(Self {
            catalog,
            store,
            adapter,
            prober,
            document: Mutex::new(document),
        })
    }

    /// Replace the prober used by [`test`](Self::test).
    pub fn with_prober(mut self, prober: LatencyProber) -> Self {
        self.prober = prober;
        self
    }

    pub fn catalog(&self) -> &BuiltinCatalog {
        &self.catalog
    }

    pub fn adapter(&self) -> &dyn PackageManagerAdapter {
        self.adapter.as_ref()
    }

    /// Snapshot of the last persisted document.
    pub fn document(&self) -> RegistryDocument {
        self.lock_document().clone()
    }

    /// Every registry, builtin and custom, sorted by name.
    pub fn list(&self) -> Vec<RegistryEntry> {
        let document = self.lock_document();
        let mut entries: Vec<RegistryEntry> = self.catalog.entries().to_vec();

        for (name, registry) in &document.custom_registries {
            if self.catalog.contains(name) {
                warn!(name = %name, "ignoring custom registry that reuses a builtin name");
                continue;
            }
            entries.push(custom_entry(name, registry));
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Look up a registry; builtins win over custom entries.
    pub fn get(&self, name: &str) -> Result<RegistryEntry, RegistryError> {
        if let Some(entry) = self.catalog.get(name) {
            return Ok(entry.clone());
        }

        self.lock_document()
            .custom_registries
            .get(name)
            .map(|registry| custom_entry(name, registry))
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    /// Add and persist a custom registry.
    pub fn add(
        &self,
        name: &str,
        registry: CustomRegistry,
    ) -> Result<RegistryEntry, RegistryError> {
        validate_name(name)?;
        validate_url(&registry.url)?;
        if self.catalog.contains(name) {
            return Err(RegistryError::BuiltinName {
                name: name.to_string(),
            });
        }

        let mut document = self.lock_document();
        if document.custom_registries.contains_key(name) {
            return Err(RegistryError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let entry = custom_entry(name, &registry);
        let mut updated = document.clone();
        updated.custom_registries.insert(name.to_string(), registry);
        self.commit(&mut document, updated)?;

        info!(name = %name, url = %entry.url, "added registry");
        Ok(entry)
    }

    /// Remove and persist a custom registry, returning what was removed.
    pub fn remove(&self, name: &str) -> Result<RegistryEntry, RegistryError> {
        if self.catalog.contains(name) {
            return Err(RegistryError::Builtin {
                name: name.to_string(),
            });
        }

        let mut document = self.lock_document();
        let mut updated = document.clone();
        let registry = updated
            .custom_registries
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })?;
        self.commit(&mut document, updated)?;

        info!(name = %name, "removed registry");
        Ok(custom_entry(name, &registry))
    }

    /// Remove every custom registry, continuing past individual failures.
    ///
    /// Builtins are never touched.
    pub fn remove_all(&self) -> RemoveAllReport {
        let names: Vec<String> = self
            .lock_document()
            .custom_registries
            .keys()
            .cloned()
            .collect();

        let mut report = RemoveAllReport::default();
        for name in names {
            match self.remove(&name) {
                Ok(_) => report.removed.push(name),
                Err(e) => {
                    warn!(name = %name, error = %e, "failed to remove registry");
                    report.failed.push((name, e));
                }
            }
        }
        report
    }

    /// Rename a custom registry.
    ///
    /// If the registry was active it is re-applied under its new name.
    pub fn rename(&self, old: &str, new: &str) -> Result<RenameReport, RegistryError> {
        validate_name(new)?;
        if self.catalog.contains(old) {
            return Err(RegistryError::Builtin {
                name: old.to_string(),
            });
        }
        if self.catalog.contains(new) {
            return Err(RegistryError::BuiltinName {
                name: new.to_string(),
            });
        }

        // Before touching the document: current() takes the same lock
        let was_active = self.is_active(old);

        let entry = {
            let mut document = self.lock_document();
            let registry = document.custom_registries.get(old).cloned().ok_or_else(|| {
                RegistryError::NotFound {
                    name: old.to_string(),
                }
            })?;
            if document.custom_registries.contains_key(new) {
                return Err(RegistryError::AlreadyExists {
                    name: new.to_string(),
                });
            }

            let entry = custom_entry(new, &registry);
            let mut updated = document.clone();
            updated.custom_registries.remove(old);
            updated.custom_registries.insert(new.to_string(), registry);
            self.commit(&mut document, updated)?;
            entry
        };
        info!(old = %old, new = %new, "renamed registry");

        let reapplied = was_active.then(|| self.use_registry(new));
        if let Some(Err(e)) = &reapplied {
            warn!(name = %new, error = %e, "failed to re-apply renamed registry");
        }

        Ok(RenameReport {
            old: old.to_string(),
            new: entry,
            reapplied,
        })
    }

    /// Point every installed package manager at the named registry.
    ///
    /// Stops at the first manager that fails; managers already updated
    /// keep the new URL.
    pub fn use_registry(&self, name: &str) -> Result<UseReport, RegistryError> {
        let registry = self.get(name)?;
        let mut applied = Vec::new();

        for kind in self.adapter.installed() {
            if let Err(source) = self.adapter.set_active_registry(kind, &registry.url) {
                return Err(RegistryError::ApplyFailed {
                    url: registry.url.clone(),
                    manager: kind,
                    applied,
                    source,
                });
            }
            debug!(manager = %kind, url = %registry.url, "applied registry");
            applied.push(kind);
        }

        info!(name = %registry.name, managers = applied.len(), "registry in use");
        Ok(UseReport { registry, applied })
    }

    /// The registry npm is configured with, or an `unknown` entry when no
    /// registry has that URL.
    pub fn current(&self) -> Result<RegistryEntry, RegistryError> {
        let active = self
            .adapter
            .active_registry(REFERENCE_MANAGER)
            .map_err(|source| RegistryError::ActiveRegistry {
                manager: REFERENCE_MANAGER,
                source,
            })?;

        Ok(self
            .list()
            .into_iter()
            .find(|entry| entry.matches_url(&active.url))
            .unwrap_or_else(|| RegistryEntry::unknown(active.url)))
    }

    /// Probe the named registries, or all of them when `names` is empty.
    ///
    /// Results follow the request order. Unknown names produce an offline
    /// result without any network traffic.
    pub async fn test(&self, names: &[String]) -> Vec<LatencyResult> {
        let slots: Vec<Result<LatencyTarget, LatencyResult>> = if names.is_empty() {
            self.list().iter().map(|e| Ok(probe_target(e))).collect()
        } else {
            names
                .iter()
                .map(|name| match self.get(name) {
                    Ok(entry) => Ok(probe_target(&entry)),
                    Err(_) => Err(LatencyResult::failed(name, "", "registry not found")),
                })
                .collect()
        };

        let targets: Vec<LatencyTarget> = slots
            .iter()
            .filter_map(|slot| slot.as_ref().ok().cloned())
            .collect();
        let mut probed = self.prober.probe_all(&targets).await.into_iter();

        slots
            .into_iter()
            .filter_map(|slot| match slot {
                Ok(_) => probed.next(),
                Err(missing) => Some(missing),
            })
            .collect()
    }

    fn is_active(&self, name: &str) -> bool {
        match self.current() {
            Ok(entry) => entry.name == name && entry.origin == RegistryOrigin::Custom,
            Err(e) => {
                debug!(error = %e, "could not determine active registry");
                false
            }
        }
    }

    /// Persist `updated`, then make it the in-memory view.
    ///
    /// On failure the in-memory view is left as it was.
    fn commit(
        &self,
        current: &mut MutexGuard<'_, RegistryDocument>,
        updated: RegistryDocument,
    ) -> Result<(), RegistryError> {
        self.store.save(&updated)?;
        **current = updated;
        Ok(())
    }

    fn lock_document(&self) -> MutexGuard<'_, RegistryDocument> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn custom_entry(name: &str, registry: &CustomRegistry) -> RegistryEntry {
    RegistryEntry {
        name: name.to_string(),
        url: registry.url.clone(),
        home: registry.home.clone(),
        description: registry.description.clone(),
        origin: RegistryOrigin::Custom,
    }
}

fn probe_target(entry: &RegistryEntry) -> LatencyTarget {
    LatencyTarget {
        test_path: Some(PROBE_PATH.to_string()),
        headers: vec![("Accept".to_string(), "application/json".to_string())],
        ..LatencyTarget::new(&entry.name, &entry.url)
    }
}
