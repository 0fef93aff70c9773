//! Builtin registry catalog.

use crate::types::{RegistryEntry, RegistryOrigin};

/// Static row of the builtin table
struct BuiltinRow {
    name: &'static str,
    url: &'static str,
    home: &'static str,
    description: &'static str,
}

const BUILTIN_REGISTRIES: &[BuiltinRow] = &[
    BuiltinRow {
        name: "npm",
        url: "https://registry.npmjs.org/",
        home: "https://www.npmjs.org",
        description: "npm official",
    },
    BuiltinRow {
        name: "yarn",
        url: "https://registry.yarnpkg.com/",
        home: "https://yarnpkg.com",
        description: "yarn official",
    },
    BuiltinRow {
        name: "taobao",
        url: "https://registry.npmmirror.com/",
        home: "https://npmmirror.com",
        description: "Taobao npm mirror",
    },
    BuiltinRow {
        name: "tencent",
        url: "https://mirrors.tencent.com/npm/",
        home: "https://mirrors.tencent.com/help/npm.html",
        description: "Tencent npm mirror",
    },
    BuiltinRow {
        name: "npmMirror",
        url: "https://skimdb.npmjs.com/registry/",
        home: "https://skimdb.npmjs.com/",
        description: "npm mirror",
    },
    BuiltinRow {
        name: "huawei",
        url: "https://repo.huaweicloud.com/repository/npm/",
        home: "https://www.huaweicloud.com/special/npm-jingxiang.html",
        description: "Huawei npm mirror",
    },
    BuiltinRow {
        name: "ustc",
        url: "https://npmreg.proxy.ustclug.org/",
        home: "https://mirrors.ustc.edu.cn/help/npm.html",
        description: "USTC npm mirror",
    },
    BuiltinRow {
        name: "nju",
        url: "https://repo.nju.edu.cn/repository/npm/",
        home: "https://doc.nju.edu.cn/books/35f4a/page/npm",
        description: "NJU npm mirror",
    },
];

/// Immutable set of builtin registries, sorted by name.
///
/// Constructed once and handed to the resolver; tests can build their own.
#[derive(Debug, Clone)]
pub struct BuiltinCatalog {
    entries: Vec<RegistryEntry>,
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::with_default_registries()
    }
}

impl BuiltinCatalog {
    /// The registries shipped with regmux.
    pub fn with_default_registries() -> Self {
        Self::from_entries(
            BUILTIN_REGISTRIES
                .iter()
                .map(|row| RegistryEntry {
                    name: row.name.to_string(),
                    url: row.url.to_string(),
                    home: Some(row.home.to_string()),
                    description: Some(row.description.to_string()),
                    origin: RegistryOrigin::Builtin,
                })
                .collect(),
        )
    }

    /// Build a catalog from arbitrary entries.
    ///
    /// Entries are marked builtin; on duplicate names the first one wins.
    pub fn from_entries(entries: Vec<RegistryEntry>) -> Self {
        let mut entries: Vec<RegistryEntry> = entries
            .into_iter()
            .map(|entry| RegistryEntry {
                origin: RegistryOrigin::Builtin,
                ..entry
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries.dedup_by(|later, earlier| later.name == earlier.name);
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries
            .binary_search_by(|entry| entry.name.as_str().cmp(name))
            .ok()
            .map(|index| &self.entries[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
