use tempfile::TempDir;

use regmux_core::manager::{
    LocalAdapter, PackageManagerAdapter, PackageManagerKind, restore_defaults,
};

const MIRROR: &str = "https://registry.npmmirror.com/";

fn adapter(temp: &TempDir, installed: Vec<PackageManagerKind>) -> LocalAdapter {
    LocalAdapter::new(temp.path().to_path_buf()).with_assumed_installed(installed)
}

#[test]
fn missing_config_reports_default_registry() {
    let temp = TempDir::new().unwrap();
    let adapter = adapter(&temp, vec![]);

    let npm = adapter.active_registry(PackageManagerKind::Npm).unwrap();
    assert_eq!(npm.url, "https://registry.npmjs.org/");
    assert!(!npm.config_exists);
    assert_eq!(npm.config_path, temp.path().join(".npmrc"));

    let yarn = adapter.active_registry(PackageManagerKind::Yarn).unwrap();
    assert_eq!(yarn.url, "https://registry.yarnpkg.com/");
}

#[test]
fn set_registry_preserves_other_npmrc_settings() {
    let temp = TempDir::new().unwrap();
    let npmrc = temp.path().join(".npmrc");
    std::fs::write(
        &npmrc,
        "# user settings\nregistry=https://registry.npmjs.org/\n@corp:registry=https://npm.corp.example/\nsave-exact=true\n",
    )
    .unwrap();
    let adapter = adapter(&temp, vec![PackageManagerKind::Npm]);

    adapter
        .set_active_registry(PackageManagerKind::Npm, MIRROR)
        .unwrap();

    let content = std::fs::read_to_string(&npmrc).unwrap();
    assert!(content.contains(&format!("registry={MIRROR}")));
    assert!(content.contains("@corp:registry=https://npm.corp.example/"));
    assert!(content.contains("save-exact=true"));
    assert!(content.contains("# user settings"));
    assert_eq!(
        adapter.active_registry(PackageManagerKind::Npm).unwrap().url,
        MIRROR
    );
}

#[test]
fn each_manager_writes_its_own_format() {
    let temp = TempDir::new().unwrap();
    let adapter = adapter(&temp, PackageManagerKind::ALL.to_vec());

    for kind in [PackageManagerKind::Yarn, PackageManagerKind::Bun] {
        adapter.set_active_registry(kind, MIRROR).unwrap();
        let active = adapter.active_registry(kind).unwrap();
        assert_eq!(active.url, MIRROR, "{kind}");
        assert!(active.config_exists);
    }

    let yarnrc = std::fs::read_to_string(temp.path().join(".yarnrc")).unwrap();
    assert!(yarnrc.contains(&format!("registry \"{MIRROR}\"")));

    let bunfig = std::fs::read_to_string(temp.path().join(".bunfig.toml")).unwrap();
    let table: toml::Table = bunfig.parse().unwrap();
    assert_eq!(table["install"]["registry"].as_str(), Some(MIRROR));
}

#[test]
fn pnpm_shares_npm_config_file() {
    let temp = TempDir::new().unwrap();
    let adapter = adapter(&temp, vec![PackageManagerKind::Pnpm]);

    adapter
        .set_active_registry(PackageManagerKind::Pnpm, MIRROR)
        .unwrap();

    assert_eq!(
        adapter.active_registry(PackageManagerKind::Npm).unwrap().url,
        MIRROR
    );
}

#[test]
fn detect_uses_assumed_installation() {
    let temp = TempDir::new().unwrap();
    let adapter = adapter(&temp, vec![PackageManagerKind::Npm, PackageManagerKind::Bun]);

    let detected = adapter.detect();

    let kinds: Vec<_> = detected.iter().map(|info| info.kind).collect();
    assert_eq!(kinds, PackageManagerKind::ALL.to_vec());
    assert_eq!(
        adapter.installed(),
        vec![PackageManagerKind::Npm, PackageManagerKind::Bun]
    );

    let yarn = &detected[1];
    assert!(!yarn.installed);
    assert!(yarn.error.is_some());

    let npm = &detected[0];
    assert_eq!(npm.registry_url.as_deref(), Some("https://registry.npmjs.org/"));
    assert_eq!(npm.config_path, Some(temp.path().join(".npmrc")));
}

#[test]
fn restore_defaults_resets_installed_managers() {
    let temp = TempDir::new().unwrap();
    let adapter = adapter(&temp, vec![PackageManagerKind::Npm, PackageManagerKind::Yarn]);
    adapter
        .set_active_registry(PackageManagerKind::Npm, MIRROR)
        .unwrap();
    adapter
        .set_active_registry(PackageManagerKind::Yarn, MIRROR)
        .unwrap();

    let report = restore_defaults(&adapter, &PackageManagerKind::ALL);

    assert_eq!(
        report.restored,
        vec![PackageManagerKind::Npm, PackageManagerKind::Yarn]
    );
    assert_eq!(
        report.not_installed,
        vec![PackageManagerKind::Pnpm, PackageManagerKind::Bun]
    );
    assert!(report.failed.is_empty());
    assert_eq!(
        adapter.active_registry(PackageManagerKind::Npm).unwrap().url,
        "https://registry.npmjs.org/"
    );
    assert_eq!(
        adapter.active_registry(PackageManagerKind::Yarn).unwrap().url,
        "https://registry.yarnpkg.com/"
    );
}
