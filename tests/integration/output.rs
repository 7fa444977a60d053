//! Where and how results land: output directories, source maps, dry runs,
//! exclusions and the manifest file.

use cachebust_cli::core::CachebustError;
use cachebust_cli::manifest::Manifest;
use cachebust_cli::pipeline::run;
use std::sync::Arc;

use crate::common::{FaultyFileSystem, hash, hashed, site};

#[tokio::test]
async fn test_out_dir_mirrors_the_root() {
    let site = site(&[
        ("index.html", r#"<script src="js/app.js"></script>"#),
        ("js/app.js", "x();\n//# sourceMappingURL=app.js.map\n"),
        ("js/app.js.map", "{\"version\":3}"),
        ("robots.txt", "User-agent: *"),
        ("fonts/a.woff2", "FONT"),
    ]);
    let before = site.files().unwrap();
    let dist = site.sibling("dist");

    let report = run(&site.context(site.config().with_out_dir(&dist)).unwrap()).await.unwrap();
    assert!(report.is_success());
    assert_eq!(site.files().unwrap(), before);

    let app_hash = hash("x();\n//# sourceMappingURL=\n");
    let app = format!("app.{app_hash}.js");
    assert_eq!(
        std::fs::read_to_string(dist.join("js").join(&app)).unwrap(),
        format!("x();\n//# sourceMappingURL={app}.map\n")
    );
    assert_eq!(std::fs::read_to_string(dist.join("js").join(format!("{app}.map"))).unwrap(), "{\"version\":3}");
    assert!(!dist.join("js/app.js.map").exists());
    assert!(!dist.join("js/app.js").exists());

    assert_eq!(std::fs::read_to_string(dist.join("robots.txt")).unwrap(), "User-agent: *");
    assert!(dist.join("fonts/a.woff2").is_file());

    let manifest = Manifest::from_json(&std::fs::read_to_string(dist.join("asset-manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest.get("js/app.js"), Some(format!("js/{app}").as_str()));
    assert_eq!(manifest.get("robots.txt"), None);
}

#[tokio::test]
async fn test_source_map_moves_with_its_owner() {
    let css = "a{}\n/*# sourceMappingURL=site.css.map */\n";
    let site = site(&[("site.css", css), ("site.css.map", "{}")]);
    run(&site.context(site.config()).unwrap()).await.unwrap();

    let name = hashed("site.css", "a{}\n/*# sourceMappingURL= */\n");
    assert_eq!(site.files().unwrap(), vec!["asset-manifest.json".to_string(), name.clone(), format!("{name}.map")]);
    assert_eq!(site.read(&name).unwrap(), format!("a{{}}\n/*# sourceMappingURL={name}.map */\n"));
}

#[tokio::test]
async fn test_dry_run_changes_nothing() {
    let site = site(&[("index.html", r#"<img src="a.png">"#), ("a.png", "A")]);
    let before = site.files().unwrap();

    let mut config = site.config();
    config.dry_run = true;
    let report = run(&site.context(config).unwrap()).await.unwrap();

    assert!(report.write.is_none());
    assert_eq!(report.manifest.get("a.png"), Some(hashed("a.png", "A").as_str()));
    assert_eq!(site.files().unwrap(), before);
}

#[tokio::test]
async fn test_custom_manifest_location() {
    let site = site(&[("app.js", "1")]);
    let config = site.config().with_manifest_file("meta/manifest.json");
    run(&site.context(config).unwrap()).await.unwrap();

    let manifest = site.manifest("meta/manifest.json").unwrap();
    assert_eq!(manifest.get("app.js"), Some(hashed("app.js", "1").as_str()));
    assert!(!site.exists("asset-manifest.json"));
}

#[tokio::test]
async fn test_excluded_files_are_ignored() {
    let site = site(&[("legacy/old.css", "a{background:url(gone.png)}"), ("app.js", "1")]);
    let config = site.config().with_exclude("legacy/**").unwrap();
    let report = run(&site.context(config).unwrap()).await.unwrap();

    assert_eq!(report.documents, 1);
    assert!(site.exists("legacy/old.css"));
}

#[tokio::test]
async fn test_reference_to_skipped_file_is_inconsistent() {
    let site = site(&[("index.html", r#"<a href="debug.js.map">map</a>"#), ("debug.js.map", "{}")]);
    let err = run(&site.context(site.config()).unwrap()).await.unwrap_err();

    assert!(err.chain().any(|cause| matches!(
        cause.downcast_ref::<CachebustError>(),
        Some(CachebustError::GraphInconsistency { .. })
    )));
    assert!(site.exists("index.html"));
}

#[tokio::test]
async fn test_unreadable_files_are_reported_and_skipped() {
    let site = site(&[
        ("index.html", r#"<img src="logo.png">"#),
        ("logo.png", "L"),
        ("private/notes.txt", "secret"),
    ]);
    let dist = site.sibling("dist");
    let fs = Arc::new(FaultyFileSystem::new().deny_read(site.path("private")));
    let ctx = site.context_with_fs(site.config().with_out_dir(&dist), fs).unwrap();

    let report = run(&ctx).await.unwrap();
    assert!(!report.is_success());
    assert_eq!(report.unreadable.len(), 1);
    assert_eq!(report.unreadable[0].relative, "private/notes.txt");

    let manifest = Manifest::from_json(&std::fs::read_to_string(dist.join("asset-manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest.len(), 2);
    assert!(dist.join(hashed("logo.png", "L")).is_file());
    assert!(!dist.join("private/notes.txt").exists());
}
