//! Dependency cycles: termination, deterministic breaking and diagnostics.

use cachebust_cli::pipeline::run;

use crate::common::{hashed, site};

#[tokio::test]
async fn test_mutual_imports() {
    let site = site(&[("a.css", "@import \"b.css\";\n"), ("b.css", "@import \"a.css\";\n")]);
    let report = run(&site.context(site.config()).unwrap()).await.unwrap();
    assert!(report.is_success());

    // a.css sorts first, so its reference is the one left stale
    let a = hashed("a.css", "@import \"b.css\";\n");
    let b_contents = format!("@import \"{a}\";\n");
    let b = hashed("b.css", &b_contents);

    assert_eq!(site.read(&a).unwrap(), "@import \"b.css\";\n");
    assert_eq!(site.read(&b).unwrap(), b_contents);
    // the stale reference still has a target, and that target's own import too
    assert_eq!(site.read("b.css").unwrap(), "@import \"a.css\";\n");
    assert!(site.exists("a.css"));

    let manifest = site.manifest("asset-manifest.json").unwrap();
    assert_eq!(manifest.get("a.css"), Some(a.as_str()));
    assert_eq!(manifest.get("b.css"), Some(b.as_str()));
    assert_eq!(manifest.diagnostics.len(), 1);
    let diagnostic = &manifest.diagnostics[0];
    assert_eq!(diagnostic.document, "a.css");
    assert_eq!(diagnostic.specifier, "b.css");
    assert_eq!(diagnostic.target, "b.css");
    assert_eq!(diagnostic.reason, "unresolved-due-to-cycle");

    let raw: serde_json::Value = serde_json::from_str(&site.read("asset-manifest.json").unwrap()).unwrap();
    assert!(raw["#diagnostics"].is_array());
}

#[tokio::test]
async fn test_long_cycle_leaves_one_stale_reference() {
    let site = site(&[
        ("js/a.js", "import './b.js';\n"),
        ("js/b.js", "import './c.js';\n"),
        ("js/c.js", "import './d.js';\n"),
        ("js/d.js", "import './a.js';\n"),
    ]);
    let report = run(&site.context(site.config()).unwrap()).await.unwrap();

    assert_eq!(report.hashed, 4);
    assert_eq!(report.diagnostics().len(), 1);
    assert_eq!(report.diagnostics()[0].document, "js/a.js");
    // four hashed files, the four originals the stale reference still reaches, the manifest
    assert_eq!(site.files().unwrap().len(), 9);
    assert!(site.exists("js/b.js"));
}

#[tokio::test]
async fn test_page_depending_on_a_cycle_is_fully_rewritten() {
    let site = site(&[
        ("index.html", r#"<link rel="stylesheet" href="a.css">"#),
        ("a.css", "@import \"b.css\";\n"),
        ("b.css", "@import \"a.css\";\n"),
    ]);
    let report = run(&site.context(site.config()).unwrap()).await.unwrap();

    assert_eq!(report.diagnostics().len(), 1);
    assert_eq!(report.diagnostics()[0].document, "a.css");

    let a = hashed("a.css", "@import \"b.css\";\n");
    let index = site.read(report.manifest.get("index.html").unwrap()).unwrap();
    assert_eq!(index, format!(r#"<link rel="stylesheet" href="{a}">"#));
    assert!(!site.exists("index.html"));
}

#[tokio::test]
async fn test_self_import() {
    let site = site(&[("loop.css", "@import url(loop.css);\nbody{}\n")]);
    let report = run(&site.context(site.config()).unwrap()).await.unwrap();

    assert_eq!(report.diagnostics().len(), 1);
    let name = hashed("loop.css", "@import url(loop.css);\nbody{}\n");
    assert_eq!(site.read(&name).unwrap(), "@import url(loop.css);\nbody{}\n");
    assert!(site.exists("loop.css"));
}
