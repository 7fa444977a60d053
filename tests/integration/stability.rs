//! Determinism across runs and stable names when re-running over hashed output.

use cachebust_cli::pipeline::run;
use std::collections::BTreeMap;

use crate::common::{TestSite, site};

const FILES: &[(&str, &str)] = &[
    ("index.html", r#"<link rel="stylesheet" href="css/a.css"><script type="module" src="js/app.js"></script>"#),
    ("css/a.css", "body{background:url(../img/bg.png)}\n"),
    ("img/bg.png", "PNG"),
    ("js/app.js", "import './util.js';\n//# sourceMappingURL=app.js.map\n"),
    ("js/app.js.map", "{\"version\":3,\"sources\":[]}"),
    ("js/util.js", "export const u = 1;\n"),
];

/// Cycle breaking keeps both originals, so a re-run also produces new files for
/// the hashed copies and is checked separately.
const CYCLE: &[(&str, &str)] = &[
    ("css/x.css", "@import \"y.css\";\n"),
    ("css/y.css", "@import \"x.css\";\n"),
];

fn snapshot(site: &TestSite) -> BTreeMap<String, String> {
    site.files()
        .unwrap()
        .into_iter()
        .map(|file| {
            let contents = site.read(&file).unwrap();
            (file, contents)
        })
        .collect()
}

#[tokio::test]
async fn test_two_runs_produce_identical_output() {
    let files: Vec<(&str, &str)> = FILES.iter().chain(CYCLE).copied().collect();
    let first = site(&files);
    let second = site(&files);

    let first_report = run(&first.context(first.config()).unwrap()).await.unwrap();
    let second_report = run(&second.context(second.config()).unwrap()).await.unwrap();

    assert_eq!(first_report.manifest, second_report.manifest);
    assert_eq!(snapshot(&first), snapshot(&second));
}

#[tokio::test]
async fn test_rerun_keeps_hashed_names() {
    let site = site(FILES);
    let ctx = site.context(site.config()).unwrap();

    let first = run(&ctx).await.unwrap();
    let after_first = snapshot(&site);

    let second = run(&ctx).await.unwrap();
    assert!(second.is_success());
    let mut after_second = snapshot(&site);

    // Only the manifest differs: it now maps hashed names to themselves
    after_second.remove("asset-manifest.json");
    let mut expected = after_first.clone();
    expected.remove("asset-manifest.json");
    assert_eq!(after_second, expected);

    for (original, hashed) in &first.manifest.entries {
        assert_ne!(original, hashed);
        assert_eq!(second.manifest.get(hashed), Some(hashed.as_str()));
    }
    assert_eq!(second.write.unwrap().removed.len(), 0);
}

#[tokio::test]
async fn test_content_change_renames_dependents() {
    let before = site(&[("index.html", r#"<img src="a.png">"#), ("a.png", "v1"), ("b.png", "v1")]);
    let after = site(&[("index.html", r#"<img src="a.png">"#), ("a.png", "v2"), ("b.png", "v1")]);

    let before = run(&before.context(before.config()).unwrap()).await.unwrap().manifest;
    let after = run(&after.context(after.config()).unwrap()).await.unwrap().manifest;

    assert_ne!(before.get("a.png"), after.get("a.png"));
    assert_ne!(before.get("index.html"), after.get("index.html"));
    // unreferenced and unparsed, so never hashed
    assert_eq!(before.get("b.png"), None);
}

#[tokio::test]
async fn test_rerun_over_cyclic_output() {
    let site = site(CYCLE);
    let ctx = site.context(site.config()).unwrap();

    let first = run(&ctx).await.unwrap();
    let x = first.manifest.get("css/x.css").unwrap().to_string();
    let y = first.manifest.get("css/y.css").unwrap().to_string();
    let x_contents = site.read(&x).unwrap();
    let y_contents = site.read(&y).unwrap();
    assert_eq!(x_contents, "@import \"y.css\";\n");
    assert!(site.exists("css/y.css"));

    let second = run(&ctx).await.unwrap();
    assert!(second.is_success());
    assert_eq!(second.manifest.get("css/x.css"), Some(x.as_str()));
    assert_eq!(second.manifest.get("css/y.css"), Some(y.as_str()));
    assert_eq!(second.diagnostics(), first.diagnostics());
    assert_eq!(site.read(&x).unwrap(), x_contents);
    assert_eq!(site.read(&y).unwrap(), y_contents);
}
