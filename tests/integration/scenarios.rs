//! Hashing and rewriting across the built-in plugins.

use cachebust_cli::core::CachebustError;
use cachebust_cli::pipeline::run;

use crate::common::{hashed, site};

#[tokio::test]
async fn test_script_reference_scenario() {
    let site = site(&[("index.html", r#"<script src="/app.js"></script>"#), ("app.js", "const x=1;")]);

    let report = run(&site.context(site.config()).unwrap()).await.unwrap();
    assert!(report.is_success());

    let app = hashed("app.js", "const x=1;");
    let html = format!(r#"<script src="{app}"></script>"#);
    let index = hashed("index.html", &html);

    assert_eq!(site.read(&app).unwrap(), "const x=1;");
    assert_eq!(site.read(&index).unwrap(), html);
    assert!(!site.exists("app.js"));
    assert!(!site.exists("index.html"));

    let manifest = site.manifest("asset-manifest.json").unwrap();
    assert_eq!(manifest.get("app.js"), Some(app.as_str()));
    assert_eq!(manifest.get("index.html"), Some(index.as_str()));
    assert_eq!(manifest.len(), 2);
}

#[tokio::test]
async fn test_nested_directories() {
    let css = "body{background:url(../img/bg.png)}";
    let site = site(&[
        ("index.html", r#"<link rel="stylesheet" href="css/site.css"><img src="img/bg.png" alt="">"#),
        ("css/site.css", css),
        ("img/bg.png", "PNG"),
    ]);

    run(&site.context(site.config()).unwrap()).await.unwrap();

    let png = hashed("bg.png", "PNG");
    let rewritten_css = format!("body{{background:url(../img/{png})}}");
    let css_name = hashed("site.css", &rewritten_css);
    assert_eq!(site.read(&format!("css/{css_name}")).unwrap(), rewritten_css);

    let manifest = site.manifest("asset-manifest.json").unwrap();
    let index = site.read(manifest.get("index.html").unwrap()).unwrap();
    assert_eq!(index, format!(r#"<link rel="stylesheet" href="css/{css_name}"><img src="img/{png}" alt="">"#));
    assert_eq!(manifest.get("img/bg.png"), Some(format!("img/{png}").as_str()));
}

#[tokio::test]
async fn test_external_references_are_untouched() {
    let html = r#"<img src="https://example.com/x.png"><a href="mailto:a@b.test">m</a><a href="about">about</a><img src="data:image/png;base64,AAA=">"#;
    let site = site(&[("index.html", html)]);

    let report = run(&site.context(site.config()).unwrap()).await.unwrap();
    assert_eq!(report.manifest.len(), 1);
    assert_eq!(site.read(&hashed("index.html", html)).unwrap(), html);
}

#[tokio::test]
async fn test_query_and_fragment_are_preserved() {
    let site = site(&[
        ("index.html", r#"<img src="logo.png?v=2#x"><use href="icons.svg#home"></use>"#),
        ("logo.png", "L"),
        ("icons.svg", "<svg/>"),
    ]);
    let report = run(&site.context(site.config()).unwrap()).await.unwrap();

    let html = site.read(report.manifest.get("index.html").unwrap()).unwrap();
    assert_eq!(
        html,
        format!(
            r#"<img src="{}?v=2#x"><use href="{}#home"></use>"#,
            hashed("logo.png", "L"),
            hashed("icons.svg", "<svg/>")
        )
    );
}

#[tokio::test]
async fn test_javascript_modules() {
    let site = site(&[
        ("js/main.js", "import { a } from './lib/a.js';\nconst b = import('./lib/b.js');\n// import './commented.js';\n"),
        ("js/lib/a.js", "export const a = 1;\n"),
        ("js/lib/b.js", "export default 2;\n"),
    ]);
    let report = run(&site.context(site.config()).unwrap()).await.unwrap();
    assert_eq!(report.hashed, 3);

    let a = hashed("a.js", "export const a = 1;\n");
    let b = hashed("b.js", "export default 2;\n");
    let main = site.read(report.manifest.get("js/main.js").unwrap()).unwrap();
    assert_eq!(
        main,
        format!("import {{ a }} from './lib/{a}';\nconst b = import('./lib/{b}');\n// import './commented.js';\n")
    );
}

#[tokio::test]
async fn test_package_entry_point() {
    let site = site(&[
        ("app.js", "import './vendor/widget';\n"),
        ("vendor/widget/package.json", r#"{"name":"widget","module":"dist/widget.mjs"}"#),
        ("vendor/widget/dist/widget.mjs", "export {};\n"),
    ]);
    let report = run(&site.context(site.config()).unwrap()).await.unwrap();

    let widget = hashed("widget.mjs", "export {};\n");
    let app = site.read(report.manifest.get("app.js").unwrap()).unwrap();
    assert_eq!(app, format!("import './vendor/widget/dist/{widget}';\n"));
}

#[tokio::test]
async fn test_unreferenced_pass_through_keeps_its_name() {
    let site = site(&[("index.html", "<p>hi</p>"), ("robots.txt", "User-agent: *")]);
    let report = run(&site.context(site.config()).unwrap()).await.unwrap();

    assert!(site.exists("robots.txt"));
    assert_eq!(report.manifest.get("robots.txt"), None);
    assert_eq!(report.documents, 2);
    assert_eq!(report.hashed, 1);
}

#[tokio::test]
async fn test_missing_file_reference_aborts() {
    let site = site(&[("css/site.css", "a{background:url(missing.png)}")]);
    let err = run(&site.context(site.config()).unwrap()).await.unwrap_err();

    let resolution = err.chain().find_map(|cause| cause.downcast_ref::<CachebustError>());
    match resolution {
        Some(CachebustError::Resolution {
            specifier,
            directory,
        }) => {
            assert_eq!(specifier, "missing.png");
            assert!(directory.ends_with("css"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(site.exists("css/site.css"));
}

#[tokio::test]
async fn test_base_url() {
    let site = site(&[("index.html", r#"<script src="js/app.js"></script>"#), ("js/app.js", "1")]);
    let config = site.config().with_base_url("https://cdn.example.com/");
    let report = run(&site.context(config).unwrap()).await.unwrap();

    let app = format!("https://cdn.example.com/js/{}", hashed("app.js", "1"));
    assert_eq!(report.manifest.get("js/app.js"), Some(app.as_str()));
    let index = report.manifest.get("index.html").unwrap();
    let local = index.strip_prefix("https://cdn.example.com/").unwrap();
    assert_eq!(site.read(local).unwrap(), format!(r#"<script src="{app}"></script>"#));
}
