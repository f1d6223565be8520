use std::io::Write;

use super::*;

fn entry(url: &str, label: Option<&str>) -> WatchlistEntry {
    WatchlistEntry {
        url: url.to_string(),
        label: label.map(str::to_string),
        use_proxy: false,
    }
}

#[test]
fn dedup_key_ignores_case_and_trailing_slash() {
    let a = entry("https://Shop.Example.com/produto/1/", None);
    let b = entry("https://shop.example.com/produto/1", None);
    assert_eq!(a.dedup_key(), b.dedup_key());
}

#[test]
fn display_name_falls_back_to_url() {
    assert_eq!(
        entry("https://shop.example.com/p", None).display_name(),
        "https://shop.example.com/p"
    );
    assert_eq!(
        entry("https://shop.example.com/p", Some("Phone")).display_name(),
        "Phone"
    );
}

#[test]
fn validate_accepts_distinct_urls() {
    let watchlist = WatchlistFile {
        items: vec![
            entry("https://shop.example.com/produto/1", Some("One")),
            entry("http://other.example.com/item?id=2", None),
        ],
    };
    assert!(validate_watchlist(&watchlist).is_ok());
}

#[test]
fn validate_rejects_relative_url() {
    let watchlist = WatchlistFile {
        items: vec![entry("/produto/1", None)],
    };
    let err = validate_watchlist(&watchlist).unwrap_err();
    assert!(err.to_string().contains("absolute http(s) URL"));
}

#[test]
fn validate_rejects_scheme_without_host() {
    let watchlist = WatchlistFile {
        items: vec![entry("https://", None)],
    };
    assert!(validate_watchlist(&watchlist).is_err());
}

#[test]
fn validate_rejects_duplicate_urls() {
    let watchlist = WatchlistFile {
        items: vec![
            entry("https://shop.example.com/produto/1", None),
            entry("https://SHOP.example.com/produto/1/", None),
        ],
    };
    let err = validate_watchlist(&watchlist).unwrap_err();
    assert!(err.to_string().contains("duplicate watchlist url"));
}

#[test]
fn validate_rejects_blank_label() {
    let watchlist = WatchlistFile {
        items: vec![entry("https://shop.example.com/produto/1", Some("  "))],
    };
    let err = validate_watchlist(&watchlist).unwrap_err();
    assert!(err.to_string().contains("empty label"));
}

#[test]
fn parses_use_proxy_flag_with_default() {
    let yaml = r"
items:
  - url: https://shop.example.com/produto/1
    label: Phone
    use_proxy: true
  - url: https://shop.example.com/produto/2
";
    let file: WatchlistFile = serde_yaml::from_str(yaml).expect("parse");
    assert_eq!(file.items.len(), 2);
    assert!(file.items[0].use_proxy);
    assert!(!file.items[1].use_proxy);
    assert!(file.items[1].label.is_none());
}

#[test]
fn load_watchlist_reports_missing_file() {
    let err = load_watchlist(Path::new("/definitely/not/here.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::WatchlistIo { .. }));
}

#[test]
fn load_watchlist_reports_parse_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "items: [this is: not: valid").expect("write");
    let err = load_watchlist(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::WatchlistParse(_)));
}

#[test]
fn load_watchlist_from_real_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("watchlist.yaml");
    assert!(
        path.exists(),
        "watchlist.yaml missing at {path:?}: required for this test"
    );
    let watchlist = load_watchlist(&path).expect("failed to load watchlist.yaml");
    assert!(
        !watchlist.items.is_empty(),
        "watchlist.yaml should contain at least one item"
    );
}
