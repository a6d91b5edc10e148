// tests/path_filter.rs

mod common;
use crate::common::DevloopConfigBuilder;

use proptest::prelude::*;

use devloop::watch::PathFilter;

const EXCLUSION_TOKENS: &[&str] = &["node_modules", "dist", ".git", "build", ".DS_Store"];
const RECOGNIZED: &[&str] = &["go", "svelte", "css", "html", "ts", "js"];

fn filter() -> PathFilter {
    PathFilter::default()
}

#[test]
fn recognized_source_files_are_relevant() {
    let f = filter();
    assert!(f.is_relevant("main.go"));
    assert!(f.is_relevant("app/routes/page.svelte"));
    assert!(f.is_relevant("src/app.css"));
    assert!(f.is_relevant("web/index.html"));
    assert!(f.is_relevant("src/lib/util.ts"));
    assert!(f.is_relevant("src/lib/util.js"));
}

#[test]
fn unrecognized_extension_is_ignored() {
    let f = filter();
    assert!(!f.is_relevant("readme.md"));
    assert!(!f.is_relevant("assets/logo.png"));
    assert!(!f.is_relevant("go.sum"));
}

#[test]
fn extensionless_files_count_as_config() {
    let f = filter();
    assert!(f.is_relevant("Makefile"));
    assert!(f.is_relevant("src/components"));
    assert!(f.is_relevant(".env"));
}

#[test]
fn excluded_directories_win_over_extension() {
    let f = filter();
    assert!(!f.is_relevant("node_modules/pkg/index.js"));
    assert!(!f.is_relevant("dist/app.js"));
    assert!(!f.is_relevant(".git/HEAD"));
    assert!(!f.is_relevant("build/out.go"));
}

#[test]
fn temp_and_system_files_are_ignored() {
    let f = filter();
    assert!(!f.is_relevant("src/.DS_Store"));
    assert!(!f.is_relevant("src/main.go~"));
    assert!(!f.is_relevant("src/main.go.tmp"));
    assert!(!f.is_relevant("src/swap.temp"));
}

#[test]
fn temp_prefix_in_a_source_name_is_fine() {
    let f = filter();
    assert!(f.is_relevant("src/temp-converter.go"));
    assert!(f.is_relevant("web/temp-gauge.svelte"));
}

#[test]
fn extension_match_is_case_sensitive() {
    let f = filter();
    assert!(!f.is_relevant("src/Main.GO"));
    assert!(!f.is_relevant("src/App.CSS"));
    assert!(!f.is_relevant("src/util.Ts"));
    assert!(f.is_relevant("src/Main.go"));
}

#[test]
fn configured_extensions_keep_their_case() {
    let cfg = DevloopConfigBuilder::new().extensions(&["GO"]).build();
    let f = PathFilter::from_config(&cfg);

    assert!(f.is_relevant("main.GO"));
    assert!(!f.is_relevant("main.go"));
}

#[test]
fn stages_can_be_asked_separately() {
    let f = filter();
    assert!(f.is_excluded("node_modules/x"));
    assert!(!f.is_excluded("src/v1.2"));
    assert!(!f.has_accepted_extension("src/v1.2"));
    assert!(f.has_accepted_extension("src/lib"));
}

#[test]
fn filter_follows_configured_extensions() {
    let cfg = DevloopConfigBuilder::new()
        .extensions(&["rs", ".toml"])
        .build();
    let f = PathFilter::from_config(&cfg);

    assert!(f.is_relevant("src/main.rs"));
    assert!(f.is_relevant("Cargo.toml"));
    assert!(!f.is_relevant("src/main.go"));
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}".prop_filter("must not contain exclusion tokens", |s| {
        !EXCLUSION_TOKENS.iter().any(|t| s.contains(t))
    })
}

fn clean_dir() -> impl Strategy<Value = String> {
    proptest::collection::vec(segment(), 0..4).prop_map(|parts| parts.join("/"))
}

fn join(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}

proptest! {
    #[test]
    fn any_exclusion_token_rejects(
        dir in clean_dir(),
        stem in segment(),
        token in proptest::sample::select(EXCLUSION_TOKENS),
        ext in proptest::sample::select(RECOGNIZED),
    ) {
        let with_dir = join(&join(&dir, token), &format!("{stem}.{ext}"));
        prop_assert!(!filter().is_relevant(&with_dir));

        let in_name = join(&dir, &format!("{stem}{token}.{ext}"));
        prop_assert!(!filter().is_relevant(&in_name));
    }

    #[test]
    fn recognized_extension_without_tokens_accepts(
        dir in clean_dir(),
        stem in segment(),
        ext in proptest::sample::select(RECOGNIZED),
    ) {
        let path = join(&dir, &format!("{stem}.{ext}"));
        prop_assert!(filter().is_relevant(&path));
    }

    #[test]
    fn unrecognized_extension_without_tokens_rejects(
        dir in clean_dir(),
        stem in segment(),
        ext in "[a-zA-Z]{1,5}".prop_filter("not recognized", |e| !RECOGNIZED.contains(&e.as_str())),
    ) {
        let path = join(&dir, &format!("{stem}.{ext}"));
        prop_assert!(!filter().is_relevant(&path));
    }
}
