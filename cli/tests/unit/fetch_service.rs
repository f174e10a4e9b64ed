//! Orchestrator tests against an in-memory host.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use debfetch::application::services::fetch::{FetchOptions, cleanup_scratch_dir, fetch_package};
use debfetch::domain::{FetchError, ResolutionRequest, ResolveMode, StrategyKind};

use crate::mocks::{FakeHost, RecordingReporter};

const THREE_URIS: &str = "\
'http://deb.debian.org/debian/pool/main/c/curl/curl_7.88.1-10_amd64.deb' curl_7.88.1-10_amd64.deb 315000 SHA256:aa
'http://deb.debian.org/debian/pool/main/c/curl/libcurl4_7.88.1-10_amd64.deb' libcurl4_7.88.1-10_amd64.deb 390000 SHA256:bb
'http://deb.debian.org/debian/pool/main/o/openssl/libssl3_3.0.11-1_amd64.deb' libssl3_3.0.11-1_amd64.deb 2000000 SHA256:cc
";

const CURL_APT_CACHE: &str = "\
curl
  Depends: libcurl4 (= 7.88.1-10)
  Depends: libc6 (>= 2.34)
  Recommends: ca-certificates
libcurl4
  Depends: libssl3
  Depends: <libc-dev>
libssl3
";

fn options<'a>(
    reporter: &'a RecordingReporter,
    dir: &'a Path,
    mode: ResolveMode,
    excludes: &[&str],
) -> FetchOptions<'a, RecordingReporter> {
    FetchOptions {
        reporter,
        request: ResolutionRequest::new(
            "curl",
            excludes.iter().map(ToString::to_string).collect(),
        )
        .expect("valid request"),
        mode,
        local_dir: dir,
        assume_yes: false,
        timeout: None,
    }
}

fn local_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_print_uris_success_fetches_every_file_and_cleans_up() {
    let host = FakeHost::debian().print_uris(0, THREE_URIS);
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");

    let outcome = fetch_package(&host, options(&reporter, out.path(), ResolveMode::Auto, &[]))
        .await
        .expect("fetches");

    assert_eq!(outcome.strategy, StrategyKind::PrintUris);
    assert_eq!(outcome.files.len(), 3);
    assert_eq!(
        local_names(out.path()),
        vec![
            "curl_7.88.1-10_amd64.deb",
            "libcurl4_7.88.1-10_amd64.deb",
            "libssl3_3.0.11-1_amd64.deb",
        ]
    );
    assert_eq!(host.removed(), vec![outcome.scratch_dir.clone()]);
    assert!(host.live_dirs().is_empty());
}

#[tokio::test]
async fn test_auto_mode_with_uris_never_runs_expansion() {
    let host = FakeHost::debian().with("apt-rdepends").print_uris(0, THREE_URIS);
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");

    fetch_package(&host, options(&reporter, out.path(), ResolveMode::Auto, &[]))
        .await
        .expect("fetches");

    let programs = host.programs();
    assert!(!programs.iter().any(|p| p == "apt-rdepends" || p == "apt-cache"));
    assert!(!host.ran("command -v apt-rdepends"));
    assert!(!host.ran("apt-get download"));
}

#[tokio::test]
async fn test_empty_print_uris_falls_back_to_apt_cache() {
    let host = FakeHost::debian()
        .print_uris(0, "")
        .apt_cache(0, CURL_APT_CACHE);
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");

    let outcome = fetch_package(
        &host,
        options(&reporter, out.path(), ResolveMode::Auto, &["libc6"]),
    )
    .await
    .expect("falls back");

    assert_eq!(outcome.strategy, StrategyKind::AptCacheDepends);
    assert_eq!(
        outcome.strategy.label(),
        "apt-cache depends + apt-get download"
    );
    let downloads: Vec<String> = host
        .commands()
        .into_iter()
        .filter(|c| c.contains("apt-get download"))
        .collect();
    assert_eq!(downloads.len(), 3, "got: {downloads:?}");
    assert!(downloads[0].ends_with("apt-get download curl"));
    assert!(downloads[1].ends_with("apt-get download libcurl4"));
    assert!(downloads[2].ends_with("apt-get download libssl3"));
    assert_eq!(
        local_names(out.path()),
        vec![
            "curl_1.0_amd64.deb",
            "libcurl4_1.0_amd64.deb",
            "libssl3_1.0_amd64.deb"
        ]
    );
    let warnings = reporter.warnings();
    assert!(warnings.iter().any(|w| w.contains("No URIs returned")));
    assert!(warnings.iter().any(|w| w.contains("apt-rdepends not found")));
}

#[tokio::test]
async fn test_assume_yes_silences_empty_uri_warning() {
    let host = FakeHost::debian()
        .print_uris(0, "")
        .apt_cache(0, CURL_APT_CACHE);
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");
    let mut opts = options(&reporter, out.path(), ResolveMode::Auto, &[]);
    opts.assume_yes = true;

    fetch_package(&host, opts).await.expect("falls back");

    assert!(
        !reporter
            .warnings()
            .iter()
            .any(|w| w.contains("No URIs returned"))
    );
}

#[tokio::test]
async fn test_rdepends_preferred_when_installed() {
    let host = FakeHost::debian()
        .with("apt-rdepends")
        .rdepends("curl\n  Depends: libcurl4\nlibcurl4\n  Depends: libc6\nlibc6\n");
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");

    let outcome = fetch_package(
        &host,
        options(&reporter, out.path(), ResolveMode::Rdepends, &["libc6"]),
    )
    .await
    .expect("fetches");

    assert_eq!(outcome.strategy, StrategyKind::AptRdepends);
    assert!(!host.ran("--print-uris"));
    assert!(!host.programs().iter().any(|p| p == "apt-cache"));
    assert_eq!(
        local_names(out.path()),
        vec!["curl_1.0_amd64.deb", "libcurl4_1.0_amd64.deb"]
    );
}

#[tokio::test]
async fn test_forced_uris_failure_has_no_fallback_and_keeps_scratch() {
    let host = FakeHost::debian()
        .with("apt-rdepends")
        .print_uris(100, "")
        .rdepends("curl\n");
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");

    let err = fetch_package(&host, options(&reporter, out.path(), ResolveMode::Uris, &[]))
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            FetchError::Resolution {
                strategy: StrategyKind::PrintUris,
                ..
            }
        ),
        "got: {err}"
    );
    assert!(!host.programs().iter().any(|p| p == "apt-rdepends"));
    assert!(host.removed().is_empty());
    assert_eq!(host.live_dirs().len(), 1);
    assert!(local_names(out.path()).is_empty());
}

#[tokio::test]
async fn test_both_strategies_failing_reports_both_causes() {
    let host = FakeHost::debian()
        .print_uris(100, "")
        .apt_cache(1, "");
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");

    let err = fetch_package(&host, options(&reporter, out.path(), ResolveMode::Auto, &[]))
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(matches!(err, FetchError::BothStrategiesFailed { .. }));
    assert!(msg.contains("print-uris failed: exit code 100"), "got: {msg}");
    assert!(
        msg.contains("apt-cache depends + apt-get download failed: exit code 1"),
        "got: {msg}"
    );
    assert!(host.removed().is_empty());
}

#[tokio::test]
async fn test_download_failure_on_uri_path_falls_back_in_auto_mode() {
    let host = FakeHost::debian()
        .print_uris(0, THREE_URIS)
        .failing("http://deb.debian.org/debian/pool/main/o/openssl/libssl3_3.0.11-1_amd64.deb")
        .apt_cache(0, CURL_APT_CACHE);
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");

    let outcome = fetch_package(&host, options(&reporter, out.path(), ResolveMode::Auto, &[]))
        .await
        .expect("falls back");

    assert_eq!(outcome.strategy, StrategyKind::AptCacheDepends);
    assert!(
        reporter
            .warnings()
            .iter()
            .any(|w| w.contains("primary strategy failed"))
    );
}

#[tokio::test]
async fn test_fallback_discards_partial_uri_downloads_so_skip_holds() {
    let host = FakeHost::debian()
        .print_uris(0, THREE_URIS)
        .failing("http://deb.debian.org/debian/pool/main/o/openssl/libssl3_3.0.11-1_amd64.deb")
        .apt_cache(0, CURL_APT_CACHE);
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");

    let outcome = fetch_package(
        &host,
        options(&reporter, out.path(), ResolveMode::Auto, &["libcurl4"]),
    )
    .await
    .expect("falls back");

    assert_eq!(outcome.strategy, StrategyKind::AptCacheDepends);
    assert!(host.ran("-delete"));
    assert_eq!(
        local_names(out.path()),
        vec!["curl_1.0_amd64.deb", "libc6_1.0_amd64.deb", "libssl3_1.0_amd64.deb"]
    );
}

#[tokio::test]
async fn test_unsupported_host_fails_before_scratch_dir() {
    let host = FakeHost::debian().without("apt-get");
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");

    let err = fetch_package(&host, options(&reporter, out.path(), ResolveMode::Auto, &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::UnsupportedHost));
    assert!(!host.programs().iter().any(|p| p == "mktemp"));
}

#[tokio::test]
async fn test_missing_downloader_is_reported() {
    let host = FakeHost::debian()
        .without("wget")
        .print_uris(0, THREE_URIS);
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");

    let err = fetch_package(&host, options(&reporter, out.path(), ResolveMode::Uris, &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::NoDownloader), "got: {err}");
}

#[tokio::test]
async fn test_curl_used_when_wget_absent() {
    let host = FakeHost::debian()
        .without("wget")
        .with("curl")
        .print_uris(0, THREE_URIS);
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");

    let outcome = fetch_package(&host, options(&reporter, out.path(), ResolveMode::Uris, &[]))
        .await
        .expect("fetches");

    assert_eq!(outcome.files.len(), 3);
    assert!(host.programs().iter().any(|p| p == "curl"));
    assert!(!host.programs().iter().any(|p| p == "wget"));
}

#[tokio::test]
async fn test_transfer_failure_keeps_scratch_dir() {
    let host = FakeHost::debian()
        .print_uris(0, THREE_URIS)
        .failing_transfers();
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");

    let err = fetch_package(&host, options(&reporter, out.path(), ResolveMode::Uris, &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Transfer { .. }), "got: {err}");
    assert!(host.removed().is_empty());
}

#[tokio::test]
async fn test_download_without_deb_files_is_no_artifacts() {
    let host = FakeHost::debian().print_uris(
        0,
        "'http://deb.debian.org/debian/dists/bookworm/Release' Release 1000 SHA256:dd\n",
    );
    let reporter = RecordingReporter::default();
    let out = tempfile::tempdir().expect("tempdir");

    let err = fetch_package(&host, options(&reporter, out.path(), ResolveMode::Uris, &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::NoArtifacts { .. }), "got: {err}");
    assert!(host.retrieved().is_empty());
    assert_eq!(host.live_dirs().len(), 1);
}

#[tokio::test]
async fn test_cleanup_of_removed_dir_is_ok() {
    let host = FakeHost::debian();
    cleanup_scratch_dir(&host, "/tmp/debfetch-gone1234")
        .await
        .expect("first");
    cleanup_scratch_dir(&host, "/tmp/debfetch-gone1234")
        .await
        .expect("second");
    assert_eq!(host.removed().len(), 2);
}
