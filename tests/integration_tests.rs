use sortdir::cli::{Cli, run_cli};
/// Integration tests for sortdir
///
/// These tests exercise complete runs against real temporary directories.
///
/// Test categories:
/// 1. Copy and move workflows
/// 2. Dry-run verification
/// 3. Recursive collection and flattening
/// 4. Collisions and failures
/// 5. Command-line entry point and settings files
use sortdir::config::{Mode, RunConfig, RunOptions};
use sortdir::coordinator::{NullReporter, RunCoordinator, RunSummary};
use sortdir::file_transfer::TransferEngine;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary workspace with a `src` directory and room for a separate
/// destination and settings files next to it.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("src")).expect("Failed to create src");
        TestFixture { temp_dir }
    }

    fn src(&self) -> PathBuf {
        self.temp_dir.path().join("src")
    }

    fn dest(&self) -> PathBuf {
        self.temp_dir.path().join("dest")
    }

    /// Create a file under `src`, creating parent directories as needed.
    fn create_file(&self, rel_path: &str, content: &[u8]) {
        let path = self.src().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write file");
    }

    /// The three-file layout used by the end-to-end scenarios.
    fn create_basic_files(&self) {
        self.create_file("a.jpg", b"\xFF\xD8\xFFjpeg bytes");
        self.create_file("b.txt", b"plain text");
        self.create_file("c", b"no extension");
    }

    /// Write an empty settings file outside the source tree.
    fn settings_file(&self, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join("settings.toml");
        fs::write(&path, content).expect("Failed to write settings");
        path
    }

    fn options(&self, mode: Mode) -> RunOptions {
        RunOptions {
            source: self.src(),
            dest: Some(self.dest()),
            mode,
            ..Default::default()
        }
    }

    fn run(&self, options: RunOptions) -> RunSummary {
        let config = RunConfig::new(options).expect("Invalid configuration");
        RunCoordinator::new(&config)
            .run(&mut NullReporter)
            .expect("Run failed")
    }

    /// Every file under the workspace, keyed by relative path.
    fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(self.temp_dir.path())
            .into_iter()
            .filter_map(Result::ok)
            .map(|entry| {
                let rel = entry
                    .path()
                    .strip_prefix(self.temp_dir.path())
                    .unwrap()
                    .to_path_buf();
                let bytes = if entry.file_type().is_file() {
                    fs::read(entry.path()).unwrap()
                } else {
                    Vec::new()
                };
                (rel, bytes)
            })
            .collect()
    }
}

fn assert_file_content(path: &Path, expected: &[u8]) {
    assert_eq!(
        fs::read(path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e)),
        expected,
        "content of {}",
        path.display()
    );
}

fn cross_device(_: &Path, _: &Path) -> io::Result<()> {
    Err(io::Error::other("simulated cross-device link"))
}

// ============================================================================
// Copy and Move Workflows
// ============================================================================

#[test]
fn test_copy_into_empty_destination() {
    let fixture = TestFixture::new();
    fixture.create_basic_files();

    let summary = fixture.run(fixture.options(Mode::Copy));

    assert_eq!(summary.counts(), (3, 3, 0, 0));
    assert_file_content(&fixture.dest().join("images/a.jpg"), b"\xFF\xD8\xFFjpeg bytes");
    assert_file_content(&fixture.dest().join("documents/b.txt"), b"plain text");
    assert_file_content(&fixture.dest().join("no_extension/c"), b"no extension");
    for name in ["a.jpg", "b.txt", "c"] {
        assert!(fixture.src().join(name).exists(), "{name} should remain");
    }
}

#[test]
fn test_move_into_empty_destination() {
    let fixture = TestFixture::new();
    fixture.create_basic_files();

    let summary = fixture.run(fixture.options(Mode::Move));

    assert_eq!(summary.counts(), (3, 3, 0, 0));
    assert_file_content(&fixture.dest().join("images/a.jpg"), b"\xFF\xD8\xFFjpeg bytes");
    assert_file_content(&fixture.dest().join("documents/b.txt"), b"plain text");
    assert_file_content(&fixture.dest().join("no_extension/c"), b"no extension");
    assert_eq!(fs::read_dir(fixture.src()).unwrap().count(), 0);
}

#[test]
fn test_move_across_devices_falls_back_to_copy_and_delete() {
    let fixture = TestFixture::new();
    fixture.create_basic_files();

    let config = RunConfig::new(fixture.options(Mode::Move)).unwrap();
    let engine = TransferEngine::new(Mode::Move, false).with_rename(cross_device);
    let summary = RunCoordinator::new(&config)
        .with_engine(engine)
        .run(&mut NullReporter)
        .unwrap();

    assert_eq!(summary.counts(), (3, 3, 0, 0));
    assert_file_content(&fixture.dest().join("documents/b.txt"), b"plain text");
    assert!(!fixture.src().join("b.txt").exists());
    assert_eq!(fs::read_dir(fixture.src()).unwrap().count(), 0);
}

#[test]
fn test_in_place_move_keeps_category_dirs_beside_files() {
    let fixture = TestFixture::new();
    fixture.create_basic_files();

    let summary = fixture.run(RunOptions {
        source: fixture.src(),
        ..Default::default()
    });

    assert_eq!(summary.counts(), (3, 3, 0, 0));
    assert!(fixture.src().join("images/a.jpg").is_file());
    assert!(fixture.src().join("no_extension/c").is_file());
    assert!(!fixture.src().join("a.jpg").exists());
}

#[test]
fn test_every_category_is_reachable() {
    let fixture = TestFixture::new();
    let files = [
        ("photo.PNG", "images"),
        ("movie.mkv", "videos"),
        ("track.flac", "audio"),
        ("sheet.xlsx", "documents"),
        ("bundle.tgz", "archives"),
        ("main.go", "code"),
        ("README", "no_extension"),
        ("setup.exe", "other"),
        (".bashrc", "other"),
    ];
    for (name, _) in &files {
        fixture.create_file(name, name.as_bytes());
    }

    let summary = fixture.run(fixture.options(Mode::Copy));

    assert_eq!(summary.succeeded, files.len());
    for (name, category) in &files {
        assert_file_content(&fixture.dest().join(category).join(name), name.as_bytes());
    }
}

// ============================================================================
// Dry-Run Verification
// ============================================================================

#[test]
fn test_dry_run_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_basic_files();
    let before = fixture.snapshot();

    let summary = fixture.run(RunOptions {
        dry_run: true,
        ..fixture.options(Mode::Move)
    });

    assert_eq!(summary.counts(), (3, 3, 0, 0));
    assert!(!fixture.dest().exists());
    assert_eq!(fixture.snapshot(), before);
}

#[test]
fn test_dry_run_is_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_basic_files();
    fixture.create_file("nested/d.mp4", b"video");
    let before = fixture.snapshot();

    let options = RunOptions {
        dry_run: true,
        recursive: true,
        ..fixture.options(Mode::Copy)
    };
    let first = fixture.run(options.clone());
    let second = fixture.run(options);

    assert_eq!(first.counts(), second.counts());
    assert_eq!(first.counts(), (4, 4, 0, 0));
    assert_eq!(fixture.snapshot(), before);
}

// ============================================================================
// Recursive Collection and Flattening
// ============================================================================

#[test]
fn test_non_recursive_ignores_subdirectories() {
    let fixture = TestFixture::new();
    fixture.create_file("top.md", b"top");
    fixture.create_file("deep/inner.md", b"inner");

    let summary = fixture.run(fixture.options(Mode::Copy));

    assert_eq!(summary.counts(), (1, 1, 0, 0));
    assert!(fixture.dest().join("documents/top.md").exists());
    assert!(!fixture.dest().join("documents/inner.md").exists());
}

#[test]
fn test_recursive_flattens_into_categories() {
    let fixture = TestFixture::new();
    fixture.create_file("top.md", b"top");
    fixture.create_file("deep/er/inner.md", b"inner");
    fixture.create_file("deep/clip.webm", b"clip");

    let summary = fixture.run(RunOptions {
        recursive: true,
        ..fixture.options(Mode::Move)
    });

    assert_eq!(summary.counts(), (3, 3, 0, 0));
    assert_file_content(&fixture.dest().join("documents/inner.md"), b"inner");
    assert_file_content(&fixture.dest().join("videos/clip.webm"), b"clip");
    assert!(!fixture.dest().join("documents/deep").exists());
    // Directories stay behind, emptied.
    assert!(fixture.src().join("deep/er").is_dir());
}

#[test]
fn test_same_name_in_different_subdirectories_overwrites() {
    let fixture = TestFixture::new();
    fixture.create_file("one/notes.txt", b"first");
    fixture.create_file("two/notes.txt", b"second");

    let summary = fixture.run(RunOptions {
        recursive: true,
        ..fixture.options(Mode::Copy)
    });

    // Both transfers succeed; the last one processed wins.
    assert_eq!(summary.counts(), (2, 2, 0, 0));
    let survivor = fs::read(fixture.dest().join("documents/notes.txt")).unwrap();
    assert!(survivor == b"first" || survivor == b"second");
    assert_eq!(fs::read_dir(fixture.dest().join("documents")).unwrap().count(), 1);
}

// ============================================================================
// Collisions and Failures
// ============================================================================

#[test]
fn test_already_sorted_file_is_skipped() {
    let fixture = TestFixture::new();
    fixture.create_file("images/a.png", b"png");
    fixture.create_file("b.gif", b"gif");

    let summary = fixture.run(RunOptions {
        source: fixture.src(),
        recursive: true,
        ..Default::default()
    });

    assert_eq!(summary.counts(), (2, 1, 1, 0));
    assert_file_content(&fixture.src().join("images/a.png"), b"png");
    assert_file_content(&fixture.src().join("images/b.gif"), b"gif");
    assert_eq!(fs::read_dir(fixture.src().join("images")).unwrap().count(), 2);
}

#[test]
fn test_second_in_place_run_skips_everything() {
    let fixture = TestFixture::new();
    fixture.create_basic_files();
    let options = RunOptions {
        source: fixture.src(),
        recursive: true,
        ..Default::default()
    };

    fixture.run(options.clone());
    let second = fixture.run(options);

    assert_eq!(second.counts(), (3, 0, 3, 0));
}

#[test]
fn test_blocked_category_fails_without_stopping_run() {
    let fixture = TestFixture::new();
    fixture.create_basic_files();
    fs::create_dir_all(fixture.dest()).unwrap();
    fs::write(fixture.dest().join("images"), b"not a directory").unwrap();

    let summary = fixture.run(fixture.options(Mode::Move));

    assert_eq!(summary.counts(), (3, 2, 0, 1));
    assert!(fixture.src().join("a.jpg").exists());
    assert!(fixture.dest().join("documents/b.txt").exists());
}

#[test]
fn test_invalid_source_is_rejected_before_run() {
    let fixture = TestFixture::new();

    let result = RunConfig::new(RunOptions {
        source: fixture.src().join("missing"),
        dest: Some(fixture.dest()),
        ..Default::default()
    });

    assert!(result.is_err());
    assert!(!fixture.dest().exists());
}

// ============================================================================
// Command-Line Entry Point and Settings Files
// ============================================================================

#[test]
fn test_run_cli_with_settings_defaults() {
    let fixture = TestFixture::new();
    fixture.create_basic_files();
    fixture.create_file("skip.part", b"partial download");
    let settings = fixture.settings_file(
        r#"
        [defaults]
        mode = "copy"

        [filters.exclude]
        extensions = ["part"]
        "#,
    );

    let summary = run_cli(Cli {
        source: Some(fixture.src()),
        dest: Some(fixture.dest()),
        config: Some(settings),
        no_color: true,
        ..Default::default()
    })
    .unwrap();

    assert_eq!(summary.mode, Mode::Copy);
    assert_eq!(summary.counts(), (3, 3, 0, 0));
    assert_eq!(summary.excluded, 1);
    assert!(fixture.src().join("a.jpg").exists());
    assert!(fixture.src().join("skip.part").exists());
    assert!(!fixture.dest().join("other").exists());
}

#[test]
fn test_run_cli_config_errors_exit_non_zero() {
    let fixture = TestFixture::new();
    let settings = fixture.settings_file("");

    let bad_mode = run_cli(Cli {
        source: Some(fixture.src()),
        mode: Some("shuffle".to_string()),
        config: Some(settings.clone()),
        ..Default::default()
    })
    .unwrap_err();
    assert_eq!(bad_mode.exit_code(), 1);

    let not_a_dir = run_cli(Cli {
        source: Some(settings.clone()),
        config: Some(settings),
        ..Default::default()
    })
    .unwrap_err();
    assert_eq!(not_a_dir.exit_code(), 1);
}

#[test]
fn test_run_cli_json_dry_run() {
    let fixture = TestFixture::new();
    fixture.create_basic_files();
    let settings = fixture.settings_file("");

    let summary = run_cli(Cli {
        source: Some(fixture.src()),
        dry_run: true,
        json: true,
        config: Some(settings),
        ..Default::default()
    })
    .unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.counts(), (3, 3, 0, 0));
    assert!(fixture.src().join("a.jpg").exists());
    assert!(!fixture.src().join("images").exists());
}
