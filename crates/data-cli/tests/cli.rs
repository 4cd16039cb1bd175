use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A scratch dataset directory with an isolated config and home.
struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        std::fs::create_dir_all(temp_dir.path().join("work")).expect("failed to create work dir");
        Self { temp_dir }
    }

    /// Stands in for `$HOME`; the dataset lives below it in `work/`.
    fn home(&self) -> &Path {
        self.temp_dir.path()
    }

    fn dataset(&self) -> PathBuf {
        self.home().join("work")
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.dataset().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.dataset().join(rel)).unwrap()
    }

    fn data(&self, args: &[&str]) -> Output {
        let bin_path = env!("CARGO_BIN_EXE_data");
        Command::new(bin_path)
            .args(args)
            .current_dir(self.dataset())
            .env("HOME", self.home())
            .env("DATA_CONFIG", self.home().join("dataconfig"))
            .env("DATA_USER", "ana")
            .env("DATA_INDEX_URL", "http://127.0.0.1:1")
            .env("DATA_BLOBSTORE_URL", "http://127.0.0.1:1")
            .env_remove("DATA_TOKEN")
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to run data")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.data(&["--help"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Usage:"));
    for cmd in ["list", "get", "blob", "manifest", "pack"] {
        assert!(out.contains(cmd), "help should mention {cmd}");
    }
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    assert!(ctx.data(&["--version"]).status.success());
}

#[test]
fn test_manifest_generate_hashes_files() {
    let ctx = TestContext::new();
    ctx.write("a.txt", "hello\n");
    ctx.write("b/c.txt", "");
    ctx.write(".hidden", "x");

    let output = ctx.data(&["manifest"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        ctx.read("Manifest"),
        "a.txt: f572d396fae9206628714fb2ce00f72e94f2258f\n\
         b/c.txt: da39a3ee5e6b4b0d3255bfef95601890afd80709\n"
    );
}

#[test]
fn test_manifest_add_and_remove() {
    let ctx = TestContext::new();
    ctx.write("a.txt", "hello\n");

    assert!(ctx.data(&["manifest", "add", "a.txt"]).status.success());
    assert!(ctx.read("Manifest").contains("a.txt: <to be hashed>"));

    assert!(ctx.data(&["manifest", "hash", "a.txt"]).status.success());
    assert!(ctx.read("Manifest").contains("a.txt: f572d396"));

    assert!(ctx.data(&["manifest", "rm", "a.txt"]).status.success());
    assert!(!ctx.read("Manifest").contains("a.txt"));

    let output = ctx.data(&["manifest", "add", "../outside"]);
    assert!(!output.status.success());
    assert!(stderr(&output).starts_with("data: "));
}

#[test]
fn test_pack_make_then_check() {
    let ctx = TestContext::new();
    ctx.write("a.txt", "hello\n");

    let output = ctx.data(&[
        "pack",
        "make",
        "--dataset",
        "ana/foo@1.0",
        "--tagline",
        "Foo numbers",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(ctx.read("Datafile").contains("dataset: ana/foo@1.0"));
    assert!(ctx.read("Manifest").contains("Datafile: "));

    let output = ctx.data(&["pack", "check"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let printed = ctx.data(&["pack", "manifest"]);
    assert_eq!(stdout(&printed), ctx.read("Manifest"));

    ctx.write("a.txt", "tampered\n");
    let output = ctx.data(&["pack", "check"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("1/2 checksums failed!"));
}

#[test]
fn test_pack_make_without_handle_fails() {
    let ctx = TestContext::new();
    ctx.write("a.txt", "hello\n");
    let output = ctx.data(&["pack", "make", "--dataset", "Bad Handle@x"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Datafile invalid"));
}

#[test]
fn test_list_without_datasets() {
    let ctx = TestContext::new();
    let output = ctx.data(&["list"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("No datasets installed."));
}

#[test]
fn test_list_reads_installed_datafiles() {
    let ctx = TestContext::new();
    ctx.write("datasets/ana/foo/Datafile", "dataset: ana/foo@1.0\ntagline: Foo\n");
    let output = ctx.data(&["list"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("ana/foo@1.0"));
}

#[test]
fn test_get_without_dependencies_fails() {
    let ctx = TestContext::new();
    let output = ctx.data(&["get"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("data: No datasets specified"));
}

#[test]
fn test_blob_get_untracked_path_fails() {
    let ctx = TestContext::new();
    let output = ctx.data(&["blob", "get", "nope.txt"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not tracked"));
}
