//! End-to-end tests of the `gather` binary.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use flate2::read::GzDecoder;
use predicates::prelude::*;
use tempfile::TempDir;

const JOURNAL: &str = "\
kubelet journal for node-1
-- Logs begin at Thu 2019-09-26 11:00:00 UTC, end at Thu 2019-09-26 12:05:00 UTC. --
Sep 26 11:50:00 node-1 kubelet[1]: old
Sep 26 12:00:00 node-1 kubelet[1]: mid
Sep 26 12:05:00 node-1 kubelet[1]: new
";

const PLAIN: &str = "\
2019-09-26T11:50:00Z old
2019-09-26T12:00:00Z mid
2019-09-26T12:05:00Z new
";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let node = dir.path().join("mg/nodes/node-1");
        let pod = dir.path().join("mg/namespaces/app/pods/api");
        fs::create_dir_all(&node).expect("mkdir node");
        fs::create_dir_all(&pod).expect("mkdir pod");
        fs::write(node.join("kubelet"), JOURNAL).expect("write journal");
        fs::write(pod.join("api.log"), PLAIN).expect("write log");
        fs::write(pod.join("pod.yaml"), "kind: Pod\n").expect("write yaml");
        Self { dir }
    }

    fn src(&self) -> PathBuf {
        self.dir.path().join("mg")
    }

    fn dst(&self) -> PathBuf {
        self.dir.path().join("out.tar.gz")
    }
}

fn gather() -> Command {
    let mut cmd = Command::cargo_bin("gather").expect("binary");
    cmd.env_remove("GATHER_SRC")
        .env_remove("GATHER_DST")
        .env_remove("GATHER_SINCE")
        .env_remove("GATHER_LINES")
        .env_remove("GATHER_TERMINATION_LOG");
    cmd
}

fn read_entry(archive: &Path, name: &str) -> String {
    let mut tar = tar::Archive::new(GzDecoder::new(File::open(archive).expect("open archive")));
    for entry in tar.entries().expect("entries") {
        let mut entry = entry.expect("entry");
        if entry.path().expect("path").to_string_lossy() == name {
            let mut content = String::new();
            entry.read_to_string(&mut content).expect("read entry");
            return content;
        }
    }
    panic!("{name} not in archive");
}

#[test]
fn help_lists_flags() {
    gather()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--since"))
        .stdout(predicate::str::contains("--lines"))
        .stdout(predicate::str::contains("--termination-log"));
}

#[test]
fn archives_without_filter() {
    let fx = Fixture::new();

    gather()
        .arg("--src")
        .arg(fx.src())
        .arg("--dst")
        .arg(fx.dst())
        .assert()
        .success()
        .stdout(predicate::str::contains("Filter:           none"));

    assert_eq!(read_entry(&fx.dst(), "nodes/node-1/kubelet"), JOURNAL);
    assert_eq!(read_entry(&fx.dst(), "namespaces/app/pods/api/api.log"), PLAIN);
    assert_eq!(read_entry(&fx.dst(), "namespaces/app/pods/api/pod.yaml"), "kind: Pod\n");
}

#[test]
fn lines_filter_keeps_newest() {
    let fx = Fixture::new();

    gather()
        .arg("--src")
        .arg(fx.src())
        .arg("--dst")
        .arg(fx.dst())
        .args(["--lines", "2", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"lines\": 2"));

    assert_eq!(
        read_entry(&fx.dst(), "namespaces/app/pods/api/api.log"),
        "2019-09-26T12:00:00Z mid\n2019-09-26T12:05:00Z new\n"
    );
    assert_eq!(read_entry(&fx.dst(), "namespaces/app/pods/api/pod.yaml"), "kind: Pod\n");
}

#[test]
fn since_filter_reads_environment() {
    let fx = Fixture::new();

    gather()
        .env("GATHER_SRC", fx.src())
        .env("GATHER_DST", fx.dst())
        .env("GATHER_SINCE", "7")
        .args(["--reference-time", "2019-09-26T12:08:46Z"])
        .assert()
        .success();

    assert_eq!(
        read_entry(&fx.dst(), "nodes/node-1/kubelet"),
        "Sep 26 12:05:00 node-1 kubelet[1]: new\n"
    );
    assert_eq!(
        read_entry(&fx.dst(), "namespaces/app/pods/api/api.log"),
        "2019-09-26T12:05:00Z new\n"
    );
}

#[test]
fn exempt_paths_stay_whole() {
    let fx = Fixture::new();

    gather()
        .arg("--src")
        .arg(fx.src())
        .arg("--dst")
        .arg(fx.dst())
        .args(["--lines", "1", "--exempt", "pods/api"])
        .assert()
        .success();

    assert_eq!(read_entry(&fx.dst(), "namespaces/app/pods/api/api.log"), PLAIN);
}

#[test]
fn conflicting_filters_fail_and_write_termination_log() {
    let fx = Fixture::new();
    let log = fx.dir.path().join("termination-log");

    gather()
        .arg("--src")
        .arg(fx.src())
        .arg("--dst")
        .arg(fx.dst())
        .args(["--lines", "5", "--since", "5"])
        .arg("--termination-log")
        .arg(&log)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "not possible to filter by time and number of lines",
        ));

    let message = fs::read_to_string(&log).expect("termination log");
    assert!(message.contains("not possible to filter by time and number of lines"));
    assert!(!fx.dst().exists());
}

#[test]
fn missing_source_fails() {
    let fx = Fixture::new();

    gather()
        .arg("--src")
        .arg(fx.dir.path().join("absent"))
        .arg("--dst")
        .arg(fx.dst())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to archive"));
}

#[test]
fn source_is_required() {
    gather()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--src"));
}
