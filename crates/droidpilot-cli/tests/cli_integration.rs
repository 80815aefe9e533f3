use assert_cmd::Command;
use predicates::prelude::*;

const SETTINGS_DUMP: &str = r#"<hierarchy><node package="com.app"><node text="Settings" bounds="[300,1000][500,1100]"/></node></hierarchy>"#;

/// A directory holding a `shell` script, so that running `sh shell <cmd>`
/// inside it stands in for `adb shell <cmd>`.
fn fake_device() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let script = format!(
        r#"case "$*" in
  *uiautomator*) printf '%s' '{dump}' ;;
  *dumpsys*) printf 'Current Battery Service state:\n  present: true\n  level: 64\n' ;;
  *input*) ;;
  *) echo "unexpected: $*" >&2; exit 1 ;;
esac
"#,
        dump = SETTINGS_DUMP
    );
    std::fs::write(dir.path().join("shell"), script).unwrap();
    dir
}

fn droidpilot(device: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("droidpilot").unwrap();
    cmd.current_dir(device.path())
        .env_remove("DROIDPILOT_SERIAL")
        .env_remove("ANDROID_SERIAL")
        .env("HOME", device.path())
        .args(["--adb", "sh"]);
    cmd
}

#[test]
fn test_help_exits_zero() {
    Command::cargo_bin("droidpilot")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("droidpilot"));
}

#[test]
fn test_bounds_prints_geometry() {
    let device = fake_device();
    droidpilot(&device)
        .args(["bounds", r#"node[text="Settings"]"#])
        .assert()
        .success()
        .stdout("300 1000 200 100\n");
}

#[test]
fn test_bounds_json() {
    let device = fake_device();
    let assert = droidpilot(&device)
        .args(["-f", "json", "bounds", r#"node[text="Settings"]"#])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(value["x"], 300);
    assert_eq!(value["height"], 100);
}

#[test]
fn test_missing_element_exits_one() {
    let device = fake_device();
    droidpilot(&device)
        .args(["bounds", "node[text=Nowhere]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("node[text=Nowhere]"));
}

#[test]
fn test_package_and_battery() {
    let device = fake_device();
    droidpilot(&device)
        .arg("package")
        .assert()
        .success()
        .stdout("com.app\n");

    droidpilot(&device)
        .arg("battery")
        .assert()
        .success()
        .stdout("64%\n");
}

#[test]
fn test_tap_by_selector() {
    let device = fake_device();
    droidpilot(&device)
        .args(["tap", r#"node[text="Settings"]"#])
        .assert()
        .success()
        .stderr(predicate::str::contains("at 400 x 1050"));
}

#[test]
fn test_dump_writes_file() {
    let device = fake_device();
    let out = device.path().join("window.xml");
    droidpilot(&device)
        .args(["--dump-file", out.to_str().unwrap(), "dump"])
        .assert()
        .success()
        .stdout(SETTINGS_DUMP);

    assert_eq!(std::fs::read_to_string(out).unwrap(), SETTINGS_DUMP);
}

#[test]
fn test_missing_adb_exits_two() {
    let device = fake_device();
    Command::cargo_bin("droidpilot")
        .unwrap()
        .env("HOME", device.path())
        .args(["--adb", "/nonexistent/droidpilot/adb", "battery"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to launch"));
}
