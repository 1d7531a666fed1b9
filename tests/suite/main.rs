#![cfg(unix)]

use std::{
    fs, io,
    path::Path,
    process::{Command, Stdio},
};

use ctestrun::{
    capture::OutputCapture,
    error::{ProtocolViolation, RunError},
    formatter::pretty::PrettyFormatter,
    outcome::{RunExit, TestGroup},
    report::TestRun,
    runner::{ProcessRunner, ProtocolErrorPolicy, TestRunner},
    target::Target,
};
use pretty_assertions::assert_eq;


use lib::*;

const ROUND_TRIP: &[&str] = &[
    "CTEST x start Group1",
    "CTEST labelA ok",
    "CTEST labelB fail",
    "CTEST x start Group2",
    "CTEST labelC ok",
];

fn run_target(runner: &ProcessRunner, target: &Target) -> (TestRun, OutputCapture) {
    let mut capture = OutputCapture::new();
    let run = runner.run(target, &mut capture);
    (run, capture)
}

fn detail(group: &TestGroup) -> Vec<(&'static str, &str)> {
    group
        .detail()
        .iter()
        .map(|assertion| (assertion.status.as_str(), assertion.label.as_str()))
        .collect()
}

fn canonical(path: &Path) -> String {
    fs::canonicalize(path).unwrap().display().to_string()
}

#[test]
fn round_trip() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let exe = scripts.write("round_trip", &emit(ROUND_TRIP));

    let (run, capture) = run_target(&ProcessRunner::new(), &Target::new(&exe));

    assert!(run.success);
    assert!(run.error.is_none());
    assert_eq!(run.exit, RunExit::Code(0));
    assert_eq!(run.target.working_dir, scripts.dir());

    let names: Vec<_> = run.groups.iter().map(TestGroup::name).collect();
    assert_eq!(names, ["Group1", "Group2"]);
    let group1 = run.groups.get("Group1").unwrap();
    assert_eq!((group1.ok(), group1.fail()), (1, 1));
    assert_eq!(detail(group1), [("ok", "labelA"), ("fail", "labelB")]);
    let group2 = run.groups.get("Group2").unwrap();
    assert_eq!((group2.ok(), group2.fail()), (1, 0));
    assert_eq!(detail(group2), [("ok", "labelC")]);

    let totals = run.totals();
    assert_eq!((totals.ok, totals.fail), (2, 1));
    assert_eq!(format!("{:.2}", totals.success_rate().unwrap()), "66.67");
    assert!(capture.lines.is_empty());
}

#[test]
fn timestamped_control_lines() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let exe = scripts.write(
        "timestamped",
        &emit(&[
            "CTEST 12:00:00 start Group1 12:00:00",
            "CTEST labelA ok 12:00:01",
            "CTEST labelB fail 12:00:02",
        ]),
    );

    let (run, capture) = run_target(&ProcessRunner::new(), &Target::new(&exe));

    assert!(run.success);
    assert_eq!(run.malformed_lines, 0);
    let group1 = run.groups.get("Group1").unwrap();
    assert_eq!(detail(group1), [("ok", "labelA"), ("fail", "labelB")]);
    assert!(capture.lines.is_empty());
}

#[test]
fn exit_code_dominates_outcomes() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let body = emit(&["CTEST x start A", "CTEST a ok", "CTEST b ok"]) + "exit 7";
    let exe = scripts.write("exit_7", &body);

    let (run, _) = run_target(&ProcessRunner::new(), &Target::new(&exe));

    assert!(!run.success);
    assert!(run.error.is_none());
    assert_eq!(run.exit, RunExit::Code(7));
    assert_eq!(run.totals().fail, 0);
}

#[test]
fn passthrough_and_malformed_lines() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let exe = scripts.write(
        "noisy",
        &emit(&[
            "starting up",
            "CTEST x start A",
            "CTEST onlytwo tokens",
            "CTEST a ok",
        ]),
    );

    let (run, capture) = run_target(&ProcessRunner::new(), &Target::new(&exe));

    assert!(run.success);
    assert_eq!(run.malformed_lines, 1);
    assert_eq!(capture.lines, ["starting up", "CTEST onlytwo tokens"]);
    assert_eq!(detail(run.groups.get("A").unwrap()), [("ok", "a")]);
}

#[test]
fn missing_executable_is_reported() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();

    let (run, _) = run_target(
        &ProcessRunner::new(),
        &Target::new(scripts.dir().join("missing")),
    );

    assert!(!run.success);
    assert!(!run.launched());
    assert_eq!(run.exit, RunExit::DidNotComplete);
    assert!(run.groups.is_empty());
    assert!(matches!(
        &run.error,
        Some(RunError::Launch { source, .. }) if source.kind() == io::ErrorKind::NotFound
    ));
}

#[test]
fn non_executable_is_reported() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let exe = scripts.write_plain("plain", &emit(ROUND_TRIP));

    let (run, _) = run_target(&ProcessRunner::new(), &Target::new(&exe));

    assert!(!run.success);
    assert!(matches!(
        &run.error,
        Some(RunError::Launch { source, .. }) if source.kind() == io::ErrorKind::PermissionDenied
    ));
}

#[test]
fn missing_working_dir_is_a_launch_failure() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let exe = scripts.write("fine", &emit(ROUND_TRIP));

    let target = Target::new(&exe).with_working_dir(scripts.dir().join("nope"));
    let (run, _) = run_target(&ProcessRunner::new(), &target);

    assert!(!run.success);
    assert!(matches!(run.error, Some(RunError::Launch { .. })));
}

#[test]
fn environment_is_restricted() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let exe = scripts.write(
        "env",
        r#"echo "CTEST_LOG=[$CTEST_LOG] CARGO_PKG_NAME=[$CARGO_PKG_NAME]" >&2"#,
    );

    let (run, capture) = run_target(&ProcessRunner::new(), &Target::new(&exe));

    assert!(run.success);
    assert_eq!(capture.lines, ["CTEST_LOG=[1] CARGO_PKG_NAME=[]"]);
}

#[test]
fn runs_in_executable_dir_by_default() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let exe = scripts.write("cwd", r#"echo "cwd=$(pwd)" >&2"#);

    let (_, capture) = run_target(&ProcessRunner::new(), &Target::new(&exe));

    assert_eq!(capture.lines, [format!("cwd={}", canonical(scripts.dir()))]);
}

#[test]
fn runs_in_explicit_working_dir() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let data = scripts.dir().join("data");
    fs::create_dir(&data).unwrap();
    let exe = scripts.write("cwd", r#"echo "cwd=$(pwd)" >&2"#);

    let target = Target::new(&exe).with_working_dir(&data);
    let (_, capture) = run_target(&ProcessRunner::new(), &target);

    assert_eq!(capture.lines, [format!("cwd={}", canonical(&data))]);
}

#[test]
fn captured_stdout_passes_through() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let body = String::from("echo 'to stdout'\n") + &emit(&["CTEST x start A", "CTEST a ok"]);
    let exe = scripts.write("stdout", &body);

    let runner = ProcessRunner::new().with_stdout_capture(true);
    let (run, capture) = run_target(&runner, &Target::new(&exe));

    assert!(run.success);
    assert_eq!(capture.lines, ["to stdout"]);
    assert_eq!(run.totals().ok, 1);
}

#[test]
fn outcome_before_start_fails_run() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let exe = scripts.write(
        "early",
        &emit(&["CTEST early ok", "CTEST x start A", "CTEST a ok"]),
    );

    let (run, _) = run_target(&ProcessRunner::new(), &Target::new(&exe));
    assert!(!run.success);
    assert_eq!(run.exit, RunExit::Code(0));
    assert_eq!(
        run.violations,
        [ProtocolViolation::OutcomeBeforeStart {
            label: "early".into(),
            line: 1
        }]
    );

    let runner = ProcessRunner::new().with_protocol_errors(ProtocolErrorPolicy::Warn);
    let (run, _) = run_target(&runner, &Target::new(&exe));
    assert!(run.success);
    assert_eq!(run.violations.len(), 1);
}

#[test]
fn killed_process_is_recorded() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let body = emit(&["CTEST x start A", "CTEST a ok"]) + "kill -9 $$";
    let exe = scripts.write("killed", &body);

    let (run, _) = run_target(&ProcessRunner::new(), &Target::new(&exe));

    assert!(!run.success);
    assert_eq!(run.exit, RunExit::Signal(9));
    assert_eq!(run.totals().ok, 1);
}

#[test]
fn large_streams_do_not_block() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let body = r#"echo 'CTEST x start Bulk' >&2
i=0
while [ "$i" -lt 20000 ]; do
    echo "out $i"
    echo "CTEST l$i ok" >&2
    i=$((i + 1))
done"#;
    let exe = scripts.write("bulk", body);

    let runner = ProcessRunner::new().with_stdout_capture(true);
    let (run, capture) = run_target(&runner, &Target::new(&exe));

    assert!(run.success);
    let group = run.groups.get("Bulk").unwrap();
    assert_eq!(group.ok(), 20000);
    assert_eq!(group.detail()[0].label, "l0");
    assert_eq!(group.detail()[19999].label, "l19999");
    assert_eq!(capture.lines.len(), 20000);
    assert_eq!(capture.lines.last().map(String::as_str), Some("out 19999"));
}

#[test]
fn suite_report() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let pass = scripts.write(
        "pass",
        &emit(&["CTEST x start Math", "CTEST add ok", "CTEST sub ok"]),
    );
    let missing = scripts.dir().join("missing");

    let report = Buffer::default();
    let console = Buffer::default();
    let result = ctestrun::suite(report.clone())
        .with_console(PrettyFormatter::default().with_target(console.clone()))
        .with_sink(OutputCapture::new())
        .run([Target::new(&pass), Target::new(&missing)])
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.runs.len(), 2);
    assert!(result.fmt_errors.is_empty());

    let report = sanitize_report(&report.contents(), scripts.dir());
    let (head, body) = report
        .split_once("<div style=\"clear: both;\"></div>\n")
        .unwrap();
    assert!(head.contains("<h1>CTest results: <time></h1>"));
    let expected = [
        "<div class=\"cmd\"><h2><dir>/pass</h2><div class=\"info\"><time><br/>",
        "2/2; <span class=\"ok\">100.00 % Success rate.</span></div>\n",
        "<div class=\"test\"><b>Math</b><span class=\"test_count\">2 tests</span>",
        "<table class=\"test\"><tr>",
        "<td class=\"ok\" title=\"add\"></td><td class=\"ok\" title=\"sub\"></td>",
        "</tr></table></div>\n",
        "<hr/></div>\n",
        "<div class=\"cmd\"><h2><dir>/missing</h2><div class=\"info\"><time><br/>",
        "<b class=\"fail\">No tests were run</b>",
        "<br/><b class=\"fail\">could not launch <dir>/missing: ",
        "No such file or directory (os error 2)</b></div>\n",
        "<hr/></div>\n",
        "</body></html>\n",
    ]
    .concat();
    assert_eq!(body, expected);

    let console = sanitize_report(&console.contents(), scripts.dir());
    assert!(console.contains("Testing <dir>/pass at <dir>\n"));
    assert!(console.contains("2/2; 100.00 % Success rate.\n"));
    assert!(console.contains("Error: could not launch <dir>/missing"));
    assert!(console.ends_with("suite result: FAILED. 1 passed; 1 failed\n"));
}

fn ctestrun_bin() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ctestrun"));
    command.stdout(Stdio::null()).stderr(Stdio::null());
    command
}

#[test]
fn binary_exit_status() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let pass = scripts.write("pass", &emit(ROUND_TRIP));
    let fail = scripts.write("fail", "exit 3");
    let out = scripts.dir().join("report.html");

    let status = ctestrun_bin().arg("-o").arg(&out).arg(&pass).status().unwrap();
    assert!(status.success());

    let status = ctestrun_bin()
        .arg("-o")
        .arg(&out)
        .arg(&fail)
        .arg(&pass)
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));

    let report = fs::read_to_string(&out).unwrap();
    let fail_at = report.find("/fail</h2>").unwrap();
    let pass_at = report.find("/pass</h2>").unwrap();
    assert!(fail_at < pass_at);
    assert!(report.contains("Process did not finish properly. Exit status 3"));
    assert!(report.ends_with("</body></html>\n"));
}

#[test]
fn binary_without_targets_succeeds() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let out = scripts.dir().join("report.html");

    let status = ctestrun_bin().arg("--output").arg(&out).status().unwrap();

    assert!(status.success());
    assert!(fs::read_to_string(&out).unwrap().ends_with("</body></html>\n"));
}

#[test]
fn binary_fails_without_report() {
    let _guard = spawn_lock();
    let scripts = Scripts::new();
    let pass = scripts.write("pass", &emit(ROUND_TRIP));
    let out = scripts.dir().join("no").join("such").join("report.html");

    let output = ctestrun_bin()
        .arg("-o")
        .arg(&out)
        .arg(&pass)
        .stderr(Stdio::piped())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("could not open report"));
}
