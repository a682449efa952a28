//! End-to-end contracts of the `pindefs` binary: gen/check/dump surfaces,
//! config-file defaults, and failure exit codes.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const NETLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<export version="E">
  <design><source>blinkenlights.kicad_sch</source></design>
  <components>
    <comp ref="U1">
      <sheetpath names="/" tstamps="/"/>
      <fields><field name="SnippetType">Mcu</field></fields>
    </comp>
    <comp ref="U2">
      <sheetpath names="/" tstamps="/"/>
      <fields>
        <field name="SnippetType">Timer</field>
        <field name="SnippetPin1">WAKE</field>
        <field name="SnippetPin2">DONE</field>
      </fields>
    </comp>
    <comp ref="J1">
      <sheetpath names="/" tstamps="/"/>
      <fields>
        <field name="SnippetType">Connector</field>
        <field name="SnippetPin1">Pin_1</field>
        <field name="SnippetPin3">Pin_3</field>
      </fields>
    </comp>
  </components>
  <nets>
    <net code="1" name="wake">
      <node ref="U1" pin="6" pinfunction="PD4"/>
      <node ref="U2" pin="1"/>
    </net>
    <net code="2" name="done">
      <node ref="U1" pin="5" pinfunction="PD3"/>
      <node ref="U2" pin="2"/>
    </net>
    <net code="3" name="c1">
      <node ref="U1" pin="4" pinfunction="PD2"/>
      <node ref="J1" pin="1"/>
    </net>
    <net code="4" name="c3">
      <node ref="U1" pin="9" pinfunction="PD5"/>
      <node ref="J1" pin="3"/>
    </net>
  </nets>
</export>
"#;

fn pindefs() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pindefs"))
}

fn write_netlist(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("board.xml");
    fs::write(&path, NETLIST).expect("write netlist");
    path
}

#[test]
fn gen_writes_a_header_file() {
    let tmp = tempdir().unwrap();
    let netlist = write_netlist(tmp.path());
    let header = tmp.path().join("pindefs.h");

    let out = pindefs()
        .args(["gen", "--root", "/Mcu"])
        .arg("--netlist")
        .arg(&netlist)
        .arg("--output")
        .arg(&header)
        .output()
        .expect("run gen");
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let text = fs::read_to_string(&header).unwrap();
    assert!(text.starts_with("#pragma once\n"));
    assert!(text.contains("// Source: blinkenlights.kicad_sch\n"));
    assert!(text.contains("#define Connector_Pin_1 PD2\n"));
    assert!(text.contains("#define Connector_Pin_3 PD5\n"));
    assert!(text.contains("#define Timer_DONE PD3\n"));
    assert!(text.contains("#define Timer_WAKE PD4\n"));
    assert_eq!(text.matches("#define ").count(), 4);
}

#[test]
fn gen_is_deterministic() {
    let tmp = tempdir().unwrap();
    let netlist = write_netlist(tmp.path());
    let run = || {
        let out = pindefs()
            .args(["gen", "--root", "/Mcu"])
            .arg("--netlist")
            .arg(&netlist)
            .output()
            .expect("run gen");
        assert!(out.status.success());
        out.stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn gen_emits_csv_and_json() {
    let tmp = tempdir().unwrap();
    let netlist = write_netlist(tmp.path());

    let csv = pindefs()
        .args(["gen", "--root", "/Mcu", "--format", "csv"])
        .arg("--netlist")
        .arg(&netlist)
        .output()
        .expect("run gen csv");
    assert!(csv.status.success());
    let csv_text = String::from_utf8(csv.stdout).unwrap();
    assert!(csv_text.starts_with("logical,physical\n"));
    assert!(csv_text.contains("Timer_WAKE,PD4\n"));

    let json = pindefs()
        .args(["gen", "--root", "/Mcu", "--format", "json"])
        .arg("--netlist")
        .arg(&netlist)
        .output()
        .expect("run gen json");
    assert!(json.status.success());
    let value: serde_json::Value = serde_json::from_slice(&json.stdout).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["cmd"], "gen");
    assert_eq!(value["defines"].as_array().unwrap().len(), 4);
    assert_eq!(value["source"], "blinkenlights.kicad_sch");
    assert_eq!(value["netlist_sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn check_accepts_a_generated_header_and_rejects_a_tampered_one() {
    let tmp = tempdir().unwrap();
    let netlist = write_netlist(tmp.path());
    let header = tmp.path().join("pindefs.h");

    let r#gen = pindefs()
        .args(["gen", "--root", "/Mcu"])
        .arg("--netlist")
        .arg(&netlist)
        .arg("--output")
        .arg(&header)
        .output()
        .expect("run gen");
    assert!(r#gen.status.success());

    let ok = pindefs()
        .args(["check", "--root", "/Mcu"])
        .arg("--header")
        .arg(&header)
        .arg("--netlist")
        .arg(&netlist)
        .output()
        .expect("run check");
    assert!(ok.status.success());
    assert!(String::from_utf8_lossy(&ok.stdout).contains("ok:"));

    // Rewire Timer_WAKE and the check must fail naming the mismatch.
    let tampered = fs::read_to_string(&header)
        .unwrap()
        .replace("#define Timer_WAKE PD4", "#define Timer_WAKE PD5");
    fs::write(&header, tampered).unwrap();

    let fail = pindefs()
        .args(["check", "--root", "/Mcu"])
        .arg("--header")
        .arg(&header)
        .arg("--netlist")
        .arg(&netlist)
        .output()
        .expect("run check");
    assert!(!fail.status.success());
    let stderr = String::from_utf8_lossy(&fail.stderr);
    assert!(stderr.contains("mismatched"), "stderr: {stderr}");
    assert!(stderr.contains("Timer_WAKE"));
}

#[test]
fn check_reports_missing_and_extra_defines() {
    let tmp = tempdir().unwrap();
    let netlist = write_netlist(tmp.path());
    let header = tmp.path().join("pindefs.h");
    fs::write(
        &header,
        "#pragma once\n\
         #define Timer_WAKE PD4\n\
         #define Timer_DONE PD3\n\
         #define Connector_Pin_1 PD2\n\
         #define Debug_TX PD0\n",
    )
    .unwrap();

    let out = pindefs()
        .args(["check", "--root", "/Mcu", "--format", "json"])
        .arg("--header")
        .arg(&header)
        .arg("--netlist")
        .arg(&netlist)
        .output()
        .expect("run check");
    assert!(!out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["status"], "fail");
    assert_eq!(value["missing"], serde_json::json!(["Connector_Pin_3 PD5"]));
    assert_eq!(value["extra"], serde_json::json!(["Debug_TX PD0"]));
    assert_eq!(value["mismatched"].as_array().unwrap().len(), 0);
}

#[test]
fn check_standalone_validates_well_formedness() {
    let tmp = tempdir().unwrap();
    let header = tmp.path().join("pindefs.h");

    fs::write(&header, "#pragma once\n#define Timer_WAKE PD4\n").unwrap();
    let ok = pindefs()
        .arg("check")
        .arg("--header")
        .arg(&header)
        .output()
        .expect("run check");
    assert!(ok.status.success());

    // A conflicting duplicate is a build-time failure.
    fs::write(
        &header,
        "#pragma once\n#define Timer_WAKE PD4\n#define Timer_WAKE PD5\n",
    )
    .unwrap();
    let fail = pindefs()
        .arg("check")
        .arg("--header")
        .arg(&header)
        .output()
        .expect("run check");
    assert!(!fail.status.success());
    let stderr = String::from_utf8_lossy(&fail.stderr);
    assert!(stderr.contains("Conflicting definition"), "stderr: {stderr}");
}

#[test]
fn dump_reports_connectivity() {
    let tmp = tempdir().unwrap();
    let netlist = write_netlist(tmp.path());

    let out = pindefs()
        .args(["dump", "--root", "/Mcu"])
        .arg("--netlist")
        .arg(&netlist)
        .output()
        .expect("run dump");
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.starts_with("snippet,snippet_type,pin,net,root_pin\n"));
    assert!(text.contains("/Timer,Timer,WAKE,wake,PD4\n"));
    assert!(text.contains("/Connector,Connector,Pin_1,c1,PD2\n"));
}

#[test]
fn config_file_supplies_defaults() {
    let tmp = tempdir().unwrap();
    write_netlist(tmp.path());
    fs::write(
        tmp.path().join("pindefs.toml"),
        "netlist = \"board.xml\"\nroot = \"/Mcu\"\n",
    )
    .unwrap();

    let out = pindefs()
        .arg("gen")
        .current_dir(tmp.path())
        .output()
        .expect("run gen");
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.contains("#define Timer_WAKE PD4\n"));
}

#[test]
fn unknown_root_lists_what_exists() {
    let tmp = tempdir().unwrap();
    let netlist = write_netlist(tmp.path());

    let out = pindefs()
        .args(["gen", "--root", "/Cpu"])
        .arg("--netlist")
        .arg(&netlist)
        .output()
        .expect("run gen");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("/Cpu"));
    assert!(stderr.contains("/Mcu"));
    assert!(stderr.contains("/Timer"));
}

#[test]
fn filter_narrows_the_generated_table() {
    let tmp = tempdir().unwrap();
    let netlist = write_netlist(tmp.path());

    let out = pindefs()
        .args(["gen", "--root", "/Mcu", "--filter", "/Timer"])
        .arg("--netlist")
        .arg(&netlist)
        .output()
        .expect("run gen");
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.contains("#define Timer_WAKE PD4\n"));
    assert!(!text.contains("Connector_Pin_1"));
}
