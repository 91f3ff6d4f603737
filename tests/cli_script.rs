mod common;

use std::path::Path;

use assert_cmd::Command;
use common::temp_dir;
use predicates::str::contains;

fn shell(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("property_core_cli").unwrap();
    cmd.env("PROPERTY_CORE_CLI_SCRIPT", "1")
        .env("PROPERTY_CORE_HOME", home)
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn script_mode_creates_a_property_through_the_wizard() {
    let home = temp_dir();
    let input = "\
property new
set name \"Harbour Loft\"
next
set address_line \"1 Quay St\"
set city Lisbon
set postcode 1100-001
set country PT
next
set max_guests 4
next
set nightly_rate 120
set cleaning_fee 40
submit
list properties
list bookings
quote \"harbour loft\" 2025-06-01 2025-06-04 night
exit
";

    shell(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Property `Harbour Loft` created"))
        .stdout(contains("Properties (1 of 1)"))
        .stdout(contains("No bookings found."))
        .stdout(contains("Total        : 400.00 EUR"));

    let json = std::fs::read_to_string(home.join("catalog.json")).unwrap();
    assert!(json.contains("\"Harbour Loft\""));
    assert!(!home.join("drafts").join("draft_property.json").exists());
}

#[test]
fn blocked_steps_report_the_failing_fields() {
    let home = temp_dir();
    shell(&home)
        .write_stdin("property new\nnext\nexit\n")
        .assert()
        .success()
        .stdout(contains("Fix 1 field before continuing:"))
        .stdout(contains("name: Name is required"));
}

#[test]
fn unfinished_forms_are_restored_on_the_next_run() {
    let home = temp_dir();
    shell(&home)
        .write_stdin("property new\nset name \"Draft Villa\"\nnext\nexit\n")
        .assert()
        .success();

    shell(&home)
        .write_stdin("property new\ndraft show\nexit\n")
        .assert()
        .success()
        .stdout(contains("Restored your unfinished property form (step 2)."))
        .stdout(contains("Draft Villa"));
}

#[test]
fn unknown_commands_suggest_the_closest_match() {
    let home = temp_dir();
    shell(&home)
        .write_stdin("lst properties\nsubmit\nexit\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `lst`"))
        .stdout(contains("Suggestion: `list`?"))
        .stdout(contains("No form in progress."));
}

#[test]
fn preferences_persist_between_runs() {
    let home = temp_dir();
    shell(&home)
        .write_stdin("config set currency gbp\nexit\n")
        .assert()
        .success()
        .stdout(contains("Updated currency."));

    shell(&home)
        .write_stdin("config show\nexit\n")
        .assert()
        .success()
        .stdout(contains("Currency      : GBP"));
    assert!(home.join("config.json").exists());
}
