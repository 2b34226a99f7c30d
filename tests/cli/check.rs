use anyhow::Result;
use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::{CliTest, dump, run};

/// `title = 'Заказ'` on line 1.
fn flagged_assign() -> String {
    dump(
        "shop/views.py",
        "title = 'Заказ'\n",
        r#"{"type": "Assign", "lineno": 1, "col_offset": 0,
            "targets": [{"type": "Name", "id": "title", "lineno": 1, "col_offset": 0}],
            "value": {"type": "Constant", "value": "Заказ", "lineno": 1, "col_offset": 8}}"#,
    )
}

/// `title = _('Заказ')` on line 1.
fn wrapped_assign() -> String {
    dump(
        "shop/views.py",
        "title = _('Заказ')\n",
        r#"{"type": "Assign", "lineno": 1, "col_offset": 0,
            "targets": [{"type": "Name", "id": "title", "lineno": 1, "col_offset": 0}],
            "value": {"type": "Call", "lineno": 1, "col_offset": 8,
                      "func": {"type": "Name", "id": "_", "lineno": 1, "col_offset": 8},
                      "args": [{"type": "Constant", "value": "Заказ", "lineno": 1, "col_offset": 10}],
                      "keywords": []}}"#,
    )
}

#[test]
fn test_flagged_literal() -> Result<()> {
    let test = CliTest::with_file("shop/views.py.json", &flagged_assign())?;

    let output = run(test.check_command())?;

    assert_eq!(output.code, Some(1));
    assert!(output
        .stdout
        .contains("warning[W0001]: non-gettext-ed string 'Заказ'"));
    assert!(output.stdout.contains("--> shop/views.py:1:9"));
    assert!(output.stdout.contains("1 | title = 'Заказ'"));
    assert!(output.stdout.contains("1 problems (0 errors, 1 warning)"));

    Ok(())
}

#[test]
fn test_clean_file() -> Result<()> {
    let test = CliTest::with_file("shop/views.py.json", &wrapped_assign())?;

    let output = run(test.check_command())?;

    assert_eq!(output.code, Some(0));
    assert!(output.stdout.contains("Checked 1 file - no issues found"));

    Ok(())
}

#[test]
fn test_fixtures_and_package_json_are_not_dumps() -> Result<()> {
    let test = CliTest::with_file("shop/views.py.json", &wrapped_assign())?;
    test.write_file(
        "shop/fixtures/orders.json",
        r#"[{"model": "shop.order", "fields": {"title": "Заказ"}}]"#,
    )?;
    test.write_file("package.json", r#"{"name": "shop"}"#)?;

    let output = run(test.check_command())?;

    assert_eq!(output.code, Some(0));
    assert!(!output.stdout.contains("E0001"));
    assert!(output.stdout.contains("Checked 1 file - no issues found"));

    Ok(())
}

#[test]
fn test_json_format() -> Result<()> {
    let test = CliTest::with_file("shop/views.py.json", &flagged_assign())?;

    let mut cmd = test.check_command();
    cmd.args(["--format", "json"]);
    let output = run(cmd)?;

    assert_eq!(output.code, Some(1));
    let json: Value = serde_json::from_str(&output.stdout)?;
    assert_eq!(json["summary"]["filesChecked"], 1);
    assert_eq!(json["summary"]["warnings"], 1);
    assert_eq!(json["issues"][0]["file"], "shop/views.py");
    assert_eq!(json["issues"][0]["text"], "Заказ");
    assert_eq!(json["issues"][0]["col"], 9);

    Ok(())
}

#[test]
fn test_excluded_directories_are_skipped() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file("shop/migrations/0001_initial.py.json", &flagged_assign())?;
    test.write_file("shop/tests.py.json", &flagged_assign())?;
    test.write_file("shop/views.py.json", &wrapped_assign())?;

    let output = run(test.check_command())?;

    assert_eq!(output.code, Some(0));
    assert!(output.stdout.contains("Checked 1 file"));

    Ok(())
}

#[test]
fn test_config_ignores_and_ignore_texts() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(
        ".gettextrc.json",
        r#"{
         "ignores": ["**/generated/**"],
         "ignoreTexts": ["Заказ"]
     }"#,
    )?;
    test.write_file("generated/api.py.json", "{ not json")?;
    test.write_file("shop/views.py.json", &flagged_assign())?;

    let output = run(test.check_command())?;

    assert_eq!(output.code, Some(0), "stdout: {}", output.stdout);

    Ok(())
}

#[test]
fn test_extra_field_constructors() -> Result<()> {
    let body = r#"{"type": "Expr", "lineno": 1, "col_offset": 0, "value":
        {"type": "Call", "lineno": 1, "col_offset": 0,
         "func": {"type": "Name", "id": "MoneyField"},
         "args": [{"type": "Constant", "value": "Цена", "lineno": 1, "col_offset": 11}],
         "keywords": []}}"#;
    let test = CliTest::with_file(
        "shop/models.py.json",
        &dump("shop/models.py", "MoneyField('Цена')\n", body),
    )?;

    let output = run(test.check_command())?;
    assert_eq!(output.code, Some(1));

    test.write_file(
        ".gettextrc.json",
        r#"{ "extraFieldConstructors": ["MoneyField"] }"#,
    )?;
    let output = run(test.check_command())?;
    assert_eq!(output.code, Some(0));

    Ok(())
}

#[test]
fn test_parse_error_is_reported() -> Result<()> {
    let test = CliTest::with_file("broken.py.json", r#"{"type": 42}"#)?;

    let output = run(test.check_command())?;

    assert_eq!(output.code, Some(1));
    assert!(output.stdout.contains("error[E0001]"));
    assert!(output.stdout.contains("broken.py.json"));
    assert!(output.stderr.contains("could not be parsed"));

    Ok(())
}

#[test]
fn test_source_root() -> Result<()> {
    let test = CliTest::with_file("dumps/shop/views.py.json", &flagged_assign())?;

    let mut cmd = test.check_command();
    cmd.args(["--source-root", "dumps"]);
    let output = run(cmd)?;

    assert_eq!(output.code, Some(1));
    assert!(output.stdout.contains("shop/views.py:1:9"));

    Ok(())
}

#[test]
fn test_invalid_config_is_an_error() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".gettextrc.json", r#"{ "targetScript": "[а-я" }"#)?;

    let output = run(test.check_command())?;

    assert_eq!(output.code, Some(2));
    assert!(output.stderr.contains("targetScript"));

    Ok(())
}

#[test]
fn test_help() -> Result<()> {
    let test = CliTest::new()?;

    let mut cmd = test.command();
    cmd.arg("--help");
    let output = run(cmd)?;

    assert_eq!(output.code, Some(0));
    assert!(output.stdout.contains("check"));
    assert!(output.stdout.contains("init"));

    Ok(())
}
