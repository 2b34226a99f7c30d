use anyhow::{Context, Result};
use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::{CliTest, run};

/// Validates config file structure and default values.
fn assert_config_content(content: &str) -> Result<()> {
    let parsed: Value = serde_json::from_str(content).context("Config should be valid JSON")?;

    for field in [
        "includes",
        "ignores",
        "excludeNames",
        "fieldConstructors",
        "extraFieldConstructors",
        "ignoreTexts",
        "targetScript",
    ] {
        assert!(parsed.get(field).is_some(), "Config should have '{field}' field");
    }
    assert_eq!(parsed["targetScript"], "[а-яА-Я]");

    assert!(
        content.contains("  "),
        "Config should use 2-space indentation"
    );

    Ok(())
}

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let output = run({
        let mut cmd = test.command();
        cmd.arg("init");
        cmd
    })?;

    assert_eq!(output.code, Some(0));
    assert!(output.stdout.contains("Created .gettextrc.json"));
    assert!(test.root().join(".gettextrc.json").exists());

    let content = test.read_file(".gettextrc.json")?;
    assert_config_content(&content)?;

    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".gettextrc.json", "{}")?;

    let output = run({
        let mut cmd = test.command();
        cmd.arg("init");
        cmd
    })?;

    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains(".gettextrc.json already exists"));
    assert_eq!(test.read_file(".gettextrc.json")?, "{}");

    Ok(())
}

#[test]
fn test_init_config_is_immediately_usable() -> Result<()> {
    let test = CliTest::new()?;

    test.command().arg("init").output()?;
    test.write_file(
        "app.py.json",
        r#"{"type": "Module", "body": [{"type": "Expr", "value": {"type": "Constant", "value": "Hello"}}]}"#,
    )?;

    let output = run(test.check_command())?;
    assert_eq!(
        output.code,
        Some(0),
        "Check command should work with initialized config. stderr: {}",
        output.stderr
    );

    Ok(())
}
