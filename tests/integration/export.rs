use std::fs;

use anyhow::Result;
use querydump::{export, Config, ExportError, Outcome};
use rusqlite::Connection;

use crate::helpers::Fixture;

const PEOPLE: &str = "
    CREATE TABLE person (ID INTEGER, NAME VARCHAR(40), CREATED TIMESTAMP);
    INSERT INTO person VALUES (1, 'Ada', '2024-01-01 00:00:00');
";

fn written(outcome: Outcome) -> Result<String> {
    match outcome {
        Outcome::Written(path) => Ok(fs::read_to_string(path)?),
        Outcome::Skipped => anyhow::bail!("the run was skipped"),
    }
}

#[test]
fn exports_typed_rows() -> Result<()> {
    let fixture = Fixture::new(PEOPLE)?;
    let config = fixture.config("SELECT ID, NAME, CREATED FROM person")?;

    let document = written(export(&config)?)?;
    assert_eq!(
        document,
        r#"[
  {
    "ID": 1,
    "NAME": "Ada",
    "CREATED": "2024-01-01T00:00:00"
  }
]"#
    );
    assert_eq!(fixture.outputs()?.len(), 1);
    Ok(())
}

#[test]
fn empty_result_is_empty_array() -> Result<()> {
    let fixture = Fixture::new(PEOPLE)?;
    let config = fixture.config("SELECT * FROM person WHERE ID > 100")?;

    assert_eq!(written(export(&config)?)?, "[]");
    Ok(())
}

#[test]
fn nulls_and_placeholders() -> Result<()> {
    let fixture = Fixture::new(
        "CREATE TABLE doc (ID INTEGER, BODY CLOB, SCAN BLOB, PRICE DECIMAL(8, 2), AT TIME);
         INSERT INTO doc VALUES (1, NULL, x'cafe', '19.99', '23:59:59');
         INSERT INTO doc VALUES (2, 'text', NULL, NULL, NULL);",
    )?;
    let config = fixture.config("SELECT * FROM doc ORDER BY ID")?;

    let document: serde_json::Value = serde_json::from_str(&written(export(&config)?)?)?;
    let expected: serde_json::Value = serde_json::from_str(
        r#"[
            {"ID": 1, "BODY": null, "SCAN": "<BLOB>", "PRICE": 19.99, "AT": "23:59:59"},
            {"ID": 2, "BODY": "text", "SCAN": "<BLOB>", "PRICE": null, "AT": null}
        ]"#,
    )?;
    assert_eq!(document, expected);
    Ok(())
}

#[test]
fn empty_script_is_skipped() -> Result<()> {
    let fixture = Fixture::new(PEOPLE)?;
    let config = fixture.config("  \n\n")?;

    assert_eq!(export(&config)?, Outcome::Skipped);
    assert!(fixture.outputs()?.is_empty());
    Ok(())
}

#[test]
fn malformed_sql_writes_nothing() -> Result<()> {
    let fixture = Fixture::new(PEOPLE)?;
    let config = fixture.config("SELECT FROM WHERE")?;

    let err = export(&config).unwrap_err();
    assert!(matches!(err, ExportError::Query(_)), "{err:?}");
    assert!(fixture.outputs()?.is_empty());
    Ok(())
}

#[test]
fn second_statement_writes_nothing() -> Result<()> {
    let fixture = Fixture::new(PEOPLE)?;
    let config = fixture.config("SELECT ID FROM person;\nDELETE FROM person;\n")?;

    let err = export(&config).unwrap_err();
    assert!(matches!(err, ExportError::Query(_)), "{err:?}");
    assert!(fixture.outputs()?.is_empty());

    let connection = Connection::open(fixture.database())?;
    let count: i64 = connection.query_row("SELECT count(*) FROM person", [], |row| row.get(0))?;
    assert_eq!(count, 1);
    Ok(())
}

#[test]
fn comment_only_script_is_a_query_error() -> Result<()> {
    let fixture = Fixture::new(PEOPLE)?;
    let config = fixture.config("-- SELECT * FROM person\n")?;

    let err = export(&config).unwrap_err();
    assert!(matches!(err, ExportError::Query(_)), "{err:?}");
    assert!(fixture.outputs()?.is_empty());
    Ok(())
}

#[test]
fn extreme_doubles_are_written_in_full() -> Result<()> {
    let fixture = Fixture::new(
        "CREATE TABLE reading (ID INTEGER, VALUE DOUBLE);
         INSERT INTO reading VALUES (1, 1e30), (2, 1.5e-30);",
    )?;
    let config = fixture.config("SELECT VALUE FROM reading ORDER BY ID")?;

    assert_eq!(
        written(export(&config)?)?,
        r#"[
  {
    "VALUE": 1000000000000000000000000000000
  },
  {
    "VALUE": 0.0000000000000000000000000000015
  }
]"#
    );
    Ok(())
}

#[test]
fn cell_failure_writes_nothing() -> Result<()> {
    let fixture = Fixture::new(
        "CREATE TABLE t (N INTEGER);
         INSERT INTO t VALUES (1);
         INSERT INTO t VALUES ('many');",
    )?;
    let config = fixture.config("SELECT N FROM t")?;

    let err = export(&config).unwrap_err();
    assert!(matches!(err, ExportError::ResultProcessing(_)), "{err:?}");
    assert!(err.to_string().contains("`N`"), "{err}");
    assert!(fixture.outputs()?.is_empty());
    Ok(())
}

#[test]
fn database_is_left_untouched() -> Result<()> {
    let fixture = Fixture::new(PEOPLE)?;
    let config = fixture.config("DELETE FROM person")?;

    let err = export(&config).unwrap_err();
    assert!(matches!(err, ExportError::Query(_)), "{err:?}");

    // The read transaction was ended and the connection closed, so the file is writable again.
    let connection = Connection::open(fixture.database())?;
    let count: i64 = connection.query_row("SELECT count(*) FROM person", [], |row| row.get(0))?;
    assert_eq!(count, 1);
    connection.execute("INSERT INTO person (ID) VALUES (2)", [])?;
    Ok(())
}

#[test]
fn runs_from_config_file() -> Result<()> {
    let fixture = Fixture::new(PEOPLE)?;
    let script = fixture.dir.path().join("count.sql");
    fs::write(&script, "SELECT count(*) AS N FROM person")?;
    let config_path = fixture.dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "backend = \"sqlite\"\ndatabase = {:?}\ninput = {:?}\noutput = {:?}\n",
            fixture.database().display().to_string(),
            script.display().to_string(),
            fixture.dir.path().display().to_string(),
        ),
    )?;

    let config = Config::from_path(&config_path)?;
    assert_eq!(written(export(&config)?)?, "[\n  {\n    \"N\": \"<ANY>\"\n  }\n]");
    Ok(())
}
