use std::env;

use anyhow::{Context, Result};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

use rowguard_core::{KeyRole, PrimaryKey, Rule};
use rowguard_introspect::introspect_table;

const FIXTURE: &[&str] = &[
    "DROP TABLE IF EXISTS rowguard_it_users",
    "CREATE TABLE rowguard_it_users (
        id INT UNSIGNED NOT NULL AUTO_INCREMENT,
        name VARCHAR(50) NOT NULL,
        email VARCHAR(255) NULL COMMENT 'email',
        status ENUM('active','inactive') NOT NULL DEFAULT 'active',
        verified TINYINT(1) NOT NULL DEFAULT 0,
        last_seen DATETIME NULL,
        PRIMARY KEY (id)
    )",
];

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok()
}

async fn connect(url: &str) -> Result<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect(url)
        .await
        .context("connecting to MySQL")
}

async fn reset_fixture(pool: &MySqlPool) -> Result<()> {
    for statement in FIXTURE {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("executing fixture statement: {statement}"))?;
    }
    Ok(())
}

#[tokio::test]
async fn introspects_columns_keys_and_derived_rules() -> Result<()> {
    let Some(url) = database_url() else {
        eprintln!("skipping: set TEST_DATABASE_URL or DATABASE_URL to run MySQL integration tests");
        return Ok(());
    };
    let pool = connect(&url).await?;
    reset_fixture(&pool).await?;

    let schema = introspect_table(&pool, "rowguard_it_users").await?;

    assert_eq!(schema.table, "rowguard_it_users");
    assert_eq!(schema.primary, Some(PrimaryKey::Single("id".to_string())));

    let id = schema.column("id").context("id column present")?;
    assert_eq!(id.key, KeyRole::Primary);
    assert!(id.automatic);
    assert!(id.unsigned);

    let name = schema.column("name").context("name column present")?;
    assert_eq!(name.rules, vec![Rule::Required, Rule::Max { limit: 50 }]);

    let email = schema.column("email").context("email column present")?;
    assert_eq!(
        email.rules,
        vec![Rule::Max { limit: 255 }, Rule::Email]
    );

    let status = schema.column("status").context("status column present")?;
    assert_eq!(
        status.rules,
        vec![
            Rule::Required,
            Rule::Options {
                allowed: vec!["active".to_string(), "inactive".to_string()],
            },
        ]
    );

    let verified = schema.column("verified").context("verified column present")?;
    assert_eq!(verified.rules, vec![Rule::Required, Rule::Binary]);

    let last_seen = schema.column("last_seen").context("last_seen column present")?;
    assert!(last_seen.rules.is_empty());

    assert!(
        schema.constraints.iter().any(|constraint| constraint.is_primary()),
        "primary constraint is reported"
    );

    Ok(())
}

#[tokio::test]
async fn unknown_tables_are_schema_errors() -> Result<()> {
    let Some(url) = database_url() else {
        eprintln!("skipping: set TEST_DATABASE_URL or DATABASE_URL to run MySQL integration tests");
        return Ok(());
    };
    let pool = connect(&url).await?;

    let err = introspect_table(&pool, "rowguard_it_missing")
        .await
        .expect_err("missing tables are rejected");
    assert!(matches!(err, rowguard_core::Error::InvalidSchema(_)));

    Ok(())
}
