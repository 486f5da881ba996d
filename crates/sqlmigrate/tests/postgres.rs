//! Live Postgres tests. Skipped unless `DATABASE_URL` is set (a `.env` file is honored).

use sqlmigrate::{
    ColumnDef, Migration, MigrationError, MigrationResult, PgDatabase, StrictSanitizer, Values,
};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_postgres::NoTls;

async fn try_connect() -> Option<tokio_postgres::Client> {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let database_url = std::env::var("DATABASE_URL").ok()?;
    let (client, connection) = tokio_postgres::connect(&database_url, NoTls)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });
    Some(client)
}

fn unique_table(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    format!("{prefix}_{}_{}", std::process::id(), nanos)
}

#[tokio::test]
async fn table_lifecycle() -> MigrationResult<()> {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL is not set; skipping table_lifecycle");
        return Ok(());
    };
    let migration = Migration::new(PgDatabase::new(client), StrictSanitizer::new());
    let table = unique_table("sqlmigrate_users");
    let renamed = format!("{table}_renamed");

    assert!(!migration.check_if_table_exist(&table).await?);

    assert!(
        migration
            .create_table(
                &table,
                &[
                    ColumnDef::new("id", "INT").not_null(),
                    ColumnDef::new("name", "TEXT"),
                    ColumnDef::new("age", "INT"),
                ],
            )
            .await?
    );
    assert!(migration.check_if_table_exist(&table).await?);
    assert!(migration.is_primary(&table, "id").await?);

    for (id, name) in [(1, "alice"), (2, "bob")] {
        let values = Values::new().set("id", id).set("name", name).set("age", 30);
        assert!(migration.insert_value(&table, &values).await?);
    }
    assert_eq!(migration.count_rows(&table).await?, 2);

    assert!(migration.update_value(&table, "age", 31).await?);
    assert!(migration.drop_column(&table, "age").await?);

    assert!(migration.rename_table(&table, &renamed).await?);
    assert!(!migration.check_if_table_exist(&table).await?);
    assert!(migration.check_if_table_exist(&renamed).await?);

    assert!(migration.truncate_table(&renamed).await?);
    assert_eq!(migration.count_rows(&renamed).await?, 0);

    assert!(migration.drop_table(&renamed).await?);
    assert!(!migration.check_if_table_exist(&renamed).await?);
    Ok(())
}

#[tokio::test]
async fn existence_check_accepts_every_identifier_form() -> MigrationResult<()> {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL is not set; skipping existence_check_accepts_every_identifier_form");
        return Ok(());
    };
    let migration = Migration::new(PgDatabase::new(client), StrictSanitizer::new());
    let suffix = unique_table("t");
    let columns = [ColumnDef::new("id", "INT")];

    let quoted = format!("\"Quoted_{suffix}\"");
    assert!(migration.create_table(&quoted, &columns).await?);
    assert!(migration.check_if_table_exist(&quoted).await?);

    let mixed = format!("Mixed_{suffix}");
    assert!(migration.create_table(&mixed, &columns).await?);
    assert!(migration.check_if_table_exist(&mixed).await?);
    assert!(migration.check_if_table_exist(&mixed.to_lowercase()).await?);

    let dotted = format!("public.dotted_{suffix}");
    assert!(migration.create_table(&dotted, &columns).await?);
    assert!(migration.check_if_table_exist(&dotted).await?);
    assert!(
        !migration
            .check_if_table_exist(&format!("information_schema.dotted_{suffix}"))
            .await?
    );

    for table in [&quoted, &mixed, &dotted] {
        migration.drop_table(table).await?;
        assert!(!migration.check_if_table_exist(table).await?);
    }
    Ok(())
}

#[tokio::test]
async fn count_rows_over_a_large_table() -> MigrationResult<()> {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL is not set; skipping count_rows_over_a_large_table");
        return Ok(());
    };
    let table = unique_table("sqlmigrate_count");
    client
        .batch_execute(&format!(
            "CREATE TABLE {table} AS SELECT g AS id FROM generate_series(1, 50000) AS g"
        ))
        .await
        .map_err(MigrationError::from_db_error)?;

    let migration = Migration::new(PgDatabase::new(client), StrictSanitizer::new());
    assert_eq!(migration.count_rows(&table).await?, 50_000);
    migration.drop_table(&table).await?;
    Ok(())
}

#[tokio::test]
async fn database_lifecycle() -> MigrationResult<()> {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL is not set; skipping database_lifecycle");
        return Ok(());
    };
    let migration = Migration::new(PgDatabase::new(client), StrictSanitizer::new());
    let name = unique_table("sqlmigrate_db");

    assert!(migration.create_database(&name).await?);
    let err = migration.create_database(&name).await.unwrap_err();
    assert!(err.is_already_exists(), "unexpected error: {err}");
    assert!(migration.drop_database(&name).await?);
    Ok(())
}

#[tokio::test]
async fn driver_errors_are_classified() -> MigrationResult<()> {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL is not set; skipping driver_errors_are_classified");
        return Ok(());
    };
    let migration = Migration::new(PgDatabase::new(client), StrictSanitizer::new());
    let table = unique_table("sqlmigrate_missing");

    let err = migration.drop_table(&table).await.unwrap_err();
    assert!(err.is_undefined_table(), "unexpected error: {err}");

    let table = unique_table("sqlmigrate_unique");
    migration
        .create_table(&table, &[ColumnDef::new("id", "INT").clause("PRIMARY KEY")])
        .await?;
    migration
        .insert_value(&table, &Values::new().set("id", 1))
        .await?;
    let err = migration
        .insert_value(&table, &Values::new().set("id", 1))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(), "unexpected error: {err}");

    migration.drop_table(&table).await?;
    Ok(())
}

#[tokio::test]
async fn runs_inside_a_transaction() -> MigrationResult<()> {
    let Some(mut client) = try_connect().await else {
        eprintln!("DATABASE_URL is not set; skipping runs_inside_a_transaction");
        return Ok(());
    };
    let table = unique_table("sqlmigrate_tx");

    let tx = client
        .transaction()
        .await
        .map_err(MigrationError::from_db_error)?;
    let migration = Migration::new(PgDatabase::new(tx), StrictSanitizer::new());
    migration
        .create_table(&table, &[ColumnDef::new("id", "INT")])
        .await?;
    assert!(migration.check_if_table_exist(&table).await?);

    let (db, _) = migration.into_parts();
    db.into_inner()
        .rollback()
        .await
        .map_err(MigrationError::from_db_error)?;

    let migration = Migration::new(PgDatabase::new(client), StrictSanitizer::new());
    assert!(!migration.check_if_table_exist(&table).await?);
    Ok(())
}
