#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests that require a local MySQL instance with the configured
// schema loaded. Run with: cargo test --test integration_mysql -- --ignored

use dbchat::config::DatabaseConfig;
use dbchat::database::MySqlDatabase;
use serial_test::serial;
use std::env;

fn create_integration_test_config() -> DatabaseConfig {
    DatabaseConfig {
        host: env::var("DBCHAT_MYSQL_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: env::var("DBCHAT_MYSQL_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3306),
        user: env::var("DBCHAT_MYSQL_USER").unwrap_or_else(|_| "root".to_string()),
        password: env::var("DBCHAT_MYSQL_PASSWORD").unwrap_or_default(),
        database: env::var("DBCHAT_MYSQL_DB").unwrap_or_else(|_| "studentdb".to_string()),
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires a local MySQL instance"]
async fn real_mysql_connection_and_ping() {
    let config = create_integration_test_config();
    let database = MySqlDatabase::connect(&config)
        .await
        .expect("should connect to MySQL");

    database.ping().await.expect("ping should succeed");
}

#[tokio::test]
#[serial]
#[ignore = "requires a local MySQL instance"]
async fn real_mysql_lists_tables() {
    let config = create_integration_test_config();
    let database = MySqlDatabase::connect(&config)
        .await
        .expect("should connect to MySQL");

    let tables = database.list_tables().await.expect("should list tables");
    assert!(!tables.is_empty(), "schema should contain at least one table");
}

#[tokio::test]
#[serial]
#[ignore = "requires a local MySQL instance"]
async fn real_mysql_fetch_produces_tagged_records() {
    let config = create_integration_test_config();
    let database = MySqlDatabase::connect(&config)
        .await
        .expect("should connect to MySQL");

    let records = database
        .fetch_all_records()
        .await
        .expect("fetch should succeed");

    for record in &records {
        assert!(
            record.text.starts_with(&format!("Table: {}", record.table)),
            "record text should carry its table tag: {}",
            record.text
        );
    }
}
