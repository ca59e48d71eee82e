use anyhow::{Context, Result};

use super::connection::DbConn;

const TABLES: [&str; 5] = ["matches", "rounds", "registrations", "tournaments", "rulesets"];

/// Drops every table and recreates the schema.
pub fn reset_database(conn: &mut DbConn) -> Result<()> {
    for table in TABLES {
        execute_sql(conn, &format!("DROP TABLE IF EXISTS {}", table))
            .with_context(|| format!("Failed to drop table {}", table))?;
    }
    create_schema(conn)?;

    log::info!("Database schema reset successfully");
    Ok(())
}

/// Creates any missing table; existing data is left alone.
pub fn ensure_schema(conn: &mut DbConn) -> Result<()> {
    create_schema(conn)?;
    log::debug!("Database schema verified");
    Ok(())
}

fn create_schema(conn: &mut DbConn) -> Result<()> {
    let schema_sql = include_str!("schema.sql");
    let statements = split_sql_statements(schema_sql);

    for (idx, statement) in statements.iter().enumerate() {
        execute_sql(conn, statement)
            .with_context(|| format!("Failed to execute statement {}", idx + 1))?;
    }
    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn execute_sql(conn: &mut DbConn, sql: &str) -> Result<()> {
    conn.execute(sql, [])
        .context("Failed to execute SQL statement")
        .map(|_| ())
}
