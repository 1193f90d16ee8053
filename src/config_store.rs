//! CRUD for `grb_config_value` rows, the UI-editable config overlay
//! (SPEC_FULL.md §4.8).

use crate::dialect::{Emitter, SqlDialect};
use crate::driver::Driver;
use crate::error::Result;
use crate::model::{ConfigStatus, ConfigValue};
use crate::row::{SqlResult, SqlRow};
use crate::schema::CONFIG_VALUE_TABLE;

fn row_to_value(row: &dyn SqlRow) -> Result<ConfigValue> {
    let status_raw = row.col_string(3);
    let status = ConfigStatus::parse(&status_raw)
        .ok_or_else(|| crate::error::CdsError::ConstraintViolation(format!("unknown config status '{status_raw}'")))?;
    Ok(ConfigValue {
        item: row.col_string(0),
        key: row.col_string(1),
        value: row.col_string(2),
        status,
    })
}

pub fn get_config_values(driver: &dyn Driver, emitter: &Emitter) -> Result<Vec<ConfigValue>> {
    let mut result = driver.select(&emitter.config_values_query())?;
    let mut values = Vec::new();
    while let Some(row) = result.next_row() {
        values.push(row_to_value(&row)?);
    }
    Ok(values)
}

/// Insert or overwrite one `(item, key)` entry.
pub fn update_config_value(driver: &dyn Driver, dialect: &dyn SqlDialect, value: &ConfigValue) -> Result<()> {
    let sql = format!(
        "INSERT OR REPLACE INTO {table} (item, key, value, status) VALUES ({item}, {key}, {value}, {status})",
        table = dialect.quote_identifier(CONFIG_VALUE_TABLE),
        item = dialect.quote_str(&value.item),
        key = dialect.quote_str(&value.key),
        value = dialect.quote_str(&value.value),
        status = dialect.quote_str(value.status.as_str()),
    );
    driver.exec(&sql, false)?;
    Ok(())
}

/// Remove every entry under `item` (all of its keys). The literal value
/// `"*"` means "every item" (SPEC_FULL.md §4.8).
pub fn remove_config_value(driver: &dyn Driver, dialect: &dyn SqlDialect, item: &str) -> Result<()> {
    let table = dialect.quote_identifier(CONFIG_VALUE_TABLE);
    let sql = if item == "*" {
        format!("DELETE FROM {table}")
    } else {
        format!("DELETE FROM {table} WHERE item = {}", dialect.quote_str(item))
    };
    driver.exec(&sql, false)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqliteDialect;
    use crate::driver::SqliteDriver;
    use rusqlite::Connection;
    use std::sync::Arc;

    fn store() -> (SqliteDriver, Arc<dyn SqlDialect>, Emitter) {
        let conn = Connection::open_in_memory().unwrap();
        crate::schema::init(&conn, &[]).unwrap();
        let driver = SqliteDriver::open(conn);
        let dialect: Arc<dyn SqlDialect> = Arc::new(SqliteDialect);
        let emitter = Emitter::new(dialect.clone());
        (driver, dialect, emitter)
    }

    fn value(item: &str, key: &str, value: &str, status: ConfigStatus) -> ConfigValue {
        ConfigValue {
            item: item.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            status,
        }
    }

    #[test]
    fn upsert_then_list_round_trips() {
        let (driver, dialect, emitter) = store();
        update_config_value(&driver, dialect.as_ref(), &value("server.storage", "transactions", "true", ConfigStatus::Added)).unwrap();
        let values = get_config_values(&driver, &emitter).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].value, "true");
    }

    #[test]
    fn removing_one_item_drops_every_key_under_it() {
        let (driver, dialect, emitter) = store();
        update_config_value(&driver, dialect.as_ref(), &value("server.storage", "a", "1", ConfigStatus::Added)).unwrap();
        update_config_value(&driver, dialect.as_ref(), &value("server.storage", "b", "2", ConfigStatus::Added)).unwrap();
        update_config_value(&driver, dialect.as_ref(), &value("server.import", "c", "3", ConfigStatus::Added)).unwrap();

        remove_config_value(&driver, dialect.as_ref(), "server.storage").unwrap();

        let values = get_config_values(&driver, &emitter).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].item, "server.import");
    }

    #[test]
    fn wildcard_item_removes_everything() {
        let (driver, dialect, emitter) = store();
        update_config_value(&driver, dialect.as_ref(), &value("server.storage", "a", "1", ConfigStatus::Added)).unwrap();
        update_config_value(&driver, dialect.as_ref(), &value("server.import", "c", "3", ConfigStatus::Added)).unwrap();

        remove_config_value(&driver, dialect.as_ref(), "*").unwrap();

        assert!(get_config_values(&driver, &emitter).unwrap().is_empty());
    }
}
