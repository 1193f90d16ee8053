//! The Emitter builds SQL fragments for composite operations: browse,
//! search, metadata, resource, and autoscan queries (SPEC_FULL.md §4.2).
//! Each query's static shape (projection list, joins) is assembled once at
//! construction and cached; only the per-call predicate is appended later,
//! matching the "compiled once at init, read-only after" policy in
//! SPEC_FULL.md §5.

use std::sync::Arc;

use super::search::{to_order_by_clause, to_where_clause, PropertyResolver, SearchExpr, SortDir};
use super::SqlDialect;
use crate::error::Result;
use crate::schema::{AUTOSCAN_TABLE, CONFIG_VALUE_TABLE, METADATA_TABLE, OBJECT_TABLE, RESOURCE_TABLE};

/// Columns projected by the browse/search query, in the fixed order
/// `createObjectFromRow` (object_store.rs) expects.
pub const BROWSE_COLUMNS: &[&str] = &[
    "id",
    "parent_id",
    "ref_id",
    "object_type",
    "upnp_class",
    "dc_title",
    "location",
    "mime_type",
    "update_id",
    "flags",
    "service_id",
];

/// Columns from the reference-id self-join, appended after `BROWSE_COLUMNS`.
pub const REF_COLUMNS: &[&str] = &["upnp_class", "dc_title", "location", "mime_type"];

/// Escape `LIKE`'s own wildcard characters (and the escape character itself)
/// in a literal the caller wants matched verbatim as a prefix.
fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

pub struct Emitter {
    dialect: Arc<dyn SqlDialect>,
    browse_select_list: String,
    browse_from: String,
}

impl Emitter {
    pub fn new(dialect: Arc<dyn SqlDialect>) -> Self {
        let o = |c: &str| format!("o.{}", dialect.quote_identifier(c));
        let r = |c: &str| format!("r.{}", dialect.quote_identifier(c));

        let mut select_list: Vec<String> = BROWSE_COLUMNS.iter().map(|c| o(c)).collect();
        select_list.extend(REF_COLUMNS.iter().map(|c| format!("{} AS ref_{}", r(c), c)));
        let browse_select_list = select_list.join(", ");

        let browse_from = format!(
            "{table} o LEFT JOIN {table} r ON o.{ref_id} = r.{id}",
            table = dialect.quote_identifier(OBJECT_TABLE),
            ref_id = dialect.quote_identifier("ref_id"),
            id = dialect.quote_identifier("id"),
        );

        Self {
            dialect,
            browse_select_list,
            browse_from,
        }
    }

    fn base_browse_select(&self) -> String {
        format!("SELECT {} FROM {}", self.browse_select_list, self.browse_from)
    }

    /// Every object in the store, unfiltered. Used when materializing a
    /// dynamic container's contents (SPEC_FULL.md §4.9), which evaluates
    /// its saved search in process rather than pushing it into SQL.
    pub fn browse_all(&self) -> String {
        self.base_browse_select()
    }

    pub fn browse_by_id(&self, id: i64) -> String {
        format!("{} WHERE o.id = {}", self.base_browse_select(), self.dialect.quote_int(id))
    }

    pub fn browse_by_parent(&self, parent_id: i64) -> String {
        format!(
            "{} WHERE o.parent_id = {} ORDER BY o.id",
            self.base_browse_select(),
            self.dialect.quote_int(parent_id)
        )
    }

    pub fn browse_by_service_id(&self, service_id: &str) -> String {
        format!(
            "{} WHERE o.service_id = {}",
            self.base_browse_select(),
            self.dialect.quote_str(service_id)
        )
    }

    /// Every object whose `service_id` starts with `prefix` (SPEC_FULL.md
    /// §10 "get_service_object_ids" — a routing-prefix match, not the exact
    /// match `browse_by_service_id` does for single-object lookup).
    pub fn browse_by_service_prefix(&self, prefix: &str) -> String {
        format!(
            "{} WHERE o.service_id LIKE {} ESCAPE '\\'",
            self.base_browse_select(),
            self.dialect.quote_str(&format!("{}%", escape_like_pattern(prefix)))
        )
    }

    pub fn search_query(
        &self,
        expr: &SearchExpr,
        sort: &[(String, SortDir)],
        properties: &dyn PropertyResolver,
    ) -> Result<String> {
        let mut sql = format!(
            "{} WHERE {}",
            self.base_browse_select(),
            to_where_clause(expr, self.dialect.as_ref(), properties)?
        );
        if !sort.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&to_order_by_clause(sort, self.dialect.as_ref(), properties)?);
        }
        Ok(sql)
    }

    pub fn metadata_query(&self, object_id: i64) -> String {
        format!(
            "SELECT property_name, property_value FROM {} WHERE object_id = {} ORDER BY property_name",
            self.dialect.quote_identifier(METADATA_TABLE),
            self.dialect.quote_int(object_id)
        )
    }

    pub fn resource_query(&self, object_id: i64, attribute_columns: &[String]) -> String {
        let mut columns = vec!["res_id".to_string()];
        columns.extend(attribute_columns.iter().cloned());
        let select_list = columns
            .iter()
            .map(|c| self.dialect.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "SELECT {} FROM {} WHERE object_id = {} ORDER BY res_id",
            select_list,
            self.dialect.quote_identifier(RESOURCE_TABLE),
            self.dialect.quote_int(object_id)
        )
    }

    pub fn autoscan_query(&self, scan_mode_value: &str) -> String {
        format!(
            "SELECT object_id, location, scan_mode, level, recursive, hidden_files, interval_seconds, last_modified, persistent FROM {} WHERE scan_mode = {} ORDER BY object_id",
            self.dialect.quote_identifier(AUTOSCAN_TABLE),
            self.dialect.quote_str(scan_mode_value)
        )
    }

    pub fn config_values_query(&self) -> String {
        format!(
            "SELECT item, key, value, status FROM {}",
            self.dialect.quote_identifier(CONFIG_VALUE_TABLE)
        )
    }
}
