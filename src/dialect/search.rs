//! A minimal search-expression AST and the WHERE/ORDER BY walker that turns
//! it into SQL (SPEC_FULL.md §4.2). The front end that parses UPnP search
//! criteria strings into this AST is out of scope (SPEC_FULL.md §1); this
//! crate only owns the AST shape and the walk.

use super::SqlDialect;
use crate::error::{CdsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Contains,
    StartsWith,
    Gt,
    Lt,
    Ge,
    Le,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchExpr {
    Compare {
        property: String,
        op: CompareOp,
        value: SearchValue,
    },
    And(Box<SearchExpr>, Box<SearchExpr>),
    Or(Box<SearchExpr>, Box<SearchExpr>),
    Not(Box<SearchExpr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

/// Maps a search-grammar property name (e.g. `"dc:title"`) to the SQL
/// column that stores it. Unknown properties are a `ConstraintViolation`,
/// not a silent no-match, so a typo in a saved search surfaces immediately.
pub trait PropertyResolver {
    fn column_for(&self, property: &str) -> Option<&'static str>;
}

/// Walk a `SearchExpr` into a `WHERE`-clause fragment (without the `WHERE`
/// keyword), escaping every literal through the dialect's literal quoting.
pub fn to_where_clause(
    expr: &SearchExpr,
    dialect: &dyn SqlDialect,
    properties: &dyn PropertyResolver,
) -> Result<String> {
    match expr {
        SearchExpr::Compare { property, op, value } => {
            let column = properties.column_for(property).ok_or_else(|| {
                CdsError::ConstraintViolation(format!("unknown search property '{property}'"))
            })?;
            let quoted_column = dialect.quote_identifier(column);
            Ok(render_compare(&quoted_column, *op, value, dialect))
        }
        SearchExpr::And(lhs, rhs) => Ok(format!(
            "({} AND {})",
            to_where_clause(lhs, dialect, properties)?,
            to_where_clause(rhs, dialect, properties)?
        )),
        SearchExpr::Or(lhs, rhs) => Ok(format!(
            "({} OR {})",
            to_where_clause(lhs, dialect, properties)?,
            to_where_clause(rhs, dialect, properties)?
        )),
        SearchExpr::Not(inner) => Ok(format!("(NOT {})", to_where_clause(inner, dialect, properties)?)),
    }
}

fn render_compare(column: &str, op: CompareOp, value: &SearchValue, dialect: &dyn SqlDialect) -> String {
    let literal = match value {
        SearchValue::Str(s) => dialect.quote_str(s),
        SearchValue::Int(i) => dialect.quote_int(*i),
        SearchValue::Bool(b) => dialect.quote_bool(*b),
    };
    match op {
        CompareOp::Eq => format!("{column} = {literal}"),
        CompareOp::Ne => format!("{column} <> {literal}"),
        CompareOp::Gt => format!("{column} > {literal}"),
        CompareOp::Lt => format!("{column} < {literal}"),
        CompareOp::Ge => format!("{column} >= {literal}"),
        CompareOp::Le => format!("{column} <= {literal}"),
        CompareOp::Contains => {
            let SearchValue::Str(s) = value else {
                return format!("{column} = {literal}");
            };
            format!("{column} LIKE {}", dialect.quote_str(&format!("%{}%", escape_like(s))))
        }
        CompareOp::StartsWith => {
            let SearchValue::Str(s) = value else {
                return format!("{column} = {literal}");
            };
            format!("{column} LIKE {}", dialect.quote_str(&format!("{}%", escape_like(s))))
        }
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Walk an `ORDER BY` spec into SQL, same escaping discipline as
/// `to_where_clause`.
pub fn to_order_by_clause(
    sort: &[(String, SortDir)],
    dialect: &dyn SqlDialect,
    properties: &dyn PropertyResolver,
) -> Result<String> {
    let mut parts = Vec::with_capacity(sort.len());
    for (property, dir) in sort {
        let column = properties.column_for(property).ok_or_else(|| {
            CdsError::ConstraintViolation(format!("unknown sort property '{property}'"))
        })?;
        let quoted = dialect.quote_identifier(column);
        parts.push(match dir {
            SortDir::Asc => format!("{quoted} ASC"),
            SortDir::Desc => format!("{quoted} DESC"),
        });
    }
    Ok(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqliteDialect;

    struct FixedProperties;
    impl PropertyResolver for FixedProperties {
        fn column_for(&self, property: &str) -> Option<&'static str> {
            match property {
                "dc:title" => Some("dc_title"),
                "upnp:class" => Some("upnp_class"),
                _ => None,
            }
        }
    }

    #[test]
    fn simple_equality_escapes_its_literal() {
        let expr = SearchExpr::Compare {
            property: "dc:title".to_string(),
            op: CompareOp::Eq,
            value: SearchValue::Str("O'Brien".to_string()),
        };
        let sql = to_where_clause(&expr, &SqliteDialect, &FixedProperties).unwrap();
        assert_eq!(sql, "\"dc_title\" = 'O''Brien'");
    }

    #[test]
    fn and_or_not_compose_with_parens() {
        let expr = SearchExpr::And(
            Box::new(SearchExpr::Compare {
                property: "upnp:class".to_string(),
                op: CompareOp::StartsWith,
                value: SearchValue::Str("object.item".to_string()),
            }),
            Box::new(SearchExpr::Not(Box::new(SearchExpr::Compare {
                property: "dc:title".to_string(),
                op: CompareOp::Contains,
                value: SearchValue::Str("draft".to_string()),
            }))),
        );
        let sql = to_where_clause(&expr, &SqliteDialect, &FixedProperties).unwrap();
        assert!(sql.starts_with('('));
        assert!(sql.contains("LIKE 'object.item%'"));
        assert!(sql.contains("NOT"));
    }

    #[test]
    fn unknown_property_is_a_constraint_violation() {
        let expr = SearchExpr::Compare {
            property: "bogus:field".to_string(),
            op: CompareOp::Eq,
            value: SearchValue::Str("x".to_string()),
        };
        assert!(to_where_clause(&expr, &SqliteDialect, &FixedProperties).is_err());
    }

    #[test]
    fn like_wildcards_in_user_values_are_escaped() {
        let expr = SearchExpr::Compare {
            property: "dc:title".to_string(),
            op: CompareOp::Contains,
            value: SearchValue::Str("50%_off".to_string()),
        };
        let sql = to_where_clause(&expr, &SqliteDialect, &FixedProperties).unwrap();
        assert!(sql.contains("50\\%\\_off"));
    }

    #[test]
    fn order_by_renders_each_direction() {
        let sort = vec![
            ("dc:title".to_string(), SortDir::Asc),
            ("upnp:class".to_string(), SortDir::Desc),
        ];
        let sql = to_order_by_clause(&sort, &SqliteDialect, &FixedProperties).unwrap();
        assert_eq!(sql, "\"dc_title\" ASC, \"upnp_class\" DESC");
    }
}
