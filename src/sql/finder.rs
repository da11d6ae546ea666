//! Precompiled query plus its parameter values and a cacheability flag.

use crate::sql::QueryBuf;
use serde_json::Value;

/// A ready-to-run SQL statement the pagination engine can also count.
///
/// The row-count form is derived, not obtained by mutating this object:
/// a trailing ORDER BY is stripped and the remainder wrapped in a
/// `SELECT COUNT(*)` subquery.
#[derive(Clone, Debug)]
pub struct Finder {
    sql: String,
    params: Vec<Value>,
    cacheable: bool,
}

impl Finder {
    pub fn new(sql: impl Into<String>) -> Self {
        Finder {
            sql: sql.into(),
            params: Vec::new(),
            cacheable: false,
        }
    }

    pub fn bind(mut self, v: impl Into<Value>) -> Self {
        self.params.push(v.into());
        self
    }

    pub fn cacheable(mut self, flag: bool) -> Self {
        self.cacheable = flag;
        self
    }

    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The statement as written, bounded when limit/offset are given.
    pub fn query(&self, limit: Option<u32>, offset: Option<u64>) -> QueryBuf {
        let mut sql = self.sql.clone();
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        if let Some(n) = offset {
            sql.push_str(&format!(" OFFSET {}", n));
        }
        QueryBuf {
            sql,
            params: self.params.clone(),
            cacheable: self.cacheable,
        }
    }

    /// The derived row-count form of the same statement.
    pub fn count_query(&self) -> QueryBuf {
        let body = strip_trailing_order_by(&self.sql);
        QueryBuf {
            sql: format!("SELECT COUNT(*) FROM ({}) count_sub", body.trim_end()),
            params: self.params.clone(),
            cacheable: self.cacheable,
        }
    }
}

/// Strip a trailing top-level ORDER BY clause. An ORDER BY inside a
/// parenthesized subquery is left alone. The scan is byte-wise and
/// ASCII case-insensitive, so indices stay aligned with the input even
/// when surrounding text is non-ASCII. The words ORDER BY appearing
/// inside a string literal at balanced paren depth are not recognized
/// as such; keep literals containing them out of the tail of the
/// statement.
fn strip_trailing_order_by(sql: &str) -> &str {
    const NEEDLE: &[u8] = b"order by";
    let bytes = sql.as_bytes();
    let Some(idx) = bytes
        .windows(NEEDLE.len())
        .rposition(|w| w.eq_ignore_ascii_case(NEEDLE))
    else {
        return sql;
    };
    let before = &bytes[..idx];
    let open = before.iter().filter(|&&b| b == b'(').count();
    let close = before.iter().filter(|&&b| b == b')').count();
    if open == close {
        // idx sits on an ASCII byte, so this is a char boundary
        &sql[..idx]
    } else {
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn count_form_strips_trailing_order_by() {
        let f = Finder::new("SELECT * FROM t WHERE a = $1 ORDER BY b DESC").bind(1);
        let q = f.count_query();
        assert_eq!(
            q.sql,
            "SELECT COUNT(*) FROM (SELECT * FROM t WHERE a = $1) count_sub"
        );
        assert_eq!(q.params, vec![json!(1)]);
    }

    #[test]
    fn count_form_keeps_inner_order_by() {
        let f = Finder::new("SELECT * FROM (SELECT * FROM t ORDER BY b) s");
        let q = f.count_query();
        assert_eq!(
            q.sql,
            "SELECT COUNT(*) FROM (SELECT * FROM (SELECT * FROM t ORDER BY b) s) count_sub"
        );
    }

    #[test]
    fn count_form_handles_non_ascii_text_before_the_order_by() {
        // 'İ' grows under lowercasing; the strip must index the original bytes
        let f = Finder::new("SELECT * FROM t WHERE city = 'İstanbul' ORDER BY b");
        let q = f.count_query();
        assert_eq!(
            q.sql,
            "SELECT COUNT(*) FROM (SELECT * FROM t WHERE city = 'İstanbul') count_sub"
        );
    }

    #[test]
    fn count_form_ignores_mixed_case_order_by() {
        let f = Finder::new("SELECT * FROM t Order By b");
        let q = f.count_query();
        assert_eq!(q.sql, "SELECT COUNT(*) FROM (SELECT * FROM t) count_sub");
    }

    #[test]
    fn query_appends_bounds_and_forwards_cacheable() {
        let f = Finder::new("SELECT * FROM t").cacheable(true);
        let q = f.query(Some(20), Some(40));
        assert_eq!(q.sql, "SELECT * FROM t LIMIT 20 OFFSET 40");
        assert!(q.cacheable);
        assert!(f.count_query().cacheable);
    }
}
