//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from entity metadata.

use crate::meta::EntityDescriptor;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Fully qualified table name.
fn qualified_table(desc: &EntityDescriptor) -> String {
    format!("{}.{}", quoted(&desc.schema_name), quoted(&desc.table_name))
}

/// A parameterized statement plus the flag forwarded verbatim to the executor.
#[derive(Clone, Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
    pub cacheable: bool,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    fn push_param(&mut self, v: Value) -> u32 {
        self.params.push(v);
        self.params.len() as u32
    }
}

/// SELECT list: each column as-is, except custom enums (schema.typename) and
/// numeric as col::text so the driver returns String.
fn select_column_list(desc: &EntityDescriptor) -> String {
    desc.columns
        .iter()
        .map(|c| {
            let q = quoted(&c.name);
            let pg_type = c.pg_type.as_deref().unwrap_or("");
            if pg_type.contains('.') || pg_type == "numeric" {
                format!("{}::text", q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Placeholder with a SQL cast when the column type is known, so string
/// values bind correctly against uuid/timestamp/enum columns.
fn placeholder(desc: &EntityDescriptor, column: &str, n: u32) -> String {
    desc.column(column)
        .and_then(|c| c.pg_type.as_deref())
        .map(|t| format!("${}::{}", n, t))
        .unwrap_or_else(|| format!("${}", n))
}

/// One filter condition over a named property.
#[derive(Clone, Debug)]
pub enum Predicate {
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Ge(String, Value),
    Lt(String, Value),
    Le(String, Value),
    /// LIKE against a caller-built pattern. The pattern is bound as-is; `%`
    /// and `_` inside it keep their wildcard meaning.
    Like(String, String),
    IsNull(String),
    IsNotNull(String),
}

impl Predicate {
    pub fn property(&self) -> &str {
        match self {
            Predicate::Eq(p, _)
            | Predicate::Ne(p, _)
            | Predicate::Gt(p, _)
            | Predicate::Ge(p, _)
            | Predicate::Lt(p, _)
            | Predicate::Le(p, _)
            | Predicate::Like(p, _)
            | Predicate::IsNull(p)
            | Predicate::IsNotNull(p) => p,
        }
    }

    fn render(&self, desc: &EntityDescriptor, q: &mut QueryBuf) -> String {
        let binary = |q: &mut QueryBuf, prop: &str, op: &str, v: &Value| {
            let n = q.push_param(v.clone());
            format!("{} {} {}", quoted(prop), op, placeholder(desc, prop, n))
        };
        match self {
            Predicate::Eq(p, v) => binary(q, p, "=", v),
            Predicate::Ne(p, v) => binary(q, p, "<>", v),
            Predicate::Gt(p, v) => binary(q, p, ">", v),
            Predicate::Ge(p, v) => binary(q, p, ">=", v),
            Predicate::Lt(p, v) => binary(q, p, "<", v),
            Predicate::Le(p, v) => binary(q, p, "<=", v),
            Predicate::Like(p, pattern) => {
                let n = q.push_param(Value::String(pattern.clone()));
                format!("{} LIKE ${}", quoted(p), n)
            }
            Predicate::IsNull(p) => format!("{} IS NULL", quoted(p)),
            Predicate::IsNotNull(p) => format!("{} IS NOT NULL", quoted(p)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Debug)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Order {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Order {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// Per-row result-shape transform applied after fetch, never during count.
pub type RowTransform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Immutable query shape: conjunction of predicates, ordering, optional
/// projection and row transform, cacheable flag.
///
/// The count and fetch statements are built independently from the same
/// specification, so computing a count never disturbs the caller's shaping.
#[derive(Clone, Default)]
pub struct Specification {
    predicates: Vec<Predicate>,
    order: Vec<Order>,
    projection: Option<Vec<String>>,
    transform: Option<RowTransform>,
    cacheable: bool,
}

impl Specification {
    pub fn new() -> Self {
        Specification::default()
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn filter_all(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.predicates.extend(predicates);
        self
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    /// Restrict the fetched columns. Count queries ignore the projection.
    pub fn project(mut self, columns: impl IntoIterator<Item = String>) -> Self {
        self.projection = Some(columns.into_iter().collect());
        self
    }

    /// Reshape each fetched row. Count queries ignore the transform.
    pub fn map_rows(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.transform = Some(Arc::new(f));
        self
    }

    pub fn cacheable(mut self, flag: bool) -> Self {
        self.cacheable = flag;
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn transform(&self) -> Option<&RowTransform> {
        self.transform.as_ref()
    }

    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    fn where_clause(&self, desc: &EntityDescriptor, q: &mut QueryBuf) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .predicates
            .iter()
            .map(|p| p.render(desc, q))
            .collect();
        format!(" WHERE {}", parts.join(" AND "))
    }

    /// Row-count form: filter intact, projection replaced by COUNT(*),
    /// ordering left out (irrelevant to a count, rejected by some backends).
    pub fn count_query(&self, desc: &EntityDescriptor) -> QueryBuf {
        let mut q = QueryBuf::new();
        q.cacheable = self.cacheable;
        let where_clause = self.where_clause(desc, &mut q);
        q.sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            qualified_table(desc),
            where_clause
        );
        q
    }

    /// Fetch form: original projection and ordering, bounded by LIMIT/OFFSET.
    pub fn fetch_query(
        &self,
        desc: &EntityDescriptor,
        limit: Option<u32>,
        offset: Option<u64>,
    ) -> QueryBuf {
        let mut q = QueryBuf::new();
        q.cacheable = self.cacheable;
        let cols = match &self.projection {
            Some(cols) => cols
                .iter()
                .map(|c| quoted(c))
                .collect::<Vec<_>>()
                .join(", "),
            None => select_column_list(desc),
        };
        let where_clause = self.where_clause(desc, &mut q);
        let order_clause = if self.order.is_empty() {
            String::new()
        } else {
            let parts: Vec<String> = self
                .order
                .iter()
                .map(|o| {
                    let dir = match o.direction {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    format!("{} {}", quoted(&o.column), dir)
                })
                .collect();
            format!(" ORDER BY {}", parts.join(", "))
        };
        let limit_clause = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
        let offset_clause = offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
        q.sql = format!(
            "SELECT {} FROM {}{}{}{}{}",
            cols,
            qualified_table(desc),
            where_clause,
            order_clause,
            limit_clause,
            offset_clause
        );
        q
    }
}

/// SELECT by primary key; `lock` adds FOR UPDATE (pessimistic lock delegated
/// to the database).
pub fn select_by_id(desc: &EntityDescriptor, id: &Value, lock: bool) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id.clone());
    let suffix = if lock { " FOR UPDATE" } else { "" };
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}{}",
        select_column_list(desc),
        qualified_table(desc),
        quoted(&desc.pk_column),
        placeholder(desc, &desc.pk_column, n),
        suffix
    );
    q
}

/// INSERT from a serialized bean. The primary key is included only when
/// `include_pk`; columns with a DB default are omitted when the bean carries
/// no value, so the database supplies the default.
pub fn insert(desc: &EntityDescriptor, body: &Map<String, Value>, include_pk: bool) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &desc.columns {
        if c.pk_type.is_some() && !include_pk {
            continue;
        }
        let val = body.get(&c.name).cloned();
        if val.is_none() && c.has_default {
            continue;
        }
        let n = q.push_param(val.unwrap_or(Value::Null));
        cols.push(quoted(&c.name));
        placeholders.push(placeholder(desc, &c.name, n));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        qualified_table(desc),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(desc)
    );
    q
}

/// UPDATE by primary key: SET exactly the given pairs, identifier never among
/// them. An empty patch degenerates to a plain fetch of the row.
pub fn update_by_id(desc: &EntityDescriptor, id: &Value, patch: &[(String, Value)]) -> QueryBuf {
    if patch.is_empty() {
        return select_by_id(desc, id, false);
    }
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (name, value) in patch {
        if *name == desc.pk_column {
            continue;
        }
        let n = q.push_param(value.clone());
        sets.push(format!("{} = {}", quoted(name), placeholder(desc, name, n)));
    }
    if sets.is_empty() {
        return select_by_id(desc, id, false);
    }
    let id_n = q.push_param(id.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        qualified_table(desc),
        sets.join(", "),
        quoted(&desc.pk_column),
        placeholder(desc, &desc.pk_column, id_n),
        select_column_list(desc)
    );
    q
}

/// DELETE by primary key, returning the deleted row.
pub fn delete_by_id(desc: &EntityDescriptor, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id.clone());
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        qualified_table(desc),
        quoted(&desc.pk_column),
        placeholder(desc, &desc.pk_column, n),
        select_column_list(desc)
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::PkType;
    use serde_json::json;

    fn desc() -> EntityDescriptor {
        EntityDescriptor::builder("public", "users", "id", PkType::BigInt)
            .column("name", "text")
            .nullable("email", "text")
            .defaulted("created_at", "timestamptz")
            .build()
    }

    #[test]
    fn count_query_drops_ordering_and_projection() {
        let d = desc();
        let spec = Specification::new()
            .filter(Predicate::Eq("name".into(), json!("rugal")))
            .order_by(Order::desc("created_at"))
            .project(vec!["name".into()]);
        let q = spec.count_query(&d);
        assert_eq!(
            q.sql,
            "SELECT COUNT(*) FROM \"public\".\"users\" WHERE \"name\" = $1::text"
        );
        assert_eq!(q.params, vec![json!("rugal")]);
    }

    #[test]
    fn fetch_query_keeps_ordering_projection_and_bounds() {
        let d = desc();
        let spec = Specification::new()
            .filter(Predicate::Eq("name".into(), json!("rugal")))
            .order_by(Order::desc("created_at"))
            .project(vec!["name".into(), "email".into()]);
        let q = spec.fetch_query(&d, Some(10), Some(20));
        assert_eq!(
            q.sql,
            "SELECT \"name\", \"email\" FROM \"public\".\"users\" \
             WHERE \"name\" = $1::text ORDER BY \"created_at\" DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn empty_specification_scans_the_whole_table() {
        let d = desc();
        let spec = Specification::new();
        assert_eq!(
            spec.count_query(&d).sql,
            "SELECT COUNT(*) FROM \"public\".\"users\""
        );
        let fetch = spec.fetch_query(&d, None, None);
        assert!(!fetch.sql.contains("WHERE"));
        assert!(!fetch.sql.contains("LIMIT"));
    }

    #[test]
    fn like_pattern_is_bound_verbatim() {
        let d = desc();
        let mut q = QueryBuf::new();
        // wildcard characters inside the caller's value are not escaped
        let clause = Predicate::Like("name".into(), "ru%gal%".into()).render(&d, &mut q);
        assert_eq!(clause, "\"name\" LIKE $1");
        assert_eq!(q.params, vec![json!("ru%gal%")]);
    }

    #[test]
    fn insert_skips_pk_and_defaulted_absent_columns() {
        let d = desc();
        let body = serde_json::from_value::<Map<String, Value>>(
            json!({"name": "rugal", "email": null}),
        )
        .unwrap();
        let q = insert(&d, &body, false);
        assert_eq!(
            q.sql,
            "INSERT INTO \"public\".\"users\" (\"name\", \"email\") VALUES ($1::text, $2::text) \
             RETURNING \"id\", \"name\", \"email\", \"created_at\""
        );
        assert_eq!(q.params.len(), 2);
    }

    #[test]
    fn insert_with_pk_binds_the_identifier() {
        let d = desc();
        let body =
            serde_json::from_value::<Map<String, Value>>(json!({"id": 7, "name": "r", "email": null}))
                .unwrap();
        let q = insert(&d, &body, true);
        assert!(q.sql.contains("\"id\""));
        assert_eq!(q.params[0], json!(7));
    }

    #[test]
    fn update_never_sets_the_identifier() {
        let d = desc();
        let patch = vec![
            ("id".to_string(), json!(9)),
            ("name".to_string(), json!("new")),
        ];
        let q = update_by_id(&d, &json!(7), &patch);
        assert_eq!(
            q.sql,
            "UPDATE \"public\".\"users\" SET \"name\" = $1::text WHERE \"id\" = $2::bigint \
             RETURNING \"id\", \"name\", \"email\", \"created_at\""
        );
        assert_eq!(q.params, vec![json!("new"), json!(7)]);
    }

    #[test]
    fn empty_patch_degenerates_to_a_fetch() {
        let d = desc();
        let q = update_by_id(&d, &json!(7), &[]);
        assert!(q.sql.starts_with("SELECT"));
    }

    #[test]
    fn select_by_id_lock_appends_for_update() {
        let d = desc();
        let q = select_by_id(&d, &json!(7), true);
        assert!(q.sql.ends_with("FOR UPDATE"));
        let q = select_by_id(&d, &json!(7), false);
        assert!(!q.sql.contains("FOR UPDATE"));
    }
}
