//! Runtime entity metadata: one descriptor per entity type, built once.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Primary key type for parsing ids and choosing SQL casts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PkType {
    Uuid,
    BigInt,
    Int,
    Text,
}

impl PkType {
    pub fn pg_type(&self) -> &'static str {
        match self {
            PkType::Uuid => "uuid",
            PkType::BigInt => "bigint",
            PkType::Int => "integer",
            PkType::Text => "text",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub pk_type: Option<PkType>,
    pub nullable: bool,
    /// Whether the column has a DB default (generated id, NOW(), ...).
    pub has_default: bool,
    /// PostgreSQL type name for SQL casts (e.g. "timestamptz") when binding values.
    pub pg_type: Option<String>,
}

impl ColumnInfo {
    /// Check a candidate value against the column's declared type and
    /// nullability. Returns a human-readable reason on mismatch.
    pub fn accepts(&self, v: &Value) -> Result<(), String> {
        if v.is_null() {
            return if self.nullable {
                Ok(())
            } else {
                Err("null for non-nullable column".into())
            };
        }
        let pg_type = self.pg_type.as_deref().unwrap_or("").to_lowercase();
        if pg_type.is_empty() || pg_type.contains("json") {
            return Ok(());
        }
        if pg_type.contains("uuid") {
            return match v.as_str() {
                Some(s) if uuid::Uuid::parse_str(s).is_ok() => Ok(()),
                _ => Err(format!("expected uuid, got {}", kind(v))),
            };
        }
        if pg_type.contains("int") || pg_type.contains("serial") {
            return if v.as_i64().is_some() {
                Ok(())
            } else {
                Err(format!("expected integer, got {}", kind(v)))
            };
        }
        if pg_type.contains("real")
            || pg_type.contains("double")
            || pg_type.contains("numeric")
            || pg_type.contains("decimal")
        {
            return if v.is_number() {
                Ok(())
            } else {
                Err(format!("expected number, got {}", kind(v)))
            };
        }
        if pg_type.starts_with("bool") {
            return if v.is_boolean() {
                Ok(())
            } else {
                Err(format!("expected boolean, got {}", kind(v)))
            };
        }
        // text, varchar, timestamp, date: bound as strings
        if v.is_string() {
            Ok(())
        } else {
            Err(format!("expected string for {}, got {}", pg_type, kind(v)))
        }
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Per-type table metadata. Built once per entity type, at startup or behind
/// a `OnceLock`, never per call.
#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    pub schema_name: String,
    pub table_name: String,
    pub pk_column: String,
    pub pk_type: PkType,
    pub columns: Vec<ColumnInfo>,
}

impl EntityDescriptor {
    pub fn builder(
        schema: impl Into<String>,
        table: impl Into<String>,
        pk_column: impl Into<String>,
        pk_type: PkType,
    ) -> DescriptorBuilder {
        let pk_column = pk_column.into();
        let pk_col = ColumnInfo {
            name: pk_column.clone(),
            pk_type: Some(pk_type.clone()),
            nullable: false,
            has_default: true,
            pg_type: Some(pk_type.pg_type().to_string()),
        };
        DescriptorBuilder {
            descriptor: EntityDescriptor {
                schema_name: schema.into(),
                table_name: table.into(),
                pk_column,
                pk_type,
                columns: vec![pk_col],
            },
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Property columns, in declaration order, excluding the identifier.
    pub fn properties(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.pk_type.is_none())
    }
}

pub struct DescriptorBuilder {
    descriptor: EntityDescriptor,
}

impl DescriptorBuilder {
    pub fn column(mut self, name: impl Into<String>, pg_type: impl Into<String>) -> Self {
        self.descriptor.columns.push(ColumnInfo {
            name: name.into(),
            pk_type: None,
            nullable: false,
            has_default: false,
            pg_type: Some(pg_type.into()),
        });
        self
    }

    pub fn nullable(mut self, name: impl Into<String>, pg_type: impl Into<String>) -> Self {
        self.descriptor.columns.push(ColumnInfo {
            name: name.into(),
            pk_type: None,
            nullable: true,
            has_default: false,
            pg_type: Some(pg_type.into()),
        });
        self
    }

    pub fn defaulted(mut self, name: impl Into<String>, pg_type: impl Into<String>) -> Self {
        self.descriptor.columns.push(ColumnInfo {
            name: name.into(),
            pk_type: None,
            nullable: false,
            has_default: true,
            pg_type: Some(pg_type.into()),
        });
        self
    }

    pub fn build(self) -> EntityDescriptor {
        self.descriptor
    }
}

/// An entity type the generic access layer can operate on: a serde-mapped
/// bean plus its table descriptor.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    type Id: Serialize + Send + Sync + ?Sized;

    fn descriptor() -> &'static EntityDescriptor;
}
