//! Typed get/find/save/delete over an entity type and its identifier.

use crate::error::AppError;
use crate::meta::{Entity, EntityDescriptor};
use crate::page::Page;
use crate::service::paginate::{paginate_finder, paginate_spec};
use crate::service::update::{update_by_updater, Updater};
use crate::session::Session;
use crate::sql::{self, Finder, Predicate, Specification};
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Generic entity access over a borrowed session. One `Repo<T>` per entity
/// type; all state lives in the session.
pub struct Repo<T: Entity> {
    session: Arc<dyn Session>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Repo<T> {
    fn clone(&self) -> Self {
        Repo {
            session: Arc::clone(&self.session),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repo<T> {
    pub fn new(session: Arc<dyn Session>) -> Self {
        Repo {
            session,
            _entity: PhantomData,
        }
    }

    pub fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }

    fn descriptor() -> &'static EntityDescriptor {
        T::descriptor()
    }

    fn check_property(property: &str) -> Result<(), AppError> {
        if property.trim().is_empty() {
            return Err(AppError::BadRequest("property name is empty".into()));
        }
        if !Self::descriptor().has_column(property) {
            return Err(AppError::BadRequest(format!(
                "unknown property '{}'",
                property
            )));
        }
        Ok(())
    }

    fn from_row(row: Value) -> Result<T, AppError> {
        Ok(serde_json::from_value(row)?)
    }

    /// Fetch by identifier; absent is `Ok(None)`, not a fault.
    pub async fn get(&self, id: &T::Id) -> Result<Option<T>, AppError> {
        self.get_internal(id, false).await
    }

    /// Fetch by identifier holding a pessimistic lock (`FOR UPDATE`); the
    /// lock itself is entirely the database's business.
    pub async fn get_locked(&self, id: &T::Id) -> Result<Option<T>, AppError> {
        self.get_internal(id, true).await
    }

    async fn get_internal(&self, id: &T::Id, lock: bool) -> Result<Option<T>, AppError> {
        let id = serde_json::to_value(id)?;
        let q = sql::select_by_id(Self::descriptor(), &id, lock);
        let row = self.session.fetch_optional(&q).await?;
        row.map(Self::from_row).transpose()
    }

    /// Records whose property equals the value.
    pub async fn find_by_property(
        &self,
        property: &str,
        value: impl Serialize,
    ) -> Result<Vec<T>, AppError> {
        Self::check_property(property)?;
        let spec = Specification::new().filter(Predicate::Eq(
            property.to_string(),
            serde_json::to_value(value)?,
        ));
        self.find(&spec).await
    }

    /// Prefix search; pattern `value%`. Wildcard characters inside the
    /// caller's value are passed through to the pattern engine unescaped.
    pub async fn starts_with(&self, property: &str, value: &str) -> Result<Vec<T>, AppError> {
        self.find_like(property, format!("{}%", value)).await
    }

    /// Substring search; pattern `%value%`, unescaped as above.
    pub async fn contains(&self, property: &str, value: &str) -> Result<Vec<T>, AppError> {
        self.find_like(property, format!("%{}%", value)).await
    }

    /// Suffix search; pattern `%value`, unescaped as above.
    pub async fn ends_with(&self, property: &str, value: &str) -> Result<Vec<T>, AppError> {
        self.find_like(property, format!("%{}", value)).await
    }

    async fn find_like(&self, property: &str, pattern: String) -> Result<Vec<T>, AppError> {
        Self::check_property(property)?;
        let spec =
            Specification::new().filter(Predicate::Like(property.to_string(), pattern));
        self.find(&spec).await
    }

    /// Equality search expected to match at most one record; more than one
    /// matching row is a fault, not a silent first-match.
    pub async fn find_unique_by_property(
        &self,
        property: &str,
        value: impl Serialize,
    ) -> Result<Option<T>, AppError> {
        Self::check_property(property)?;
        let spec = Specification::new().filter(Predicate::Eq(
            property.to_string(),
            serde_json::to_value(value)?,
        ));
        let q = spec.fetch_query(Self::descriptor(), Some(2), None);
        let mut rows = self.session.fetch_all(&q).await?;
        if rows.len() > 1 {
            return Err(AppError::NonUnique(format!(
                "property '{}' matched more than one row",
                property
            )));
        }
        rows.pop().map(Self::from_row).transpose()
    }

    /// Row count over an equality filter.
    pub async fn count_by_property(
        &self,
        property: &str,
        value: impl Serialize,
    ) -> Result<i64, AppError> {
        Self::check_property(property)?;
        let spec = Specification::new().filter(Predicate::Eq(
            property.to_string(),
            serde_json::to_value(value)?,
        ));
        self.session
            .count(&spec.count_query(Self::descriptor()))
            .await
    }

    /// Records matching a conjunction of predicates.
    pub async fn find_by_criteria(&self, predicates: &[Predicate]) -> Result<Vec<T>, AppError> {
        for p in predicates {
            Self::check_property(p.property())?;
        }
        let spec = Specification::new().filter_all(predicates.iter().cloned());
        self.find(&spec).await
    }

    /// All records matching a specification, unbounded.
    pub async fn find(&self, spec: &Specification) -> Result<Vec<T>, AppError> {
        let q = spec.fetch_query(Self::descriptor(), None, None);
        let rows = self.session.fetch_all(&q).await?;
        rows.into_iter().map(Self::from_row).collect()
    }

    /// All records matching a precompiled query.
    pub async fn find_by_finder(&self, finder: &Finder) -> Result<Vec<T>, AppError> {
        let rows = self.session.fetch_all(&finder.query(None, None)).await?;
        rows.into_iter().map(Self::from_row).collect()
    }

    /// Insert the bean. When it carries no identifier the database's
    /// configured strategy populates one; the returned bean reflects the
    /// stored row either way.
    pub async fn save(&self, bean: &T) -> Result<T, AppError> {
        let desc = Self::descriptor();
        let obj = match serde_json::to_value(bean)? {
            Value::Object(m) => m,
            _ => {
                return Err(AppError::BadRequest(
                    "entity must serialize to a JSON object".into(),
                ))
            }
        };
        let include_pk = obj
            .get(&desc.pk_column)
            .map(|v| !v.is_null())
            .unwrap_or(false);
        let q = sql::insert(desc, &obj, include_pk);
        let row = self
            .session
            .execute_returning(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        Self::from_row(row)
    }

    /// Delete the record the bean identifies; the bean must carry its
    /// identifier.
    pub async fn delete(&self, bean: &T) -> Result<T, AppError> {
        let desc = Self::descriptor();
        let obj = match serde_json::to_value(bean)? {
            Value::Object(m) => m,
            _ => {
                return Err(AppError::BadRequest(
                    "entity must serialize to a JSON object".into(),
                ))
            }
        };
        let id = obj
            .get(&desc.pk_column)
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| AppError::BadRequest("bean has no identifier".into()))?;
        self.delete_by_id(&id).await
    }

    /// Load by identifier (absent is a fault here, the delete is mandatory),
    /// then delete.
    pub async fn delete_by_pk(&self, id: &T::Id) -> Result<T, AppError> {
        let desc = Self::descriptor();
        let id = serde_json::to_value(id)?;
        let q = sql::select_by_id(desc, &id, false);
        self.session
            .fetch_optional(&q)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", desc.table_name, id)))?;
        self.delete_by_id(&id).await
    }

    async fn delete_by_id(&self, id: &Value) -> Result<T, AppError> {
        let desc = Self::descriptor();
        let row = self
            .session
            .execute_returning(&sql::delete_by_id(desc, id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", desc.table_name, id)))?;
        Self::from_row(row)
    }

    /// One page of the whole table, unfiltered.
    pub async fn get_page(&self, page_no: u32, page_size: u32) -> Result<Page<T>, AppError> {
        self.paginate(&Specification::new(), page_no, page_size)
            .await
    }

    /// One page of records matching a specification.
    pub async fn paginate(
        &self,
        spec: &Specification,
        page_no: u32,
        page_size: u32,
    ) -> Result<Page<T>, AppError> {
        let page = paginate_spec(
            self.session.as_ref(),
            Self::descriptor(),
            spec,
            page_no,
            page_size,
        )
        .await?;
        page.try_map_items(|row| serde_json::from_value(row).map_err(AppError::from))
    }

    /// One page of records from a precompiled query.
    pub async fn paginate_finder(
        &self,
        finder: &Finder,
        page_no: u32,
        page_size: u32,
    ) -> Result<Page<T>, AppError> {
        let page = paginate_finder(self.session.as_ref(), finder, page_no, page_size).await?;
        page.try_map_items(|row| serde_json::from_value(row).map_err(AppError::from))
    }

    /// Copy the updater-approved properties onto the persisted record and
    /// return it; everything else keeps its pre-update value.
    pub async fn update_by_updater(&self, updater: Updater<T>) -> Result<T, AppError> {
        update_by_updater(self.session.as_ref(), updater).await
    }
}
