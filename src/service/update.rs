//! Selective update: copy caller-approved properties from a detached bean
//! onto the persisted record.

use crate::error::AppError;
use crate::meta::Entity;
use crate::session::Session;
use crate::sql;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A candidate bean plus a per-property decision function. Constructed per
/// update request, consumed once.
pub struct Updater<T: Entity> {
    bean: T,
    decide: Box<dyn Fn(&str, &Value) -> bool + Send + Sync>,
}

impl<T: Entity> Updater<T> {
    pub fn new(bean: T, decide: impl Fn(&str, &Value) -> bool + Send + Sync + 'static) -> Self {
        Updater {
            bean,
            decide: Box::new(decide),
        }
    }

    /// Update exactly the named properties.
    pub fn only(bean: T, properties: &[&str]) -> Self {
        let allowed: HashSet<String> = properties.iter().map(|p| p.to_string()).collect();
        Self::new(bean, move |prop, _| allowed.contains(prop))
    }

    /// Update every property the candidate bean carries a non-null value for.
    pub fn non_null(bean: T) -> Self {
        Self::new(bean, |_, value| !value.is_null())
    }

    pub fn bean(&self) -> &T {
        &self.bean
    }

    /// Should `property` overwrite the persisted value with `candidate`?
    pub fn is_update(&self, property: &str, candidate: &Value) -> bool {
        (self.decide)(property, candidate)
    }
}

/// Apply an updater: load the persisted record by the candidate's identifier,
/// collect the approved properties into a diff, apply it in one statement.
///
/// The identifier is never overwritten. The first property that cannot be
/// read off the candidate or does not fit its column aborts the whole update.
pub async fn update_by_updater<T: Entity>(
    session: &dyn Session,
    updater: Updater<T>,
) -> Result<T, AppError> {
    let desc = T::descriptor();
    let bean_obj = serialize_bean(updater.bean())?;
    let id = bean_obj
        .get(&desc.pk_column)
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or_else(|| AppError::property(&desc.pk_column, "candidate bean has no identifier"))?;

    let persisted = session
        .fetch_optional(&sql::select_by_id(desc, &id, false))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", desc.table_name, id)))?;

    let mut patch: Vec<(String, Value)> = Vec::new();
    for col in desc.properties() {
        let candidate = bean_obj.get(&col.name).cloned().ok_or_else(|| {
            AppError::property(&col.name, "property missing on candidate bean")
        })?;
        if !updater.is_update(&col.name, &candidate) {
            continue;
        }
        col.accepts(&candidate)
            .map_err(|detail| AppError::PropertyAccess {
                property: col.name.clone(),
                detail,
            })?;
        patch.push((col.name.clone(), candidate));
    }

    if patch.is_empty() {
        return Ok(serde_json::from_value(persisted)?);
    }

    let row = session
        .execute_returning(&sql::update_by_id(desc, &id, &patch))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", desc.table_name, id)))?;
    Ok(serde_json::from_value(row)?)
}

fn serialize_bean<T: Entity>(bean: &T) -> Result<Map<String, Value>, AppError> {
    match serde_json::to_value(bean)? {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest(
            "entity must serialize to a JSON object".into(),
        )),
    }
}
