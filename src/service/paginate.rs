//! Two-phase count-then-fetch pagination over a session.

use crate::error::AppError;
use crate::meta::EntityDescriptor;
use crate::page::Page;
use crate::session::Session;
use crate::sql::{Finder, Specification};
use serde_json::Value;

/// Paginate a specification: count with the filter intact (no ordering, no
/// projection), then fetch the bounded slice with the original shaping.
///
/// When the count is zero the fetch is never issued; the page comes back
/// with an empty item list.
pub async fn paginate_spec(
    session: &dyn Session,
    desc: &EntityDescriptor,
    spec: &Specification,
    page_no: u32,
    page_size: u32,
) -> Result<Page<Value>, AppError> {
    let total_count = session.count(&spec.count_query(desc)).await?;
    let mut page = Page::new(page_no, page_size, total_count);
    if total_count < 1 {
        return Ok(page);
    }
    let q = spec.fetch_query(desc, Some(page.page_size()), Some(page.first_result()));
    let mut rows = session.fetch_all(&q).await?;
    if let Some(transform) = spec.transform() {
        rows = rows.into_iter().map(|r| transform(r)).collect();
    }
    page.set_items(rows);
    Ok(page)
}

/// Paginate a precompiled query through its derived row-count form. The
/// finder's cacheable flag rides along on both phases.
pub async fn paginate_finder(
    session: &dyn Session,
    finder: &Finder,
    page_no: u32,
    page_size: u32,
) -> Result<Page<Value>, AppError> {
    let total_count = session.count(&finder.count_query()).await?;
    let mut page = Page::new(page_no, page_size, total_count);
    if total_count < 1 {
        return Ok(page);
    }
    let q = finder.query(Some(page.page_size()), Some(page.first_result()));
    let rows = session.fetch_all(&q).await?;
    page.set_items(rows);
    Ok(page)
}
