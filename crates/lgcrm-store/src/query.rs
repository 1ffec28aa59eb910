// ABOUTME: Fluent query builder over one collection: chain filters, then run one terminal operation.
// ABOUTME: Terminal operations select, update, insert, or delete rows and persist mutations before returning.

use std::collections::HashSet;
use std::marker::PhantomData;

use lgcrm_core::filter::matches_all;
use lgcrm_core::patch::record_fields;
use lgcrm_core::{Filter, NotInValues, Patch, PatchError, Record};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::change::Change;
use crate::engine::Engine;

/// Errors surfaced by terminal operations. Every one of them is detected
/// before the store is touched, so a failed call changes nothing.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("duplicate id in {collection}: {id}")]
    DuplicateId {
        collection: &'static str,
        id: String,
    },

    #[error("unknown column for {collection}: {column}")]
    UnknownColumn {
        collection: &'static str,
        column: String,
    },
}

/// Row-count mode for `select`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    Exact,
}

/// Options for `select`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    pub count: Option<CountMode>,
    /// Return only metadata; `rows` is omitted.
    pub head: bool,
}

impl SelectOptions {
    /// Rows plus an exact match count.
    pub fn exact_count() -> Self {
        Self {
            count: Some(CountMode::Exact),
            head: false,
        }
    }

    /// Only the exact match count, no rows.
    pub fn count_only() -> Self {
        Self {
            count: Some(CountMode::Exact),
            head: true,
        }
    }
}

/// Result of `select`: matching rows (unless `head` was requested) and the
/// match count (if `count` was requested).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectResult<T> {
    pub rows: Option<Vec<T>>,
    pub count: Option<usize>,
}

/// Column projection for `select_columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Columns {
    All,
    Named(Vec<String>),
}

impl Columns {
    fn parse(raw: &str) -> Self {
        let names: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() || names.iter().any(|c| c == "*") {
            Columns::All
        } else {
            Columns::Named(names)
        }
    }
}

/// A single-use query over `R`'s collection.
///
/// Filters accumulate with logical AND. Each terminal operation consumes
/// the builder, so it runs at most once.
#[must_use = "a query does nothing until a terminal operation runs"]
pub struct Query<R: Record> {
    engine: Engine,
    filters: Vec<Filter>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Query<R> {
    pub(crate) fn new(engine: Engine) -> Self {
        Self {
            engine,
            filters: Vec::new(),
            _record: PhantomData,
        }
    }

    /// Keep rows whose `field` strictly equals `value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Keep rows whose `field` is not one of `values`. Accepts a list or a
    /// tuple literal such as `("Perdido","Cierre")`.
    pub fn not_in(mut self, field: impl Into<String>, values: impl Into<NotInValues>) -> Self {
        self.filters.push(Filter::NotIn {
            field: field.into(),
            values: values.into().into_inner(),
        });
        self
    }

    /// Return matching rows in stored order.
    pub async fn select(self, opts: SelectOptions) -> SelectResult<R> {
        let state = self.engine.read().await;
        let rows: Vec<R> = state
            .tables
            .get_all::<R>()
            .iter()
            .filter(|row| self.matches(*row))
            .cloned()
            .collect();
        drop(state);

        tracing::debug!(
            collection = R::COLLECTION.name(),
            filters = self.filters.len(),
            matched = rows.len(),
            "select"
        );
        shape_result(rows, opts)
    }

    /// Like `select`, projecting each row onto `columns` (`*` or a comma
    /// separated list of field names, in the order given).
    pub async fn select_columns(
        self,
        columns: &str,
        opts: SelectOptions,
    ) -> Result<SelectResult<Map<String, Value>>, QueryError> {
        let columns = Columns::parse(columns);
        if let Columns::Named(names) = &columns
            && let Some(unknown) = names.iter().find(|n| !R::FIELDS.contains(&n.as_str()))
        {
            return Err(QueryError::UnknownColumn {
                collection: R::COLLECTION.name(),
                column: unknown.clone(),
            });
        }

        let state = self.engine.read().await;
        let mut rows = Vec::new();
        for row in state.tables.get_all::<R>() {
            let mut fields = record_fields(row)?;
            if !matches_all(&self.filters, &fields) {
                continue;
            }
            let projected = match &columns {
                Columns::All => fields,
                Columns::Named(names) => names
                    .iter()
                    .map(|name| {
                        let value = fields.remove(name).unwrap_or(Value::Null);
                        (name.clone(), value)
                    })
                    .collect(),
            };
            rows.push(projected);
        }
        drop(state);

        Ok(shape_result(rows, opts))
    }

    /// Merge `patch` into every matching row. Returns the changed rows in
    /// their post-update state and stored order. `id` and `created_at` in
    /// the patch are ignored.
    pub async fn update(self, patch: Patch) -> Result<Vec<R>, QueryError> {
        let collection = R::COLLECTION;
        patch.check_fields::<R>()?;
        let mut state = self.engine.write().await;

        let mut patched = Vec::new();
        for (index, row) in state.tables.get_all::<R>().iter().enumerate() {
            if self.matches(row) {
                patched.push((index, patch.apply_to(row)?));
            }
        }

        if patched.is_empty() {
            tracing::debug!(collection = collection.name(), "update matched no rows");
            return Ok(Vec::new());
        }

        let rows = R::rows_mut(&mut state.tables);
        for (index, row) in &patched {
            rows[*index] = row.clone();
        }
        self.engine.persist_tables(&state.tables);

        let updated: Vec<R> = patched.into_iter().map(|(_, row)| row).collect();
        tracing::debug!(collection = collection.name(), updated = updated.len(), "update");
        self.engine.publish(Change::Updated {
            collection,
            ids: updated.iter().map(|r| r.id().to_string()).collect(),
        });
        drop(state);
        Ok(updated)
    }

    /// Create records from `drafts`, synthesizing `id` and `created_at`
    /// when absent, and place them before every existing row. Returns the
    /// new records in the order given. Filters do not apply to inserts.
    pub async fn insert<I>(self, drafts: I) -> Result<Vec<R>, QueryError>
    where
        I: IntoIterator<Item = Patch>,
    {
        let collection = R::COLLECTION;
        if !self.filters.is_empty() {
            tracing::debug!(
                collection = collection.name(),
                filters = self.filters.len(),
                "ignoring filters on insert"
            );
        }

        let created: Vec<R> = drafts
            .into_iter()
            .map(Patch::into_record::<R>)
            .collect::<Result<_, _>>()?;
        if created.is_empty() {
            return Ok(created);
        }

        let mut state = self.engine.write().await;
        let mut batch = HashSet::new();
        for record in &created {
            if state.tables.contains_id::<R>(record.id()) || !batch.insert(record.id()) {
                return Err(QueryError::DuplicateId {
                    collection: collection.name(),
                    id: record.id().to_string(),
                });
            }
        }

        let mut rows = created.clone();
        rows.extend(state.tables.replace::<R>(Vec::new()));
        state.tables.replace(rows);
        self.engine.persist_tables(&state.tables);

        tracing::debug!(collection = collection.name(), inserted = created.len(), "insert");
        self.engine.publish(Change::Inserted {
            collection,
            ids: created.iter().map(|r| r.id().to_string()).collect(),
        });
        drop(state);
        Ok(created)
    }

    /// Insert a single draft.
    pub async fn insert_one(self, draft: Patch) -> Result<R, QueryError> {
        let mut created = self.insert([draft]).await?;
        // insert returns exactly one record per draft.
        Ok(created.remove(0))
    }

    /// Remove every matching row, keeping survivors in their stored order.
    /// Returns how many rows were removed.
    pub async fn delete(self) -> usize {
        let collection = R::COLLECTION;
        let mut state = self.engine.write().await;

        let mut removed = Vec::new();
        let mut kept = Vec::new();
        for row in state.tables.replace::<R>(Vec::new()) {
            if self.matches(&row) {
                removed.push(row.id().to_string());
            } else {
                kept.push(row);
            }
        }
        state.tables.replace(kept);

        if removed.is_empty() {
            tracing::debug!(collection = collection.name(), "delete matched no rows");
            return 0;
        }

        self.engine.persist_tables(&state.tables);

        tracing::debug!(collection = collection.name(), deleted = removed.len(), "delete");
        let count = removed.len();
        self.engine.publish(Change::Deleted {
            collection,
            ids: removed,
        });
        drop(state);
        count
    }

    fn matches(&self, row: &R) -> bool {
        if self.filters.is_empty() {
            return true;
        }
        match record_fields(row) {
            Ok(fields) => matches_all(&self.filters, &fields),
            Err(e) => {
                tracing::warn!(collection = R::COLLECTION.name(), "unreadable row skipped: {}", e);
                false
            }
        }
    }
}

fn shape_result<T>(rows: Vec<T>, opts: SelectOptions) -> SelectResult<T> {
    let count = opts.count.map(|CountMode::Exact| rows.len());
    let rows = if opts.head { None } else { Some(rows) };
    SelectResult { rows, count }
}
