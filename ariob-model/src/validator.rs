use crate::schema::Schema;
use crate::thing::{soul, Thing, PROTECTED_FIELDS};
use ariob_types::{AppError, AppResult, Clock, EntityId, Issue};
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;

/// Prepares and checks entities of one schema under one storage prefix.
pub struct Validator<D> {
    prefix: String,
    clock: Arc<dyn Clock>,
    _schema: PhantomData<fn() -> D>,
}

impl<D> Clone for Validator<D> {
    fn clone(&self) -> Self {
        Self {
            prefix: self.prefix.clone(),
            clock: Arc::clone(&self.clock),
            _schema: PhantomData,
        }
    }
}

impl<D> std::fmt::Debug for Validator<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl<D: Schema> Validator<D> {
    pub fn new(prefix: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            prefix: prefix.into(),
            clock,
            _schema: PhantomData,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn soul(&self, id: &str) -> String {
        soul(&self.prefix, id)
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Wraps `data` in a new entity with a fresh random id.
    pub fn prepare(&self, data: D, created_by: Option<String>) -> Thing<D> {
        self.prepare_with_id(EntityId::new().to_string(), data, created_by)
    }

    /// Wraps `data` in a new entity under a caller-chosen id.
    pub fn prepare_with_id(
        &self,
        id: impl Into<String>,
        data: D,
        created_by: Option<String>,
    ) -> Thing<D> {
        let id = id.into();
        let now = self.clock.now_ms();
        Thing {
            soul: self.soul(&id),
            id,
            schema: D::TYPE.to_string(),
            created_at: now,
            updated_at: now,
            public: true,
            created_by,
            data,
        }
    }

    /// Meta-field and payload checks on an already typed entity.
    pub fn validate(&self, thing: &Thing<D>) -> AppResult<()> {
        let mut issues = self.meta_issues(thing);
        if let Err(payload) = thing.data.validate() {
            issues.extend(payload);
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(AppError::from_issues(issues))
        }
    }

    /// Parses untrusted JSON (a write or a read-back) into a valid entity.
    pub fn check(&self, value: Value) -> AppResult<Thing<D>> {
        let thing: Thing<D> = serde_json::from_value(value).map_err(|e| {
            AppError::from_issues(vec![Issue::new("", e.to_string())])
                .with_cause(format!("schema {}", D::TYPE))
        })?;
        self.validate(&thing)?;
        Ok(thing)
    }

    /// Shallow-merges `patch` over `current` and re-checks the whole result.
    ///
    /// `updatedAt` always moves forward, even if the clock has not.
    pub fn merge(&self, current: &Thing<D>, patch: &Map<String, Value>) -> AppResult<Thing<D>> {
        let touched: Vec<Issue> = PROTECTED_FIELDS
            .iter()
            .filter(|field| patch.contains_key(**field))
            .map(|field| Issue::new(format!("/{field}"), "field is immutable"))
            .collect();
        if !touched.is_empty() {
            return Err(AppError::from_issues(touched));
        }

        let mut merged = match serde_json::to_value(current)? {
            Value::Object(map) => map,
            _ => return Err(AppError::unknown("entity did not serialize to an object")),
        };
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }
        let updated_at = self.clock.now_ms().max(current.updated_at + 1);
        merged.insert("updatedAt".to_string(), Value::from(updated_at));

        self.check(Value::Object(merged))
    }

    fn meta_issues(&self, thing: &Thing<D>) -> Vec<Issue> {
        let mut issues = Vec::new();
        if thing.id.is_empty() {
            issues.push(Issue::new("/id", "must not be empty"));
        }
        if thing.soul != self.soul(&thing.id) {
            issues.push(Issue::new(
                "/soul",
                format!("expected {}", self.soul(&thing.id)),
            ));
        }
        if thing.schema != D::TYPE {
            issues.push(Issue::new("/schema", format!("expected {}", D::TYPE)));
        }
        if thing.updated_at < thing.created_at {
            issues.push(Issue::new("/updatedAt", "must not precede createdAt"));
        }
        issues
    }
}
