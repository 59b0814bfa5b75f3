//! Transactional upsert coordinator.
//!
//! An [`UpsertPlan`] lists the rows a write depends on, what to do when each
//! of them is absent, and the write itself. Running the plan performs the
//! lookups, the conditional inserts and the write inside a single
//! transaction, so either every row is durable or none is.
//!
//! ```ignore
//! let outcome = UpsertPlan::new("add offering")
//!     .prerequisite(Prerequisite::create("course CS101", lookup, default_course))
//!     .prerequisite(Prerequisite::<semester::ActiveModel>::reject("semester 1", lookup))
//!     .then(move |txn| Box::pin(async move { Ok(offering.insert(txn).await?) }))
//!     .run(&db)
//!     .await?;
//! ```

use async_trait::async_trait;
use futures::future::BoxFuture;
use sea_orm::{
    ActiveModelTrait, Condition, DatabaseTransaction, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, SqlErr, TransactionTrait,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure of a coordinated write. Every variant implies the transaction was
/// rolled back (or never opened).
#[derive(Debug, Error)]
pub enum UpsertError {
    /// A prerequisite that must not be auto-created is absent.
    #[error("{0}")]
    NotFound(String),
    /// A uniqueness constraint rejected an insert or update.
    #[error("{0}")]
    Conflict(String),
    /// The write itself found the request inconsistent with stored data.
    #[error("{0}")]
    Invalid(String),
    /// The store could not be reached or the pool was exhausted.
    #[error("database unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(DbErr),
    /// Failure of one row of a batch. `row` is zero-based.
    #[error("row {row}: {source}")]
    AtRow {
        row: usize,
        source: Box<UpsertError>,
    },
}

/// Coarse classification used to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Invalid,
    Unavailable,
    Internal,
}

impl UpsertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpsertError::NotFound(_) => ErrorKind::NotFound,
            UpsertError::Conflict(_) => ErrorKind::Conflict,
            UpsertError::Invalid(_) => ErrorKind::Invalid,
            UpsertError::Unavailable(_) => ErrorKind::Unavailable,
            UpsertError::Database(_) => ErrorKind::Internal,
            UpsertError::AtRow { source, .. } => source.kind(),
        }
    }

    /// Wrap with the zero-based index of the batch row that failed.
    pub fn at_row(self, row: usize) -> Self {
        UpsertError::AtRow {
            row,
            source: Box::new(self),
        }
    }
}

impl From<DbErr> for UpsertError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                return UpsertError::Conflict(format!("Duplicate entry: {detail}"));
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                return foreign_key_violation(detail);
            }
            _ => {}
        }
        if matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_)) {
            return UpsertError::Unavailable(err.to_string());
        }
        UpsertError::Database(err)
    }
}

/// A foreign-key violation raised on the parent side (deleting or re-keying a
/// row that others still reference) is a conflict. On the child side it means
/// the referenced row is missing.
fn foreign_key_violation(detail: String) -> UpsertError {
    let still_referenced = detail.contains("update or delete on table")
        || detail.contains("delete or update a parent row");
    if still_referenced {
        UpsertError::Conflict(format!("Row is still referenced: {detail}"))
    } else {
        UpsertError::NotFound(format!("Referenced row does not exist: {detail}"))
    }
}

/// What happens when a prerequisite row is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Insert the supplied default row.
    Create,
    /// Abort with [`UpsertError::NotFound`].
    Reject,
}

/// A row that must exist before the target write.
///
/// Existing rows are never modified: the default row is only used when the
/// lookup finds nothing.
pub struct Prerequisite<A: ActiveModelTrait> {
    label: String,
    lookup: Condition,
    default_row: Option<A>,
}

impl<A: ActiveModelTrait> Prerequisite<A> {
    pub fn create(label: impl Into<String>, lookup: Condition, default_row: A) -> Self {
        Self {
            label: label.into(),
            lookup,
            default_row: Some(default_row),
        }
    }

    pub fn reject(label: impl Into<String>, lookup: Condition) -> Self {
        Self {
            label: label.into(),
            lookup,
            default_row: None,
        }
    }

    pub fn with_policy(
        label: impl Into<String>,
        lookup: Condition,
        default_row: A,
        policy: MissingPolicy,
    ) -> Self {
        match policy {
            MissingPolicy::Create => Self::create(label, lookup, default_row),
            MissingPolicy::Reject => Self::reject(label, lookup),
        }
    }
}

enum Ensured {
    Existing,
    Created,
}

#[async_trait]
trait Step: Send {
    async fn ensure(
        self: Box<Self>,
        txn: &DatabaseTransaction,
    ) -> Result<(String, Ensured), UpsertError>;
}

#[async_trait]
impl<A> Step for Prerequisite<A>
where
    A: ActiveModelTrait + Send + 'static,
    A::Entity: Send + Sync,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A> + Send + Sync,
{
    async fn ensure(
        self: Box<Self>,
        txn: &DatabaseTransaction,
    ) -> Result<(String, Ensured), UpsertError> {
        let Prerequisite {
            label,
            lookup,
            default_row,
        } = *self;

        let exists = <A::Entity as EntityTrait>::find()
            .filter(lookup)
            .one(txn)
            .await?
            .is_some();
        if exists {
            return Ok((label, Ensured::Existing));
        }

        let Some(row) = default_row else {
            return Err(UpsertError::NotFound(format!("{label} not found")));
        };
        <A::Entity as EntityTrait>::insert(row)
            .exec_without_returning(txn)
            .await?;
        debug!(prerequisite = %label, "created missing row");
        Ok((label, Ensured::Created))
    }
}

type Write<T> = Box<
    dyn for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, UpsertError>> + Send,
>;

/// A plan under construction: prerequisites in dependency order.
pub struct PlanBuilder {
    label: String,
    steps: Vec<Box<dyn Step>>,
}

/// Prerequisites plus the dependent write, ready to run.
pub struct UpsertPlan<T> {
    label: String,
    steps: Vec<Box<dyn Step>>,
    write: Write<T>,
}

/// Result of an applied plan.
#[derive(Debug)]
pub struct Applied<T> {
    /// Whatever the target write returned (generated ids, row counts...).
    pub value: T,
    /// Labels of the prerequisites that had to be inserted.
    pub created: Vec<String>,
}

impl UpsertPlan<()> {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(label: impl Into<String>) -> PlanBuilder {
        PlanBuilder {
            label: label.into(),
            steps: Vec::new(),
        }
    }
}

impl PlanBuilder {
    /// Append a prerequisite. Prerequisites are ensured in insertion order,
    /// so parents must be added before rows referencing them.
    pub fn prerequisite<A>(mut self, prerequisite: Prerequisite<A>) -> Self
    where
        A: ActiveModelTrait + Send + 'static,
        A::Entity: Send + Sync,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A> + Send + Sync,
    {
        self.steps.push(Box::new(prerequisite));
        self
    }

    /// Set the target write, executed after every prerequisite is satisfied.
    pub fn then<T, F>(self, write: F) -> UpsertPlan<T>
    where
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, UpsertError>>
            + Send
            + 'static,
    {
        UpsertPlan {
            label: self.label,
            steps: self.steps,
            write: Box::new(write),
        }
    }
}

impl<T> UpsertPlan<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run in a fresh transaction: commit on success, roll back otherwise.
    pub async fn run<C>(self, db: &C) -> Result<Applied<T>, UpsertError>
    where
        C: TransactionTrait<Transaction = DatabaseTransaction>,
    {
        let label = self.label.clone();
        let txn = db.begin().await?;
        let result = self.apply(&txn).await;
        finish(txn, &label, result).await
    }

    async fn apply(self, txn: &DatabaseTransaction) -> Result<Applied<T>, UpsertError> {
        let mut created = Vec::new();
        for step in self.steps {
            let (label, ensured) = step.ensure(txn).await?;
            if let Ensured::Created = ensured {
                created.push(label);
            }
        }
        let value = (self.write)(txn).await?;
        Ok(Applied { value, created })
    }
}

/// Run several plans in one transaction. The first failing plan aborts the
/// whole batch; its error is wrapped in [`UpsertError::AtRow`].
pub async fn run_batch<C, T>(
    db: &C,
    label: &str,
    plans: Vec<UpsertPlan<T>>,
) -> Result<Vec<Applied<T>>, UpsertError>
where
    C: TransactionTrait<Transaction = DatabaseTransaction>,
{
    let txn = db.begin().await?;
    let result = apply_all(&txn, plans).await;
    finish(txn, label, result).await
}

async fn apply_all<T>(
    txn: &DatabaseTransaction,
    plans: Vec<UpsertPlan<T>>,
) -> Result<Vec<Applied<T>>, UpsertError> {
    let mut applied = Vec::with_capacity(plans.len());
    for (row, plan) in plans.into_iter().enumerate() {
        applied.push(plan.apply(txn).await.map_err(|e| e.at_row(row))?);
    }
    Ok(applied)
}

async fn finish<T>(
    txn: DatabaseTransaction,
    label: &str,
    result: Result<T, UpsertError>,
) -> Result<T, UpsertError> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            warn!(plan = label, error = %err, "rolling back");
            if let Err(rollback_err) = txn.rollback().await {
                warn!(plan = label, error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
