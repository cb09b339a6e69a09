use std::io::Read;

use tracing::{debug, error, info, info_span, warn};

use crate::config::LoadOptions;
use crate::error::LoadError;
use crate::row_source::RowSource;
use crate::session::Session;
use crate::sql_generator::{TablePlan, build_drop_if_exists};

/// Outcome of a committed load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub table: String,
    pub rows: u64,
}

/// Creates `plan.table` and fills it from `rows`, one insert per row.
///
/// The create runs in its own transaction and is committed before any row is
/// inserted; the inserts share a second transaction. If the insert phase does not
/// commit, the table is dropped again, and a failed drop is reported as
/// [`LoadError::Cleanup`] alongside the original error.
pub fn load<S, R>(
    session: &mut S,
    rows: RowSource<R>,
    plan: &TablePlan,
    options: &LoadOptions,
) -> Result<LoadSummary, LoadError>
where
    S: Session,
    R: Read,
{
    let span = info_span!("load", table = %plan.table);
    let _enter = span.enter();

    if options.force {
        info!("force mode, dropping any existing table");
        session.execute(&build_drop_if_exists(&plan.table))?;
    }

    let table = CreatedTable::create(session, plan)?;
    let rows = table.populate(rows)?;

    info!(rows, "committed");
    Ok(LoadSummary {
        table: plan.table.clone(),
        rows,
    })
}

/// A table whose creation has been committed but whose rows have not.
///
/// Dropping it without a successful [`CreatedTable::populate`] removes the table.
struct CreatedTable<'s, S: Session> {
    session: &'s mut S,
    plan: &'s TablePlan,
    armed: bool,
}

impl<'s, S: Session> CreatedTable<'s, S> {
    fn create(session: &'s mut S, plan: &'s TablePlan) -> Result<Self, LoadError> {
        session.begin()?;

        let created = session
            .execute(&plan.create_statement())
            .and_then(|()| session.commit());
        if let Err(err) = created {
            // nothing was created, so a rollback is all the cleanup there is
            if let Err(rollback) = session.rollback() {
                warn!(error = %rollback, "rollback after failed create");
            }
            return Err(err);
        }

        info!(columns = plan.columns.len(), "table created");
        Ok(Self {
            session,
            plan,
            armed: true,
        })
    }

    fn populate<R: Read>(mut self, rows: RowSource<R>) -> Result<u64, LoadError> {
        match self.insert_all(rows) {
            Ok(count) => {
                self.armed = false;
                Ok(count)
            }
            Err(err) => Err(self.discard(err)),
        }
    }

    fn insert_all<R: Read>(&mut self, mut rows: RowSource<R>) -> Result<u64, LoadError> {
        self.session.begin()?;

        let width = self.plan.headers.len();
        while let Some(row) = rows.next() {
            let row = row?;
            if row.len() != width {
                return Err(LoadError::MalformedInput(format!(
                    "row {} (line {}) has {} fields, the header has {width}",
                    rows.rows_read(),
                    rows.line(),
                    row.len(),
                )));
            }
            self.session.execute(&self.plan.insert_statement(&row))?;
        }

        let count = rows.rows_read();
        debug!(rows = count, "all rows inserted");
        self.session.commit()?;
        Ok(count)
    }

    fn discard(&mut self, cause: LoadError) -> LoadError {
        match self.compensate() {
            Ok(()) => cause,
            Err(cleanup) => {
                error!(error = %cleanup, "table could not be dropped and may be partially loaded");
                LoadError::Cleanup {
                    original: Box::new(cause),
                    cleanup: Box::new(cleanup),
                }
            }
        }
    }

    /// Rolls back the insert transaction and drops the table.
    fn compensate(&mut self) -> Result<(), LoadError> {
        self.armed = false;

        if let Err(rollback) = self.session.rollback() {
            warn!(error = %rollback, "rollback after failed insert phase");
        }

        info!("dropping table");
        self.session.execute(&self.plan.drop_statement())
    }
}

impl<S: Session> Drop for CreatedTable<'_, S> {
    fn drop(&mut self) {
        // only reached still armed when unwinding out of the insert phase
        if self.armed {
            warn!("insert phase interrupted, dropping table");
            if let Err(err) = self.compensate() {
                error!(error = %err, "table could not be dropped and may be partially loaded");
            }
        }
    }
}
