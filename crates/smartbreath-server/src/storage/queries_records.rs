//! Measurement record queries for the SmartBreath server.

use smartbreath_core::Vitals;
use smartbreath_core::db::unix_timestamp;
use smartbreath_core::pagination::{PageRequest, SortKey, SortOrder};

use super::db::Database;
use super::models::{Machine, Record};
use smartbreath_core::db::DatabaseError;

/// A normalized listing query: clamped page, whitelisted sort, optional
/// inclusive `measured_at` bounds.
#[derive(Debug, Clone, Copy)]
pub struct RecordQuery {
    pub page: PageRequest,
    pub sort_by: SortKey,
    pub order: SortOrder,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl RecordQuery {
    /// Normalize raw client inputs. Unknown sort keys fall back to
    /// `measuredAt`; page/page-size are clamped rather than rejected.
    pub fn normalize(
        page: u32,
        page_size: u32,
        sort_by: &str,
        order: &str,
        from: Option<i64>,
        to: Option<i64>,
    ) -> Self {
        Self {
            page: PageRequest::clamped(page, page_size),
            sort_by: SortKey::parse(sort_by),
            order: SortOrder::parse(order),
            from,
            to,
        }
    }
}

impl Database {
    /// Insert a record for a machine. The FEV1/FVC ratio is computed here,
    /// never taken from the caller; a dangling `machine_id` surfaces as
    /// `NotFound` via the foreign key.
    pub async fn create_record(
        &self,
        id: &str,
        machine_id: &str,
        vitals: &Vitals,
        measured_at: Option<i64>,
    ) -> Result<Record, DatabaseError> {
        let now = unix_timestamp();
        let measured_at = measured_at.unwrap_or(now);

        sqlx::query(
            "INSERT INTO records (id, machine_id, spo2, fev1, fvc, pef, fev1_fvc, measured_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(machine_id)
        .bind(vitals.spo2)
        .bind(vitals.fev1)
        .bind(vitals.fvc)
        .bind(vitals.pef)
        .bind(vitals.fev1_fvc())
        .bind(measured_at)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_record(id).await
    }

    /// Get a record by ID.
    pub async fn get_record(&self, id: &str) -> Result<Record, DatabaseError> {
        sqlx::query_as::<_, Record>("SELECT * FROM records WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Record {id}")))
    }

    /// Get a record together with its parent machine.
    ///
    /// Drives both ownership checks and report rendering.
    pub async fn get_record_with_machine(
        &self,
        id: &str,
    ) -> Result<(Record, Machine), DatabaseError> {
        let record = self.get_record(id).await?;
        let machine = self.get_machine(&record.machine_id).await?;
        Ok((record, machine))
    }

    /// One page of a machine's records plus the matching total count.
    ///
    /// The `ORDER BY` clause is assembled from the whitelist enums only, so
    /// no client string ever reaches the SQL text.
    pub async fn list_records(
        &self,
        machine_id: &str,
        query: &RecordQuery,
    ) -> Result<(Vec<Record>, i64), DatabaseError> {
        let from = query.from.unwrap_or(i64::MIN);
        let to = query.to.unwrap_or(i64::MAX);

        let sql = format!(
            "SELECT * FROM records WHERE machine_id = ? AND measured_at >= ? AND measured_at <= ? \
             ORDER BY {} {} LIMIT ? OFFSET ?",
            query.sort_by.column(),
            query.order.keyword(),
        );

        let records = sqlx::query_as::<_, Record>(&sql)
            .bind(machine_id)
            .bind(from)
            .bind(to)
            .bind(query.page.limit())
            .bind(query.page.offset())
            .fetch_all(self.pool())
            .await?;

        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM records WHERE machine_id = ? AND measured_at >= ? AND measured_at <= ?",
        )
        .bind(machine_id)
        .bind(from)
        .bind(to)
        .fetch_one(self.pool())
        .await?;

        Ok((records, row.0))
    }

    /// Delete a record.
    pub async fn delete_record(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM records WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count the records attached to a machine.
    pub async fn count_records(&self, machine_id: &str) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records WHERE machine_id = ?")
            .bind(machine_id)
            .fetch_one(self.pool())
            .await?;

        Ok(row.0)
    }
}
