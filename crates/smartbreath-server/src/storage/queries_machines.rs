//! Machine registry queries for the SmartBreath server.
//!
//! The lifecycle operations that touch more than one table (claim, reset,
//! remove) each run in a single transaction: either every write commits or
//! none do.

use smartbreath_core::db::unix_timestamp;

use super::db::Database;
use super::models::{Machine, MachineWithOwner, RESET_DEVICE_NAME};
use smartbreath_core::db::DatabaseError;

const MACHINE_WITH_OWNER_SQL: &str = "SELECT m.id, m.device_name, m.model, m.owner_id, \
            m.registered_at, m.updated_at, \
            u.username AS owner_username, u.email AS owner_email \
     FROM machines m LEFT JOIN users u ON u.id = m.owner_id";

impl Database {
    /// Register a machine for an existing owner.
    ///
    /// The owner lookup makes a dangling `owner_id` a typed `NotFound`;
    /// device-name/model collisions surface as `Conflict` via the unique
    /// indexes even when two creates race.
    pub async fn create_machine(
        &self,
        id: &str,
        device_name: &str,
        model: &str,
        owner_id: &str,
    ) -> Result<MachineWithOwner, DatabaseError> {
        self.get_user(owner_id).await?;

        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO machines (id, device_name, model, owner_id, registered_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(device_name)
        .bind(model)
        .bind(owner_id)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_machine_with_owner(id).await
    }

    /// Get a machine by ID.
    pub async fn get_machine(&self, id: &str) -> Result<Machine, DatabaseError> {
        sqlx::query_as::<_, Machine>("SELECT * FROM machines WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Machine {id}")))
    }

    /// Get a machine joined with its owner's identity summary.
    pub async fn get_machine_with_owner(
        &self,
        id: &str,
    ) -> Result<MachineWithOwner, DatabaseError> {
        sqlx::query_as::<_, MachineWithOwner>(&format!("{MACHINE_WITH_OWNER_SQL} WHERE m.id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Machine {id}")))
    }

    /// List the machines owned by one user, most recently active first.
    pub async fn list_machines(
        &self,
        owner_id: &str,
    ) -> Result<Vec<MachineWithOwner>, DatabaseError> {
        let machines = sqlx::query_as::<_, MachineWithOwner>(&format!(
            "{MACHINE_WITH_OWNER_SQL} WHERE m.owner_id = ? ORDER BY m.updated_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;

        Ok(machines)
    }

    /// Check whether another machine already holds `device_name`.
    pub async fn device_name_taken(
        &self,
        device_name: &str,
        exclude_id: &str,
    ) -> Result<bool, DatabaseError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM machines WHERE device_name = ? AND id <> ?",
        )
        .bind(device_name)
        .bind(exclude_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.is_some())
    }

    /// Rename a machine.
    pub async fn rename_machine(
        &self,
        id: &str,
        device_name: &str,
    ) -> Result<MachineWithOwner, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "UPDATE machines SET device_name = ?, updated_at = ? WHERE id = ?",
        )
        .bind(device_name)
        .bind(now)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Machine {id}")));
        }

        self.get_machine_with_owner(id).await
    }

    /// Update a machine's `updated_at` timestamp.
    ///
    /// Called on every successful record creation as a liveness heartbeat.
    pub async fn touch_machine(&self, id: &str) -> Result<(), DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query("UPDATE machines SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Machine {id}")));
        }

        Ok(())
    }

    /// Claim a machine for a user, renaming it in the same transaction.
    pub async fn claim_machine(
        &self,
        id: &str,
        user_id: &str,
        device_name: &str,
    ) -> Result<MachineWithOwner, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let now = unix_timestamp();
        let result = sqlx::query(
            "UPDATE machines SET owner_id = ?, device_name = ?, updated_at = ? WHERE id = ?",
        )
        .bind(user_id)
        .bind(device_name)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Machine {id}")));
        }

        tx.commit().await?;

        self.get_machine_with_owner(id).await
    }

    /// Reset a machine: purge its records, clear the owner, and rename it to
    /// the sentinel. All-or-nothing.
    pub async fn reset_machine(&self, id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let machine: Option<Machine> =
            sqlx::query_as("SELECT * FROM machines WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if machine.is_none() {
            return Err(DatabaseError::NotFound(format!("Machine {id}")));
        }

        sqlx::query("DELETE FROM records WHERE machine_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let now = unix_timestamp();
        sqlx::query(
            "UPDATE machines SET owner_id = NULL, device_name = ?, updated_at = ? WHERE id = ?",
        )
        .bind(RESET_DEVICE_NAME)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Remove a machine and all of its records. All-or-nothing.
    pub async fn remove_machine(&self, id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let machine: Option<Machine> =
            sqlx::query_as("SELECT * FROM machines WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if machine.is_none() {
            return Err(DatabaseError::NotFound(format!("Machine {id}")));
        }

        sqlx::query("DELETE FROM records WHERE machine_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM machines WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
