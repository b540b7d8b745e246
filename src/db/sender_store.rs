use chrono::Utc;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::sender::{NewSender, Sender, SenderPatch},
    models::{merge_non_blank, merge_tri_state},
};

/// Registry of senders.
#[derive(Clone)]
pub struct SenderStore {
    pool: DbPool,
}

impl SenderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// List all senders, newest first.
    pub async fn list(&self) -> Result<Vec<Sender>> {
        let senders = sqlx::query_as::<_, Sender>("SELECT * FROM senders ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(senders)
    }

    /// Get a sender by ID
    pub async fn get(&self, id: i64) -> Result<Sender> {
        let sender = sqlx::query_as::<_, Sender>("SELECT * FROM senders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("sender not found".into()))?;

        Ok(sender)
    }

    /// Create a sender and return its id.
    pub async fn create(&self, new: NewSender) -> Result<i64> {
        let name = new.name.unwrap_or_default();
        if name.is_empty() {
            return Err(AppError::Validation("sender name cannot be blank".into()));
        }

        let result =
            sqlx::query("INSERT INTO senders (name, phone, address, created_at) VALUES (?, ?, ?, ?)")
                .bind(&name)
                .bind(new.phone.unwrap_or_default())
                .bind(new.address.unwrap_or_default())
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        Ok(result.last_insert_rowid())
    }

    /// Merge-on-update: each field falls back to its stored value when
    /// the patch leaves it out.
    pub async fn update(&self, id: i64, patch: SenderPatch) -> Result<()> {
        let existing = self.get(id).await?;

        let name = merge_non_blank(patch.name, existing.name);
        let phone = merge_tri_state(patch.phone, existing.phone);
        let address = merge_tri_state(patch.address, existing.address);

        sqlx::query("UPDATE senders SET name = ?, phone = ?, address = ? WHERE id = ?")
            .bind(name)
            .bind(phone)
            .bind(address)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a sender. Blocked while any shipment references it.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.get(id).await?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shipments WHERE sender_id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Err(AppError::Conflict(
                "sender has associated shipment records and cannot be deleted".into(),
            ));
        }

        sqlx::query("DELETE FROM senders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
