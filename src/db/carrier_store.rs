use chrono::Utc;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::carrier::{Carrier, CarrierPatch, NewCarrier},
    models::{merge_non_blank, merge_tri_state},
};

/// Registry of carrier companies.
#[derive(Clone)]
pub struct CarrierStore {
    pool: DbPool,
}

impl CarrierStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// List all carriers, newest first.
    pub async fn list(&self) -> Result<Vec<Carrier>> {
        let carriers =
            sqlx::query_as::<_, Carrier>("SELECT * FROM carriers ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(carriers)
    }

    /// Get a carrier by ID
    pub async fn get(&self, id: i64) -> Result<Carrier> {
        let carrier = sqlx::query_as::<_, Carrier>("SELECT * FROM carriers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("carrier not found".into()))?;

        Ok(carrier)
    }

    /// Create a carrier and return its id.
    pub async fn create(&self, new: NewCarrier) -> Result<i64> {
        let name = new.name.unwrap_or_default();
        if name.is_empty() {
            return Err(AppError::Validation("carrier name cannot be blank".into()));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO carriers (name, contact_person, phone, address, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&name)
        .bind(new.contact_person.unwrap_or_default())
        .bind(new.phone.unwrap_or_default())
        .bind(new.address.unwrap_or_default())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Merge-on-update: each field falls back to its stored value when
    /// the patch leaves it out.
    pub async fn update(&self, id: i64, patch: CarrierPatch) -> Result<()> {
        let existing = self.get(id).await?;

        let name = merge_non_blank(patch.name, existing.name);
        let contact_person = merge_tri_state(patch.contact_person, existing.contact_person);
        let phone = merge_tri_state(patch.phone, existing.phone);
        let address = merge_tri_state(patch.address, existing.address);

        sqlx::query(
            "UPDATE carriers SET name = ?, contact_person = ?, phone = ?, address = ? WHERE id = ?",
        )
        .bind(name)
        .bind(contact_person)
        .bind(phone)
        .bind(address)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a carrier. Blocked while any shipment references it.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.get(id).await?;

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM shipments WHERE carrier_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if count > 0 {
            return Err(AppError::Conflict(
                "carrier has associated shipment records and cannot be deleted".into(),
            ));
        }

        sqlx::query("DELETE FROM carriers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
