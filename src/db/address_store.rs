use chrono::Utc;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::address::{Address, AddressPatch, NewAddress},
    models::{merge_non_blank, merge_tri_state},
};

/// Registry of recipient addresses.
#[derive(Clone)]
pub struct AddressStore {
    pool: DbPool,
}

impl AddressStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// List all addresses, newest first.
    pub async fn list(&self) -> Result<Vec<Address>> {
        let addresses =
            sqlx::query_as::<_, Address>("SELECT * FROM addresses ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(addresses)
    }

    /// Get an address by ID
    pub async fn get(&self, id: i64) -> Result<Address> {
        let address = sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("address not found".into()))?;

        Ok(address)
    }

    /// Create an address and return its id.
    pub async fn create(&self, new: NewAddress) -> Result<i64> {
        let recipient_name = new.recipient_name.unwrap_or_default();
        let recipient_phone = new.recipient_phone.unwrap_or_default();
        let recipient_address = new.recipient_address.unwrap_or_default();
        if recipient_name.is_empty() || recipient_phone.is_empty() || recipient_address.is_empty() {
            return Err(AppError::Validation(
                "recipient name, phone and address cannot be blank".into(),
            ));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO addresses (recipient_name, contact_person, recipient_phone, recipient_address, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&recipient_name)
        .bind(new.contact_person.unwrap_or_default())
        .bind(&recipient_phone)
        .bind(&recipient_address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Merge-on-update: each field falls back to its stored value when
    /// the patch leaves it out. An explicit null clears the contact
    /// person; an omitted field keeps it.
    pub async fn update(&self, id: i64, patch: AddressPatch) -> Result<()> {
        let existing = self.get(id).await?;

        let recipient_name = merge_non_blank(patch.recipient_name, existing.recipient_name);
        let contact_person = merge_tri_state(patch.contact_person, existing.contact_person);
        let recipient_phone = merge_non_blank(patch.recipient_phone, existing.recipient_phone);
        let recipient_address =
            merge_non_blank(patch.recipient_address, existing.recipient_address);

        sqlx::query(
            r#"
            UPDATE addresses
            SET recipient_name = ?, contact_person = ?, recipient_phone = ?, recipient_address = ?
            WHERE id = ?
            "#,
        )
        .bind(recipient_name)
        .bind(contact_person)
        .bind(recipient_phone)
        .bind(recipient_address)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete an address. Blocked while any shipment references it.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.get(id).await?;

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM shipments WHERE address_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if count > 0 {
            return Err(AppError::Conflict(
                "address has associated shipment records and cannot be deleted".into(),
            ));
        }

        sqlx::query("DELETE FROM addresses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
