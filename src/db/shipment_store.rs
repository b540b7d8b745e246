use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite};

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::merge_tri_state,
    models::shipment::{
        CarrierMonthSummary, MonthlySummary, NewShipment, Shipment, ShipmentDetails,
        ShipmentFilter, ShipmentPatch, ShipmentSummary, SummaryTotals, DEFAULT_STATUS,
    },
};

const DETAIL_SELECT: &str = r#"
    SELECT
        s.*,
        c.name AS carrier_name,
        se.name AS sender_name,
        a.recipient_name,
        a.recipient_phone,
        a.recipient_address
    FROM shipments s
    LEFT JOIN carriers c ON s.carrier_id = c.id
    LEFT JOIN senders se ON s.sender_id = se.id
    LEFT JOIN addresses a ON s.address_id = a.id
"#;

/// The shipment ledger: authoritative record set plus the filtered
/// listing and aggregation queries over it.
#[derive(Clone)]
pub struct ShipmentStore {
    pool: DbPool,
}

impl ShipmentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a shipment by ID
    pub async fn get(&self, id: i64) -> Result<Shipment> {
        let shipment = sqlx::query_as::<_, Shipment>("SELECT * FROM shipments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("shipment record not found".into()))?;

        Ok(shipment)
    }

    /// Get a shipment joined with its carrier, sender and recipient
    /// display fields.
    pub async fn get_with_details(&self, id: i64) -> Result<ShipmentDetails> {
        let query = format!("{DETAIL_SELECT} WHERE s.id = ?");
        let shipment = sqlx::query_as::<_, ShipmentDetails>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("shipment record not found".into()))?;

        Ok(shipment)
    }

    /// Create a shipment and return its id.
    ///
    /// Tracking number, the three registry references and the shipping
    /// date are required; weight and amount were already coerced to
    /// numeric-or-zero during deserialization.
    pub async fn create(&self, new: NewShipment) -> Result<i64> {
        let tracking_number = new.tracking_number.unwrap_or_default();
        let shipping_date_raw = new.shipping_date.unwrap_or_default();

        let (Some(carrier_id), Some(sender_id), Some(address_id)) =
            (new.carrier_id, new.sender_id, new.address_id)
        else {
            return Err(AppError::Validation(REQUIRED_FIELDS_MESSAGE.into()));
        };
        if tracking_number.is_empty() || shipping_date_raw.is_empty() {
            return Err(AppError::Validation(REQUIRED_FIELDS_MESSAGE.into()));
        }

        let shipping_date = parse_shipping_date(&shipping_date_raw)?;
        self.assert_references(carrier_id, sender_id, address_id)
            .await?;

        let duplicate: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM shipments WHERE tracking_number = ?")
                .bind(&tracking_number)
                .fetch_optional(&self.pool)
                .await?;
        if duplicate.is_some() {
            return Err(AppError::Conflict(
                "this tracking number already exists".into(),
            ));
        }

        let status = new
            .status
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STATUS.to_string());

        let result = sqlx::query(
            r#"
            INSERT INTO shipments (
                tracking_number, carrier_id, sender_id, address_id,
                weight, amount, status, shipping_date, notes, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tracking_number)
        .bind(carrier_id)
        .bind(sender_id)
        .bind(address_id)
        .bind(new.weight)
        .bind(new.amount)
        .bind(status)
        .bind(shipping_date)
        .bind(new.notes.unwrap_or_default())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Merge-on-update. A changed tracking number is re-checked for
    /// uniqueness excluding this record; weight and amount keep their
    /// stored value only when the patch left them out entirely.
    pub async fn update(&self, id: i64, patch: ShipmentPatch) -> Result<()> {
        let existing = self.get(id).await?;

        let tracking_number = match patch.tracking_number {
            Some(t) if !t.is_empty() => t,
            _ => existing.tracking_number.clone(),
        };
        if tracking_number != existing.tracking_number {
            let duplicate: Option<(i64,)> =
                sqlx::query_as("SELECT id FROM shipments WHERE tracking_number = ? AND id != ?")
                    .bind(&tracking_number)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
            if duplicate.is_some() {
                return Err(AppError::Conflict(
                    "this tracking number is already used by another record".into(),
                ));
            }
        }

        let carrier_id = patch.carrier_id.unwrap_or(existing.carrier_id);
        let sender_id = patch.sender_id.unwrap_or(existing.sender_id);
        let address_id = patch.address_id.unwrap_or(existing.address_id);
        self.assert_references(carrier_id, sender_id, address_id)
            .await?;

        let weight = patch.weight.unwrap_or(existing.weight);
        let amount = patch.amount.unwrap_or(existing.amount);
        let shipping_date = match patch.shipping_date {
            Some(d) if !d.is_empty() => parse_shipping_date(&d)?,
            _ => existing.shipping_date,
        };
        let status = match patch.status {
            Some(s) if !s.is_empty() => s,
            _ => existing.status,
        };
        let notes = merge_tri_state(patch.notes, existing.notes);

        sqlx::query(
            r#"
            UPDATE shipments
            SET tracking_number = ?,
                carrier_id = ?,
                sender_id = ?,
                address_id = ?,
                weight = ?,
                amount = ?,
                status = ?,
                shipping_date = ?,
                notes = ?
            WHERE id = ?
            "#,
        )
        .bind(tracking_number)
        .bind(carrier_id)
        .bind(sender_id)
        .bind(address_id)
        .bind(weight)
        .bind(amount)
        .bind(status)
        .bind(shipping_date)
        .bind(notes)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Hard delete. Nothing references a shipment, so no guard.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.get(id).await?;

        sqlx::query("DELETE FROM shipments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Filtered listing. Filters are AND-composed; results are ordered
    /// by shipping date, then creation time, newest first.
    pub async fn list(&self, filter: &ShipmentFilter) -> Result<Vec<ShipmentDetails>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(DETAIL_SELECT);
        qb.push(" WHERE 1=1");

        if let Some(month) = filter.month_filter() {
            qb.push(" AND strftime('%Y-%m', s.shipping_date) = ")
                .push_bind(month);
        }
        if let Some(carrier_id) = filter.carrier_filter() {
            qb.push(" AND s.carrier_id = ").push_bind(carrier_id);
        }
        if let Some(status) = filter.status_filter() {
            qb.push(" AND s.status = ").push_bind(status);
        }
        if let Some(search) = filter.search_filter() {
            let pattern = format!("%{search}%");
            qb.push(" AND (s.tracking_number LIKE ")
                .push_bind(pattern.clone());
            qb.push(" OR s.notes LIKE ").push_bind(pattern);
            qb.push(")");
        }

        qb.push(" ORDER BY s.shipping_date DESC, s.created_at DESC");

        let shipments = qb
            .build_query_as::<ShipmentDetails>()
            .fetch_all(&self.pool)
            .await?;

        Ok(shipments)
    }

    /// Grouped summary: one row per (carrier, month), ordered by month
    /// then amount, both descending. The overall totals are derived
    /// from the emitted groups rather than queried separately, so they
    /// always agree with the details exactly.
    pub async fn summary(
        &self,
        month: Option<&str>,
        carrier_id: Option<i64>,
    ) -> Result<ShipmentSummary> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT
                c.id AS carrier_id,
                c.name AS carrier_name,
                strftime('%Y-%m', s.shipping_date) AS month,
                COUNT(*) AS total_count,
                CAST(COALESCE(SUM(s.amount), 0) AS REAL) AS total_amount,
                CAST(COALESCE(SUM(s.weight), 0) AS REAL) AS total_weight
            FROM shipments s
            JOIN carriers c ON s.carrier_id = c.id
            WHERE 1=1
            "#,
        );

        if let Some(month) = month {
            qb.push(" AND strftime('%Y-%m', s.shipping_date) = ")
                .push_bind(month);
        }
        if let Some(carrier_id) = carrier_id {
            qb.push(" AND s.carrier_id = ").push_bind(carrier_id);
        }

        qb.push(
            " GROUP BY c.id, strftime('%Y-%m', s.shipping_date) ORDER BY month DESC, total_amount DESC",
        );

        let details = qb
            .build_query_as::<CarrierMonthSummary>()
            .fetch_all(&self.pool)
            .await?;

        let totals = SummaryTotals {
            total_count: details.iter().map(|d| d.total_count).sum(),
            total_amount: details.iter().map(|d| d.total_amount).sum(),
            total_weight: details.iter().map(|d| d.total_weight).sum(),
        };

        Ok(ShipmentSummary { details, totals })
    }

    /// Per-month counts and amounts across all carriers, newest month
    /// first.
    pub async fn monthly(&self) -> Result<Vec<MonthlySummary>> {
        let monthly = sqlx::query_as::<_, MonthlySummary>(
            r#"
            SELECT
                strftime('%Y-%m', s.shipping_date) AS month,
                COUNT(*) AS total_count,
                CAST(COALESCE(SUM(s.amount), 0) AS REAL) AS total_amount
            FROM shipments s
            GROUP BY strftime('%Y-%m', s.shipping_date)
            ORDER BY month DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(monthly)
    }

    /// Each registry reference must point at an existing row, both at
    /// creation and at update time.
    async fn assert_references(
        &self,
        carrier_id: i64,
        sender_id: i64,
        address_id: i64,
    ) -> Result<()> {
        for (table, id, label) in [
            ("carriers", carrier_id, "carrier"),
            ("senders", sender_id, "sender"),
            ("addresses", address_id, "address"),
        ] {
            let query = format!("SELECT COUNT(*) FROM {table} WHERE id = ?");
            let (count,): (i64,) = sqlx::query_as(&query)
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
            if count == 0 {
                return Err(AppError::Conflict(format!(
                    "referenced {label} does not exist"
                )));
            }
        }

        Ok(())
    }
}

const REQUIRED_FIELDS_MESSAGE: &str =
    "tracking number, carrier, sender, address and shipping date are all required";

fn parse_shipping_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("shipping date must be a YYYY-MM-DD calendar date".into()))
}
