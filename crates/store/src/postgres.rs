use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use common::{
    CheckoutParameters, InventoryUnit, Money, Order, OrderId, OrderItem, OrderStatus, ProductId,
    UnitId, UnitState, UserId, VariantId,
};

use crate::{
    OrderQuery, Result, StoreError,
    store::{InventoryStore, OrderStore},
};

const ORDER_COLUMNS: &str = "id, human_readable_id, user_id, items, status, created_at, \
     reserved_until, total_cents, delivery_price_cents, checkout_parameters";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_unit(row: PgRow) -> Result<InventoryUnit> {
        let state: String = row.try_get("state")?;
        let state = match state.as_str() {
            "available" => UnitState::Available,
            "reserved" => UnitState::Reserved,
            other => {
                return Err(StoreError::InvalidRecord(format!(
                    "unknown unit state: {other}"
                )));
            }
        };

        Ok(InventoryUnit {
            id: UnitId::from_uuid(row.try_get::<Uuid, _>("id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            variant_id: VariantId::from_uuid(row.try_get::<Uuid, _>("variant_id")?),
            order_id: row
                .try_get::<Option<Uuid>, _>("order_id")?
                .map(OrderId::from_uuid),
            state,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let items_json: serde_json::Value = row.try_get("items")?;
        let items: Vec<OrderItem> = serde_json::from_value(items_json)?;
        let params_json: serde_json::Value = row.try_get("checkout_parameters")?;
        let checkout_parameters: CheckoutParameters = serde_json::from_value(params_json)?;
        let status: String = row.try_get("status")?;
        let status: OrderStatus = status
            .parse()
            .map_err(|e: common::UnknownStatus| StoreError::InvalidRecord(e.to_string()))?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            human_readable_id: row.try_get("human_readable_id")?,
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items,
            status,
            created_at: row.try_get("created_at")?,
            reserved_until: row.try_get("reserved_until")?,
            total: Money::from_cents(row.try_get("total_cents")?),
            delivery_price: row
                .try_get::<Option<i64>, _>("delivery_price_cents")?
                .map(Money::from_cents),
            checkout_parameters,
        })
    }

    fn rows_to_counts(rows: Vec<PgRow>) -> Result<HashMap<VariantId, u64>> {
        let mut counts = HashMap::new();
        for row in rows {
            let variant_id = VariantId::from_uuid(row.try_get::<Uuid, _>("variant_id")?);
            let available: i64 = row.try_get("available")?;
            counts.insert(variant_id, available as u64);
        }
        Ok(counts)
    }
}

fn unit_uuids(ids: &[UnitId]) -> Vec<Uuid> {
    ids.iter().map(UnitId::as_uuid).collect()
}

#[async_trait]
impl InventoryStore for PostgresStore {
    async fn insert_units(&self, units: Vec<InventoryUnit>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for unit in &units {
            sqlx::query(
                r#"
                INSERT INTO inventory_units (id, product_id, variant_id, order_id, state)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(unit.id.as_uuid())
            .bind(unit.product_id.as_uuid())
            .bind(unit.variant_id.as_uuid())
            .bind(unit.order_id.map(|id| id.as_uuid()))
            .bind(unit.state.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_available_ids(
        &self,
        variant_id: VariantId,
        limit: usize,
    ) -> Result<Vec<UnitId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM inventory_units WHERE variant_id = $1 AND state = 'available' LIMIT $2",
        )
        .bind(variant_id.as_uuid())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(UnitId::from_uuid).collect())
    }

    async fn reserve_if_available(&self, unit_ids: &[UnitId], order_id: OrderId) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_units
            SET state = 'reserved', order_id = $1
            WHERE id = ANY($2) AND state = 'available'
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(unit_uuids(unit_ids))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn release_by_order(&self, order_id: OrderId) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE inventory_units SET state = 'available', order_id = NULL WHERE order_id = $1",
        )
        .bind(order_id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_available_unit_ids(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<Vec<UnitId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM inventory_units
            WHERE product_id = $1 AND variant_id = $2 AND state = 'available'
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(variant_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(UnitId::from_uuid).collect())
    }

    async fn delete_available(&self, unit_ids: &[UnitId]) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM inventory_units WHERE id = ANY($1) AND state = 'available'")
                .bind(unit_uuids(unit_ids))
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn delete_available_for_product(&self, product_id: ProductId) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM inventory_units WHERE product_id = $1 AND state = 'available'",
        )
        .bind(product_id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_reserved_by_order(&self, order_id: OrderId) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM inventory_units WHERE order_id = $1 AND state = 'reserved'")
                .bind(order_id.as_uuid())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn count_available(&self, variant_ids: &[VariantId]) -> Result<HashMap<VariantId, u64>> {
        let uuids: Vec<Uuid> = variant_ids.iter().map(VariantId::as_uuid).collect();
        let rows = sqlx::query(
            r#"
            SELECT variant_id, COUNT(*) AS available
            FROM inventory_units
            WHERE state = 'available' AND variant_id = ANY($1)
            GROUP BY variant_id
            "#,
        )
        .bind(uuids)
        .fetch_all(&self.pool)
        .await?;

        Self::rows_to_counts(rows)
    }

    async fn count_all_available(&self) -> Result<HashMap<VariantId, u64>> {
        let rows = sqlx::query(
            r#"
            SELECT variant_id, COUNT(*) AS available
            FROM inventory_units
            WHERE state = 'available'
            GROUP BY variant_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Self::rows_to_counts(rows)
    }

    async fn units_for_order(&self, order_id: OrderId) -> Result<Vec<InventoryUnit>> {
        let rows = sqlx::query(
            "SELECT id, product_id, variant_id, order_id, state FROM inventory_units WHERE order_id = $1",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_unit).collect()
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: Order) -> Result<()> {
        let items_json = serde_json::to_value(&order.items)?;
        let params_json = serde_json::to_value(&order.checkout_parameters)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, human_readable_id, user_id, items, status, created_at,
                                reserved_until, total_cents, delivery_price_cents, checkout_parameters)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.human_readable_id)
        .bind(order.user_id.as_uuid())
        .bind(items_json)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.reserved_until)
        .bind(order.total.cents())
        .bind(order.delivery_price.map(|p| p.cents()))
        .bind(params_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn compare_and_set_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to.as_str())
            .bind(id.as_uuid())
            .bind(from.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_if_status(&self, id: OrderId, status: OrderStatus) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND status = $2")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_ids(&self, query: OrderQuery) -> Result<Vec<OrderId>> {
        let mut sql = String::from("SELECT id FROM orders WHERE 1=1");
        let mut param_count = 0;

        if query.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if query.user_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND user_id = ${param_count}"));
        }
        if query.created_before.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at < ${param_count}"));
        }
        if query.reserved_until_before.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND reserved_until < ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        let mut sqlx_query = sqlx::query_scalar::<_, Uuid>(&sql);

        if let Some(status) = query.status {
            sqlx_query = sqlx_query.bind(status.as_str());
        }
        if let Some(user_id) = query.user_id {
            sqlx_query = sqlx_query.bind(user_id.as_uuid());
        }
        if let Some(at) = query.created_before {
            sqlx_query = sqlx_query.bind(at);
        }
        if let Some(at) = query.reserved_until_before {
            sqlx_query = sqlx_query.bind(at);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }

        let ids = sqlx_query.fetch_all(&self.pool).await?;
        Ok(ids.into_iter().map(OrderId::from_uuid).collect())
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}
