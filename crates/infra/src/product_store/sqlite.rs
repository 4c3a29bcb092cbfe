//! SQLite-backed product store.
//!
//! Products live in `products`; bundle links live in `product_sources`, one row per
//! source with its position in the list. `AUTOINCREMENT` keeps SQLite from handing out
//! the id of a deleted row again.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};

use catalog_core::ProductId;
use catalog_products::{NewProduct, Product};

use super::r#trait::{ProductStore, StoreError};

const CREATE_PRODUCTS: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id    INTEGER PRIMARY KEY AUTOINCREMENT,
        name  TEXT    NOT NULL,
        price REAL    NOT NULL
    )
"#;

const CREATE_PRODUCT_SOURCES: &str = r#"
    CREATE TABLE IF NOT EXISTS product_sources (
        product_id INTEGER NOT NULL,
        position   INTEGER NOT NULL,
        source_id  INTEGER NOT NULL,
        PRIMARY KEY (product_id, position)
    )
"#;

/// SQLite product store.
///
/// `SqlitePool` is `Send + Sync` and cheap to clone, so the store can be shared behind
/// an `Arc` across request handlers.
#[derive(Debug, Clone)]
pub struct SqliteProductStore {
    pool: SqlitePool,
}

impl SqliteProductStore {
    /// Open (or create) the database at `url` and make sure the schema exists.
    ///
    /// In-memory databases are private to a connection, so they get a single
    /// connection that is never recycled.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the schema if needed.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_PRODUCTS).execute(&pool).await?;
        sqlx::query(CREATE_PRODUCT_SOURCES).execute(&pool).await?;
        tracing::debug!("sqlite product store ready");
        Ok(Self { pool })
    }

    async fn load_sources(
        conn: &mut SqliteConnection,
        id: ProductId,
    ) -> Result<Vec<ProductId>, StoreError> {
        let sources = sqlx::query_scalar::<_, i64>(
            "SELECT source_id FROM product_sources WHERE product_id = ?1 ORDER BY position",
        )
        .bind(id.get())
        .fetch_all(&mut *conn)
        .await?;

        Ok(sources.into_iter().map(ProductId::new).collect())
    }

    async fn write_sources(
        conn: &mut SqliteConnection,
        id: ProductId,
        sources: &[ProductId],
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM product_sources WHERE product_id = ?1")
            .bind(id.get())
            .execute(&mut *conn)
            .await?;

        for (position, source) in sources.iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StoreError::Corrupt(format!("source list of {id} is too long")))?;
            sqlx::query(
                "INSERT INTO product_sources (product_id, position, source_id) VALUES (?1, ?2, ?3)",
            )
            .bind(id.get())
            .bind(position)
            .bind(source.get())
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl ProductStore for SqliteProductStore {
    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("INSERT INTO products (name, price) VALUES (?1, ?2)")
            .bind(&product.name)
            .bind(product.price)
            .execute(&mut *tx)
            .await?;
        let id = ProductId::new(result.last_insert_rowid());

        Self::write_sources(&mut *tx, id, &product.sources).await?;
        tx.commit().await?;

        Ok(product.into_product(id))
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, (i64, String, f64)>(
            "SELECT id, name, price FROM products WHERE id = ?1",
        )
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await?;

        let Some((_, name, price)) = row else {
            return Ok(None);
        };

        let sources = Self::load_sources(&mut *conn, id).await?;
        Ok(Some(Product {
            id,
            name,
            price,
            sources,
        }))
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, (i64, String, f64)>(
            "SELECT id, name, price FROM products ORDER BY id",
        )
        .fetch_all(&mut *conn)
        .await?;

        // One pass over the link table instead of a query per product.
        let links = sqlx::query_as::<_, (i64, i64)>(
            "SELECT product_id, source_id FROM product_sources ORDER BY product_id, position",
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut sources: HashMap<i64, Vec<ProductId>> = HashMap::new();
        for (product_id, source_id) in links {
            sources
                .entry(product_id)
                .or_default()
                .push(ProductId::new(source_id));
        }

        Ok(rows
            .into_iter()
            .map(|(id, name, price)| Product {
                id: ProductId::new(id),
                name,
                price,
                sources: sources.remove(&id).unwrap_or_default(),
            })
            .collect())
    }

    async fn update(&self, product: Product) -> Result<Option<Product>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE products SET name = ?1, price = ?2 WHERE id = ?3")
            .bind(&product.name)
            .bind(product.price)
            .bind(product.id.get())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::write_sources(&mut *tx, product.id, &product.sources).await?;
        tx.commit().await?;

        Ok(Some(product))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Only this product's own links go; bundles pointing at it keep their rows.
        sqlx::query("DELETE FROM product_sources WHERE product_id = ?1")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, id: ProductId) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE id = ?1")
            .bind(id.get())
            .fetch_one(&self.pool)
            .await?;
        Ok(found > 0)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM product_sources")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM products").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}
