//! SQLite-backed local catalog.
//!
//! This is the only place reads are served from. Every write runs in a single
//! transaction and bumps the [`ChangeTracker`] only after commit, so a
//! subscription re-reads exactly once per visible change and never sees a
//! half-applied write.

use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::stream::BoxStream;
use reelsync_model::{ItemId, MediaItem, MediaItemSource, SourceId};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions,
    SqliteSynchronous,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::convert::{row_from_item, rows_from_source};
use crate::error::StoreError;

pub mod changes;
pub mod rows;

use changes::{ChangeTracker, Table};
use rows::{
    ITEM_COLUMNS, ItemRow, SOURCE_COLUMNS, STREAM_COLUMNS, SourceRow,
    SourceWithStreams, StreamRow,
};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Clone, Debug)]
pub struct LocalCatalogStore {
    pool: SqlitePool,
    changes: Arc<ChangeTracker>,
}

impl LocalCatalogStore {
    /// Opens (creating if needed) the database at `path` and runs migrations.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) =
            path.parent().filter(|p| !p.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StoreError::Directory)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        info!("Opened catalog store at {}", path.display());
        Self::with_pool(pool).await
    }

    /// Private in-memory database, mostly for tests.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true);
        // Every connection to :memory: is its own database; pin exactly one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        MIGRATOR.run(&pool).await?;
        Ok(Self {
            pool,
            changes: Arc::new(ChangeTracker::new()),
        })
    }

    // ----- Subscriptions -----

    /// Items of the list stored under `cache_key`, in stored order.
    pub fn observe_list(
        &self,
        cache_key: &str,
    ) -> BoxStream<'static, Vec<ItemRow>> {
        let cache_key = cache_key.to_string();
        self.observe(
            &[Table::ListMembership, Table::MediaItem],
            "list",
            move |pool| {
                let cache_key = cache_key.clone();
                async move { load_list(&pool, &cache_key).await }
            },
        )
    }

    pub fn observe_item(
        &self,
        id: &ItemId,
    ) -> BoxStream<'static, Option<ItemRow>> {
        let id = id.to_string();
        self.observe(&[Table::MediaItem], "item", move |pool| {
            let id = id.clone();
            async move { load_item(&pool, &id).await }
        })
    }

    /// Id of the item's primary source, `None` while it has no sources.
    pub fn observe_primary_source(
        &self,
        item_id: &ItemId,
    ) -> BoxStream<'static, Option<SourceId>> {
        let item_id = item_id.to_string();
        self.observe(
            &[Table::MediaItem, Table::MediaSource],
            "primary source",
            move |pool| {
                let item_id = item_id.clone();
                async move {
                    Ok(load_primary_source(&pool, &item_id)
                        .await?
                        .map(SourceId::from))
                }
            },
        )
    }

    /// A source and its streams, read as one snapshot.
    pub fn observe_streams(
        &self,
        source_id: &SourceId,
    ) -> BoxStream<'static, Option<SourceWithStreams>> {
        let source_id = source_id.to_string();
        self.observe(
            &[Table::MediaSource, Table::MediaStream],
            "streams",
            move |pool| {
                let source_id = source_id.clone();
                async move { load_source(&pool, &source_id).await }
            },
        )
    }

    /// Re-runs `load` after every commit touching `tables` and yields the
    /// result when it differs from the last one yielded.
    ///
    /// Read failures are logged and surface as `T::default()`.
    fn observe<T, F, Fut>(
        &self,
        tables: &[Table],
        what: &'static str,
        load: F,
    ) -> BoxStream<'static, T>
    where
        T: Clone + PartialEq + Default + Send + 'static,
        F: Fn(SqlitePool) -> Fut + Send + 'static,
        Fut: Future<Output = StoreResult<T>> + Send + 'static,
    {
        let pool = self.pool.clone();
        let mut listener = self.changes.listen(tables);

        Box::pin(stream! {
            let mut last: Option<T> = None;
            loop {
                listener.mark_seen();
                let value = match load(pool.clone()).await {
                    Ok(value) => value,
                    Err(err) => {
                        warn!(subscription = what, "Store read failed: {err}");
                        T::default()
                    }
                };

                if last.as_ref() != Some(&value) {
                    last = Some(value.clone());
                    yield value;
                }

                if !listener.changed().await {
                    break;
                }
            }
        })
    }

    // ----- Point reads -----

    pub async fn get_source_by_id(
        &self,
        id: &SourceId,
    ) -> Option<SourceWithStreams> {
        load_source(&self.pool, id.as_str())
            .await
            .unwrap_or_else(|err| {
                warn!(source = %id, "Store read failed: {err}");
                None
            })
    }

    /// Item ids stored under `cache_key`, in order.
    pub async fn list_membership(&self, cache_key: &str) -> Vec<ItemId> {
        sqlx::query_scalar::<_, String>(
            "SELECT item_id FROM list_membership \
             WHERE cache_key = ? ORDER BY position",
        )
        .bind(cache_key)
        .fetch_all(&self.pool)
        .await
        .map(|ids| ids.into_iter().map(ItemId::from).collect())
        .unwrap_or_else(|err| {
            warn!(cache_key, "Store read failed: {err}");
            Vec::new()
        })
    }

    /// Sources of an item in server order, without streams.
    pub async fn sources_for_item(&self, item_id: &ItemId) -> Vec<SourceRow> {
        sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SOURCE_COLUMNS} FROM media_source \
             WHERE item_id = ? ORDER BY position"
        ))
        .bind(item_id.as_str())
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|err| {
            warn!(item = %item_id, "Store read failed: {err}");
            Vec::new()
        })
    }

    // ----- Writes -----

    /// Replaces the membership of one list and upserts its items.
    pub async fn replace_media_list(
        &self,
        cache_key: &str,
        items: &[MediaItem],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        write_list(&mut tx, cache_key, items).await?;
        tx.commit().await?;

        self.changes.notify(&[Table::MediaItem, Table::ListMembership]);
        Ok(())
    }

    /// Replaces several lists in one transaction.
    pub async fn replace_media_lists(
        &self,
        lists: &[(String, Vec<MediaItem>)],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for (cache_key, items) in lists {
            write_list(&mut tx, cache_key, items).await?;
        }
        tx.commit().await?;

        self.changes.notify(&[Table::MediaItem, Table::ListMembership]);
        Ok(())
    }

    /// Upserts an item and replaces its sources and streams.
    ///
    /// The primary source survives when it is still among `sources`;
    /// otherwise the first source becomes primary.
    pub async fn update_item_details(
        &self,
        item: &MediaItem,
        sources: &[MediaItemSource],
    ) -> StoreResult<()> {
        let item_id = item.id.as_str();
        let mut tx = self.pool.begin().await?;

        upsert_item(&mut tx, &row_from_item(item)).await?;

        let previous: Option<String> = sqlx::query_scalar(
            "SELECT primary_source_id FROM media_item WHERE id = ?",
        )
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM media_source WHERE item_id = ?")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        for (position, source) in sources.iter().enumerate() {
            write_source(&mut tx, &rows_from_source(source, position as i64))
                .await?;
        }

        let primary = previous
            .filter(|id| sources.iter().any(|s| s.id.as_str() == id))
            .or_else(|| sources.first().map(|s| s.id.to_string()));
        sqlx::query("UPDATE media_item SET primary_source_id = ? WHERE id = ?")
            .bind(primary.as_deref())
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(item = item_id, sources = sources.len(), "Stored item details");

        self.changes.notify(&[
            Table::MediaItem,
            Table::MediaSource,
            Table::MediaStream,
        ]);
        Ok(())
    }

    /// Points the item at one of its own sources. Returns `false` when the
    /// source is unknown or belongs to another item.
    pub async fn set_primary_source(
        &self,
        item_id: &ItemId,
        source_id: &SourceId,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE media_item SET primary_source_id = ?1 \
             WHERE id = ?2 \
             AND EXISTS ( \
                 SELECT 1 FROM media_source WHERE id = ?1 AND item_id = ?2 \
             )",
        )
        .bind(source_id.as_str())
        .bind(item_id.as_str())
        .execute(&self.pool)
        .await?;

        let updated = result.rows_affected() > 0;
        if updated {
            self.changes.notify(&[Table::MediaItem]);
        }
        Ok(updated)
    }

    /// Drops every cached row.
    pub async fn clear(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for table in [
            "list_membership",
            "media_stream",
            "media_source",
            "media_item",
        ] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!("Cleared catalog store");
        self.changes.notify(&Table::ALL);
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn write_list(
    conn: &mut SqliteConnection,
    cache_key: &str,
    items: &[MediaItem],
) -> StoreResult<()> {
    for item in items {
        upsert_item(&mut *conn, &row_from_item(item)).await?;
    }

    sqlx::query("DELETE FROM list_membership WHERE cache_key = ?")
        .bind(cache_key)
        .execute(&mut *conn)
        .await?;
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO list_membership (cache_key, position, item_id) \
             VALUES (?, ?, ?)",
        )
        .bind(cache_key)
        .bind(position as i64)
        .bind(item.id.as_str())
        .execute(&mut *conn)
        .await?;
    }

    debug!(cache_key, items = items.len(), "Replaced list membership");
    Ok(())
}

/// Insert or update every column except `primary_source_id`.
async fn upsert_item(
    conn: &mut SqliteConnection,
    row: &ItemRow,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO media_item (
            id, name, item_type, parent_id,
            primary_image_item_id, primary_image_tag,
            backdrop_image_item_id, backdrop_image_tag,
            logo_image_item_id, logo_image_tag,
            thumb_image_item_id, thumb_image_tag,
            overview, tagline, community_rating, official_rating,
            production_year, run_time_ticks,
            played, favorite, progress
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            item_type = excluded.item_type,
            parent_id = excluded.parent_id,
            primary_image_item_id = excluded.primary_image_item_id,
            primary_image_tag = excluded.primary_image_tag,
            backdrop_image_item_id = excluded.backdrop_image_item_id,
            backdrop_image_tag = excluded.backdrop_image_tag,
            logo_image_item_id = excluded.logo_image_item_id,
            logo_image_tag = excluded.logo_image_tag,
            thumb_image_item_id = excluded.thumb_image_item_id,
            thumb_image_tag = excluded.thumb_image_tag,
            overview = excluded.overview,
            tagline = excluded.tagline,
            community_rating = excluded.community_rating,
            official_rating = excluded.official_rating,
            production_year = excluded.production_year,
            run_time_ticks = excluded.run_time_ticks,
            played = excluded.played,
            favorite = excluded.favorite,
            progress = excluded.progress
        "#,
    )
    .bind(&row.id)
    .bind(&row.name)
    .bind(&row.item_type)
    .bind(&row.parent_id)
    .bind(&row.primary_image_item_id)
    .bind(&row.primary_image_tag)
    .bind(&row.backdrop_image_item_id)
    .bind(&row.backdrop_image_tag)
    .bind(&row.logo_image_item_id)
    .bind(&row.logo_image_tag)
    .bind(&row.thumb_image_item_id)
    .bind(&row.thumb_image_tag)
    .bind(&row.overview)
    .bind(&row.tagline)
    .bind(row.community_rating)
    .bind(&row.official_rating)
    .bind(row.production_year)
    .bind(row.run_time_ticks)
    .bind(row.played)
    .bind(row.favorite)
    .bind(row.progress)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn write_source(
    conn: &mut SqliteConnection,
    rows: &SourceWithStreams,
) -> StoreResult<()> {
    let source = &rows.source;
    // A source id can move between items; take it over rather than fail.
    sqlx::query(
        r#"
        INSERT INTO media_source (
            id, item_id, position, name, container, size_bytes, bitrate,
            run_time_ticks
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            item_id = excluded.item_id,
            position = excluded.position,
            name = excluded.name,
            container = excluded.container,
            size_bytes = excluded.size_bytes,
            bitrate = excluded.bitrate,
            run_time_ticks = excluded.run_time_ticks
        "#,
    )
    .bind(&source.id)
    .bind(&source.item_id)
    .bind(source.position)
    .bind(&source.name)
    .bind(&source.container)
    .bind(source.size_bytes)
    .bind(source.bitrate)
    .bind(source.run_time_ticks)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM media_stream WHERE source_id = ?")
        .bind(&source.id)
        .execute(&mut *conn)
        .await?;

    for stream in &rows.streams {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO media_stream (
                source_id, stream_index, kind, codec, language, title,
                is_default, is_forced, is_external, width, height, channels
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&stream.source_id)
        .bind(stream.stream_index)
        .bind(&stream.kind)
        .bind(&stream.codec)
        .bind(&stream.language)
        .bind(&stream.title)
        .bind(stream.is_default)
        .bind(stream.is_forced)
        .bind(stream.is_external)
        .bind(stream.width)
        .bind(stream.height)
        .bind(stream.channels)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn load_list(
    pool: &SqlitePool,
    cache_key: &str,
) -> StoreResult<Vec<ItemRow>> {
    Ok(sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM list_membership m \
         JOIN media_item i ON i.id = m.item_id \
         WHERE m.cache_key = ? ORDER BY m.position"
    ))
    .bind(cache_key)
    .fetch_all(pool)
    .await?)
}

async fn load_item(
    pool: &SqlitePool,
    id: &str,
) -> StoreResult<Option<ItemRow>> {
    Ok(sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM media_item i WHERE i.id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

async fn load_primary_source(
    pool: &SqlitePool,
    item_id: &str,
) -> StoreResult<Option<String>> {
    Ok(sqlx::query_scalar::<_, String>(
        "SELECT s.id FROM media_item i \
         JOIN media_source s \
           ON s.id = i.primary_source_id AND s.item_id = i.id \
         WHERE i.id = ?",
    )
    .bind(item_id)
    .fetch_optional(pool)
    .await?)
}

async fn load_source(
    pool: &SqlitePool,
    source_id: &str,
) -> StoreResult<Option<SourceWithStreams>> {
    // Both reads share one transaction so they see the same snapshot.
    let mut tx = pool.begin().await?;

    let source = sqlx::query_as::<_, SourceRow>(&format!(
        "SELECT {SOURCE_COLUMNS} FROM media_source WHERE id = ?"
    ))
    .bind(source_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(source) = source else {
        tx.rollback().await?;
        return Ok(None);
    };

    let streams = sqlx::query_as::<_, StreamRow>(&format!(
        "SELECT {STREAM_COLUMNS} FROM media_stream \
         WHERE source_id = ? ORDER BY stream_index"
    ))
    .bind(source_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.rollback().await?;
    Ok(Some(SourceWithStreams { source, streams }))
}
