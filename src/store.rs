use crate::types::{Article, NormalizedItem, Result, Source, SourceKind, Tag};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

/// Storage layer over SQLite: source reads, the per-source dedup/insert
/// transaction, and the tag primitives the enrichment pass needs.
pub struct ArticleStore {
    db: Pool<Sqlite>,
}

impl ArticleStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.foreign_keys(true);
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(Self { db })
    }

    /// Single-connection in-memory database. A pool with more than one
    /// connection would hand out independent empty databases.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create all tables if they do not exist yet. Called once at startup.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sources (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                kind TEXT,
                endpoint TEXT,
                created_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                source_id INTEGER REFERENCES sources(id) ON DELETE SET NULL,
                published_at TIMESTAMP,
                created_at TIMESTAMP NOT NULL,
                summary TEXT
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_articles_source_url ON articles (source_id, url)",
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS article_tags (
                article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
                tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (article_id, tag_id)
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        debug!("Database schema initialized");
        Ok(())
    }

    /// Create a source row. Source CRUD belongs to the external API surface;
    /// this primitive exists for that surface and for the test suite.
    pub async fn add_source(
        &self,
        name: &str,
        kind: &SourceKind,
        endpoint: Option<&str>,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO sources (name, kind, endpoint, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(kind.as_str())
        .bind(endpoint)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        let id = result.last_insert_rowid();
        info!("Added source {} (id={}, kind={})", name, id, kind.as_str());
        Ok(id)
    }

    pub async fn get_source(&self, id: i64) -> Result<Option<Source>> {
        let row = sqlx::query("SELECT id, name, kind, endpoint, created_at FROM sources WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.map(row_to_source).transpose()
    }

    /// Every source eligible for automatic collection: feed or api-json kind
    /// with a non-blank endpoint.
    pub async fn list_collectable_sources(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, kind, endpoint, created_at FROM sources
            WHERE kind IN ('feed', 'api-json')
              AND endpoint IS NOT NULL
              AND TRIM(endpoint) != ''
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(row_to_source).collect()
    }

    /// Insert the items of one source batch that are not already stored,
    /// deciding novelty by `(source_id, url)`. The whole batch runs in a
    /// single transaction: any failure rolls everything back so a partially
    /// written source can never look like a success. Returns the rows that
    /// were actually inserted.
    pub async fn insert_new_articles(
        &self,
        source_id: i64,
        items: &[NormalizedItem],
    ) -> Result<Vec<Article>> {
        let mut tx = self.db.begin().await?;
        let mut inserted = Vec::new();

        for item in items {
            let existing =
                sqlx::query("SELECT id FROM articles WHERE source_id = ? AND url = ?")
                    .bind(source_id)
                    .bind(&item.url)
                    .fetch_optional(&mut *tx)
                    .await?;

            if existing.is_some() {
                debug!("Skipping known article: {}", item.url);
                continue;
            }

            let created_at = Utc::now();
            let result = sqlx::query(
                r#"
                INSERT INTO articles (title, url, source_id, published_at, created_at, summary)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.title)
            .bind(&item.url)
            .bind(source_id)
            .bind(item.published_at)
            .bind(created_at)
            .bind(&item.summary)
            .execute(&mut *tx)
            .await?;

            inserted.push(Article {
                id: result.last_insert_rowid(),
                title: item.title.clone(),
                url: item.url.clone(),
                source_id: Some(source_id),
                published_at: item.published_at,
                created_at,
                summary: item.summary.clone(),
            });
        }

        tx.commit().await?;

        info!(
            "Stored {} new articles out of {} candidates for source {}",
            inserted.len(),
            items.len(),
            source_id
        );
        Ok(inserted)
    }

    /// Insert a single article directly (the manual-entry path of the CRUD
    /// surface).
    pub async fn insert_article(
        &self,
        title: &str,
        url: &str,
        source_id: Option<i64>,
        published_at: Option<DateTime<Utc>>,
        summary: Option<&str>,
    ) -> Result<Article> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO articles (title, url, source_id, published_at, created_at, summary)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(title)
        .bind(url)
        .bind(source_id)
        .bind(published_at)
        .bind(created_at)
        .bind(summary)
        .execute(&self.db)
        .await?;

        Ok(Article {
            id: result.last_insert_rowid(),
            title: title.to_string(),
            url: url.to_string(),
            source_id,
            published_at,
            created_at,
            summary: summary.map(|s| s.to_string()),
        })
    }

    pub async fn list_articles(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            "SELECT id, title, url, source_id, published_at, created_at, summary \
             FROM articles ORDER BY id",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(row_to_article).collect()
    }

    pub async fn articles_for_source(&self, source_id: i64) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            "SELECT id, title, url, source_id, published_at, created_at, summary \
             FROM articles WHERE source_id = ? ORDER BY id",
        )
        .bind(source_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(row_to_article).collect()
    }

    /// Articles with no tag associations at all, the input of the batch
    /// enrichment sweep.
    pub async fn untagged_articles(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, url, source_id, published_at, created_at, summary
            FROM articles
            WHERE id NOT IN (SELECT article_id FROM article_tags)
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(row_to_article).collect()
    }

    /// Replace an article's tag set with the given keyword names, creating
    /// tags that do not exist yet. Lookup is by exact name; case folding of
    /// keyword candidates happens in the enrichment pass. One transaction, so
    /// the tag set is never observed half-replaced.
    pub async fn replace_article_tags(&self, article_id: i64, names: &[String]) -> Result<Vec<Tag>> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM article_tags WHERE article_id = ?")
            .bind(article_id)
            .execute(&mut *tx)
            .await?;

        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            let row = sqlx::query("SELECT id, name, created_at FROM tags WHERE name = ?")
                .bind(name)
                .fetch_optional(&mut *tx)
                .await?;

            let tag = match row {
                Some(row) => row_to_tag(row)?,
                None => {
                    let created_at = Utc::now();
                    let result = sqlx::query("INSERT INTO tags (name, created_at) VALUES (?, ?)")
                        .bind(name)
                        .bind(created_at)
                        .execute(&mut *tx)
                        .await?;
                    Tag {
                        id: result.last_insert_rowid(),
                        name: name.clone(),
                        created_at,
                    }
                }
            };

            sqlx::query("INSERT OR IGNORE INTO article_tags (article_id, tag_id) VALUES (?, ?)")
                .bind(article_id)
                .bind(tag.id)
                .execute(&mut *tx)
                .await?;

            tags.push(tag);
        }

        tx.commit().await?;
        Ok(tags)
    }

    pub async fn tags_for_article(&self, article_id: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.created_at FROM tags t
            JOIN article_tags at ON at.tag_id = t.id
            WHERE at.article_id = ?
            ORDER BY t.id
            "#,
        )
        .bind(article_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(row_to_tag).collect()
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM tags ORDER BY id")
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(row_to_tag).collect()
    }

    /// Direct access to the underlying pool for callers that need raw
    /// queries against the same database.
    pub fn db_pool(&self) -> &Pool<Sqlite> {
        &self.db
    }
}

fn row_to_source(row: SqliteRow) -> Result<Source> {
    let kind_raw: Option<String> = row.try_get("kind")?;
    Ok(Source {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        kind: SourceKind::parse(kind_raw.as_deref().unwrap_or("")),
        endpoint: row.try_get("endpoint")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_article(row: SqliteRow) -> Result<Article> {
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        url: row.try_get("url")?,
        source_id: row.try_get("source_id")?,
        published_at: row.try_get("published_at")?,
        created_at: row.try_get("created_at")?,
        summary: row.try_get("summary")?,
    })
}

fn row_to_tag(row: SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}
