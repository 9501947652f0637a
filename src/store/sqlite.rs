//! SQLite-backed category store.
//!
//! Layout: one `categories` row per category (with its example count), one
//! `tokens` row per (category, token) pair holding the frequency and one
//! `vocabulary` row per vocabulary token. Tokens are stored as their JSON
//! encoding, so any [`Token`] type round-trips.
//! Total token counts are never stored; they are summed from `tokens`.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::Result;
use crate::store::{CategoryRecord, CategoryStore, CategorySummary};
use crate::token::Token;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        examples INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS tokens (
        id INTEGER PRIMARY KEY,
        phrase TEXT NOT NULL,
        frequency INTEGER NOT NULL,
        category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
        UNIQUE (category_id, phrase)
    );
    CREATE INDEX IF NOT EXISTS idx_tokens_phrase ON tokens(phrase);
    CREATE TABLE IF NOT EXISTS vocabulary (
        phrase TEXT PRIMARY KEY
    );
";

/// Configuration for the SQLite store.
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Database file; `None` opens a private in-memory database.
    pub path: Option<PathBuf>,

    /// Switch file databases to WAL journaling.
    pub wal: bool,
}

impl SqliteStoreConfig {
    /// Create a config for a database file.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SqliteStoreConfig {
            path: Some(path.as_ref().to_path_buf()),
            wal: true,
        }
    }

    /// Create a config for an in-memory database.
    pub fn in_memory() -> Self {
        SqliteStoreConfig {
            path: None,
            wal: false,
        }
    }
}

/// Category store persisted in SQLite.
#[derive(Debug)]
pub struct SqliteStore<T: Token> {
    conn: Connection,
    _token: PhantomData<fn() -> T>,
}

impl<T: Token> SqliteStore<T> {
    /// Open (or create) a store.
    pub fn open(config: SqliteStoreConfig) -> Result<Self> {
        let conn = match &config.path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        apply_pragmas(&conn, config.wal && config.path.is_some())?;
        conn.execute_batch(SCHEMA)?;

        match &config.path {
            Some(path) => info!(path = %path.display(), "opened sqlite category store"),
            None => info!("opened in-memory sqlite category store"),
        }

        Ok(SqliteStore {
            conn,
            _token: PhantomData,
        })
    }

    fn encode(token: &T) -> Result<String> {
        Ok(serde_json::to_string(token)?)
    }

    fn decode(phrase: &str) -> Result<T> {
        Ok(serde_json::from_str(phrase)?)
    }
}

/// Apply connection pragmas. Foreign keys are required for cascading deletes.
fn apply_pragmas(conn: &Connection, wal: bool) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )?;
    if wal {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    }
    Ok(())
}

/// Delete a category once it holds no token rows.
fn delete_if_empty(conn: &Connection, category_id: i64) -> Result<()> {
    conn.execute(
        "DELETE FROM categories WHERE id = ?1
         AND NOT EXISTS (SELECT 1 FROM tokens WHERE category_id = ?1)",
        params![category_id],
    )?;
    Ok(())
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

impl<T: Token> CategoryStore<T> for SqliteStore<T> {
    fn categories(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM categories ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    fn has_category(&self, category: &str) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM categories WHERE name = ?1)",
            params![category],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    fn summary(&self, category: &str) -> Result<Option<CategorySummary>> {
        let summary = self
            .conn
            .query_row(
                "SELECT c.examples,
                        (SELECT COALESCE(SUM(t.frequency), 0) FROM tokens t WHERE t.category_id = c.id)
                 FROM categories c WHERE c.name = ?1",
                params![category],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        Ok(summary.map(|(examples, total_tokens)| CategorySummary {
            examples: to_count(examples),
            total_tokens: to_count(total_tokens),
        }))
    }

    fn increment_examples(&mut self, category: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO categories (name, examples) VALUES (?1, 1)
             ON CONFLICT (name) DO UPDATE SET examples = examples + 1",
            params![category],
        )?;
        Ok(())
    }

    fn decrement_examples(&mut self, category: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE categories SET examples = examples - 1 WHERE name = ?1",
            params![category],
        )?;
        let deleted = tx.execute(
            "DELETE FROM categories WHERE name = ?1 AND examples < 1",
            params![category],
        )?;
        tx.commit()?;
        if deleted > 0 {
            debug!(category, "deleted category without examples");
        }
        Ok(())
    }

    fn add_token(&mut self, category: &str, token: &T) -> Result<()> {
        let phrase = Self::encode(token)?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO categories (name, examples) VALUES (?1, 0)",
            params![category],
        )?;
        tx.execute(
            "INSERT INTO tokens (phrase, frequency, category_id)
             VALUES (?2, 1, (SELECT id FROM categories WHERE name = ?1))
             ON CONFLICT (category_id, phrase) DO UPDATE SET frequency = frequency + 1",
            params![category, phrase],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn remove_token(&mut self, category: &str, token: &T) -> Result<()> {
        let phrase = Self::encode(token)?;
        let tx = self.conn.transaction()?;
        let row = tx
            .query_row(
                "SELECT t.id, t.category_id FROM tokens t
                 JOIN categories c ON c.id = t.category_id
                 WHERE c.name = ?1 AND t.phrase = ?2",
                params![category, phrase],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        let Some((token_id, category_id)) = row else {
            return Ok(());
        };

        tx.execute(
            "UPDATE tokens SET frequency = frequency - 1 WHERE id = ?1",
            params![token_id],
        )?;
        tx.execute(
            "DELETE FROM tokens WHERE id = ?1 AND frequency < 1",
            params![token_id],
        )?;
        delete_if_empty(&tx, category_id)?;
        tx.commit()?;
        Ok(())
    }

    fn token_trained(&self, token: &T, category: &str) -> Result<bool> {
        let phrase = Self::encode(token)?;
        let trained = self.conn.query_row(
            "SELECT EXISTS (
                SELECT 1 FROM tokens t JOIN categories c ON c.id = t.category_id
                WHERE c.name = ?1 AND t.phrase = ?2
             )",
            params![category, phrase],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(trained)
    }

    fn count_of(&self, category: &str, token: &T) -> Result<u64> {
        let phrase = Self::encode(token)?;
        let frequency = self
            .conn
            .query_row(
                "SELECT t.frequency FROM tokens t JOIN categories c ON c.id = t.category_id
                 WHERE c.name = ?1 AND t.phrase = ?2",
                params![category, phrase],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(frequency.map_or(0, to_count))
    }

    fn purge_less_than(&mut self, token: &T, threshold: u64) -> Result<bool> {
        let phrase = Self::encode(token)?;
        let tx = self.conn.transaction()?;
        let total: i64 = tx.query_row(
            "SELECT COALESCE(SUM(frequency), 0) FROM tokens WHERE phrase = ?1",
            params![phrase],
            |row| row.get(0),
        )?;
        if to_count(total) >= threshold {
            return Ok(false);
        }

        let category_ids = {
            let mut stmt = tx.prepare("SELECT category_id FROM tokens WHERE phrase = ?1")?;
            stmt.query_map(params![phrase], |row| row.get::<_, i64>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.execute("DELETE FROM tokens WHERE phrase = ?1", params![phrase])?;
        for category_id in category_ids {
            delete_if_empty(&tx, category_id)?;
        }
        tx.commit()?;
        Ok(true)
    }

    fn delete_category(&mut self, category: &str) -> Result<Vec<String>> {
        self.conn
            .execute("DELETE FROM categories WHERE name = ?1", params![category])?;
        self.categories()
    }

    fn total_examples(&self) -> Result<u64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(examples), 0) FROM categories",
            [],
            |row| row.get(0),
        )?;
        Ok(to_count(total))
    }

    fn tokens(&self) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare("SELECT DISTINCT phrase FROM tokens")?;
        let phrases = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        phrases.iter().map(|phrase| Self::decode(phrase)).collect()
    }

    fn records(&self) -> Result<BTreeMap<String, CategoryRecord<T>>> {
        let mut categories = self
            .conn
            .prepare("SELECT id, name, examples FROM categories ORDER BY name")?;
        let rows = categories
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut tokens = self
            .conn
            .prepare("SELECT phrase, frequency FROM tokens WHERE category_id = ?1")?;
        let mut records = BTreeMap::new();
        for (category_id, name, examples) in rows {
            let mut record = CategoryRecord::new();
            record.examples = to_count(examples);

            let frequencies = tokens
                .query_map(params![category_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for (phrase, frequency) in frequencies {
                let frequency = to_count(frequency);
                record.tokens.insert(Self::decode(&phrase)?, frequency);
                record.total_tokens += frequency;
            }
            records.insert(name, record);
        }
        Ok(records)
    }

    fn vocabulary(&self) -> Result<Option<Vec<T>>> {
        let mut stmt = self.conn.prepare("SELECT phrase FROM vocabulary")?;
        let phrases = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let tokens = phrases
            .iter()
            .map(|phrase| Self::decode(phrase))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(tokens))
    }

    fn add_vocabulary(&mut self, token: &T) -> Result<()> {
        let phrase = Self::encode(token)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO vocabulary (phrase) VALUES (?1)",
            params![phrase],
        )?;
        Ok(())
    }

    fn remove_vocabulary(&mut self, token: &T) -> Result<()> {
        let phrase = Self::encode(token)?;
        self.conn
            .execute("DELETE FROM vocabulary WHERE phrase = ?1", params![phrase])?;
        Ok(())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
