use sqlx::sqlite::SqliteRow;
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};
use std::sync::Arc;

use shared::{Category, StoreSnapshot, Transaction, TransactionType};

/// Categories inserted on first run, when the categories table is empty.
const DEFAULT_CATEGORIES: &[(&str, &str, &str, &str, &str)] = &[
    ("1", "Salary", "income", "#10b981", "wallet"),
    ("2", "Freelance", "income", "#06b6d4", "laptop"),
    ("3", "Investments", "income", "#8b5cf6", "trending-up"),
    ("4", "Other Income", "income", "#f59e0b", "gift"),
    ("5", "Food & Dining", "expense", "#ef4444", "utensils"),
    ("6", "Transportation", "expense", "#f97316", "car"),
    ("7", "Shopping", "expense", "#ec4899", "shopping-bag"),
    ("8", "Bills & Utilities", "expense", "#6366f1", "file-text"),
    ("9", "Entertainment", "expense", "#14b8a6", "film"),
    ("10", "Healthcare", "expense", "#f43f5e", "heart-pulse"),
    ("11", "Education", "expense", "#3b82f6", "book-open"),
    ("12", "Other Expense", "expense", "#71717a", "package"),
];

/// Database manages all SQLite operations for transactions and categories.
#[derive(Clone)]
pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    /// Connect to the database at `url`, creating it and its schema if
    /// needed, and seed the default categories on first run.
    pub async fn new(url: &str) -> Result<Self, sqlx::Error> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?;
        }

        let pool = SqlitePool::connect(url).await?;
        Self::setup_schema(&pool).await?;

        let db = Self {
            pool: Arc::new(pool),
        };
        db.seed_default_categories().await?;
        Ok(db)
    }

    /// Open a uniquely named in-memory database for tests.
    #[cfg(test)]
    pub async fn init_test() -> Result<Self, sqlx::Error> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);
        Self::new(&db_url).await
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL CHECK(type IN ('income', 'expense')),
                amount REAL NOT NULL CHECK(amount > 0),
                category TEXT NOT NULL,
                description TEXT,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                type TEXT NOT NULL CHECK(type IN ('income', 'expense')),
                color TEXT NOT NULL,
                icon TEXT DEFAULT 'circle'
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date DESC)")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_type ON transactions(type)")
            .execute(pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn seed_default_categories(&self) -> Result<(), sqlx::Error> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM categories")
            .fetch_one(&*self.pool)
            .await?
            .get("count");
        if count > 0 {
            return Ok(());
        }

        for (id, name, kind, color, icon) in DEFAULT_CATEGORIES {
            sqlx::query("INSERT INTO categories (id, name, type, color, icon) VALUES (?, ?, ?, ?, ?)")
                .bind(id)
                .bind(name)
                .bind(kind)
                .bind(color)
                .bind(icon)
                .execute(&*self.pool)
                .await?;
        }
        Ok(())
    }

    /// All transactions, newest date first; ties broken by creation time.
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, type, amount, category, description, date, created_at \
             FROM transactions ORDER BY date DESC, created_at DESC",
        )
        .fetch_all(&*self.pool)
        .await?;
        rows.iter().map(transaction_from_row).collect()
    }

    pub async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, type, amount, category, description, date, created_at \
             FROM transactions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    pub async fn insert_transaction(&self, transaction: &Transaction) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO transactions (id, type, amount, category, description, date, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&transaction.id)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.amount)
        .bind(&transaction.category)
        .bind(&transaction.description)
        .bind(&transaction.date)
        .bind(&transaction.created_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    /// Overwrite the mutable fields of an existing transaction. Returns
    /// false when no row has the given id.
    pub async fn update_transaction(&self, transaction: &Transaction) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE transactions SET type = ?, amount = ?, category = ?, description = ?, date = ? \
             WHERE id = ?",
        )
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.amount)
        .bind(&transaction.category)
        .bind(&transaction.description)
        .bind(&transaction.date)
        .bind(&transaction.id)
        .execute(&*self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All categories, grouped by type and sorted by name.
    pub async fn list_categories(&self) -> Result<Vec<Category>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, name, type, color, icon FROM categories ORDER BY type, name",
        )
        .fetch_all(&*self.pool)
        .await?;
        rows.iter().map(category_from_row).collect()
    }

    pub async fn insert_category(&self, category: &Category) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO categories (id, name, type, color, icon) VALUES (?, ?, ?, ?, ?)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(category.transaction_type.as_str())
            .bind(&category.color)
            .bind(&category.icon)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    /// Replace the whole store in one SQL transaction. Any failure rolls
    /// everything back, so partial imports never persist.
    pub async fn replace_all(&self, snapshot: &StoreSnapshot) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM transactions")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM categories")
            .execute(&mut *tx)
            .await?;

        for t in &snapshot.transactions {
            sqlx::query(
                "INSERT INTO transactions (id, type, amount, category, description, date, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&t.id)
            .bind(t.transaction_type.as_str())
            .bind(t.amount)
            .bind(&t.category)
            .bind(&t.description)
            .bind(&t.date)
            .bind(&t.created_at)
            .execute(&mut *tx)
            .await?;
        }
        for c in &snapshot.categories {
            sqlx::query("INSERT INTO categories (id, name, type, color, icon) VALUES (?, ?, ?, ?, ?)")
                .bind(&c.id)
                .bind(&c.name)
                .bind(c.transaction_type.as_str())
                .bind(&c.color)
                .bind(&c.icon)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await
    }
}

fn parse_type(value: &str) -> Result<TransactionType, sqlx::Error> {
    TransactionType::parse(value)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown transaction type: {value}").into()))
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction, sqlx::Error> {
    let kind: String = row.get("type");
    Ok(Transaction {
        id: row.get("id"),
        transaction_type: parse_type(&kind)?,
        amount: row.get("amount"),
        category: row.get("category"),
        // description is nullable in the schema
        description: row.get::<Option<String>, _>("description").unwrap_or_default(),
        date: row.get("date"),
        created_at: row.get("created_at"),
    })
}

fn category_from_row(row: &SqliteRow) -> Result<Category, sqlx::Error> {
    let kind: String = row.get("type");
    Ok(Category {
        id: row.get("id"),
        name: row.get("name"),
        transaction_type: parse_type(&kind)?,
        color: row.get("color"),
        icon: row.get::<Option<String>, _>("icon").unwrap_or_else(|| "circle".to_string()),
    })
}
