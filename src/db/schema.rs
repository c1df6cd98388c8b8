//! Embedded schema migrations for mediabroker.
//!
//! Each entry is one migration batch, applied in order and recorded in the
//! `schema_version` table.

/// All schema migrations, oldest first.
pub const MIGRATIONS: &[&str] = &[
    // v1: users, token ledger, file metadata
    "CREATE TABLE users (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        email           TEXT NOT NULL UNIQUE,
        plan            TEXT NOT NULL DEFAULT 'free',
        storage_limit   INTEGER NOT NULL,
        storage_used    INTEGER NOT NULL DEFAULT 0,
        created_at      TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX idx_users_email ON users(email);

    CREATE TABLE file_tokens (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        token           TEXT NOT NULL UNIQUE,
        file_path       TEXT NOT NULL,
        user_email      TEXT NOT NULL,
        file_size       INTEGER NOT NULL,
        created_at      TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX idx_file_tokens_owner ON file_tokens(user_email);
    CREATE INDEX idx_file_tokens_location ON file_tokens(file_path, user_email);

    CREATE TABLE file_meta (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        token           TEXT NOT NULL UNIQUE,
        size            INTEGER NOT NULL DEFAULT 0,
        privacy         TEXT NOT NULL DEFAULT 'public',
        views           INTEGER NOT NULL DEFAULT 0,
        created_at      TEXT NOT NULL DEFAULT (datetime('now'))
    );",
    // v2: payments mirror. The table schema is owned by the payment gateway
    // integration; this copy exists so local and test databases have the
    // shape the read-only plan-upgrade query expects.
    "CREATE TABLE IF NOT EXISTS payments (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        email           TEXT NOT NULL,
        product         TEXT NOT NULL,
        created_at      TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_payments_email ON payments(email);",
];
