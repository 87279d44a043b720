//! SQL schema for the refsync SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per record version. Rows are never deleted; the only permitted
-- update is active 1 -> 0.
CREATE TABLE IF NOT EXISTS records (
    record_id    TEXT PRIMARY KEY,
    external_id  INTEGER NOT NULL,
    name         TEXT NOT NULL,
    active       INTEGER NOT NULL DEFAULT 1 CHECK (active IN (0, 1)),
    created_at   TEXT NOT NULL      -- ISO 8601 UTC; server-assigned
);

-- At most one active version per external id.
CREATE UNIQUE INDEX IF NOT EXISTS records_one_active_idx
    ON records(external_id) WHERE active = 1;

CREATE INDEX IF NOT EXISTS records_external_idx ON records(external_id);
CREATE INDEX IF NOT EXISTS records_created_idx  ON records(created_at);

CREATE TRIGGER IF NOT EXISTS records_no_delete
BEFORE DELETE ON records
BEGIN
    SELECT RAISE(ABORT, 'records are never deleted');
END;

CREATE TRIGGER IF NOT EXISTS records_no_reactivate
BEFORE UPDATE OF active ON records
FOR EACH ROW WHEN OLD.active = 0 AND NEW.active = 1
BEGIN
    SELECT RAISE(ABORT, 'retired records stay retired');
END;

CREATE TRIGGER IF NOT EXISTS records_content_immutable
BEFORE UPDATE OF record_id, external_id, name, created_at ON records
BEGIN
    SELECT RAISE(ABORT, 'record content is immutable');
END;

PRAGMA user_version = 1;
";
