/// SQL DDL for the quote database.
pub const SCHEMA_VERSION: u32 = 1;

pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS delivery_requests (
    ticket_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    material_type TEXT NOT NULL,
    distance REAL NOT NULL,
    urgency TEXT NOT NULL,
    weight REAL NOT NULL,
    location_type TEXT NOT NULL,
    total_price REAL NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_delivery_requests_created ON delivery_requests(created_at);
CREATE INDEX IF NOT EXISTS idx_delivery_requests_user ON delivery_requests(user_id);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;

pub const RECORD_COLUMNS: &str = "ticket_id, user_id, material_type, distance, urgency, weight, \
                                  location_type, total_price, status, created_at";
