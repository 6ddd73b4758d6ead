//! SQL schema for the crimelog SQLite store.
//!
//! Executed by `initialize` on every run. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Per-connection settings, applied on open.
pub const CONNECTION_PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS campuses (
    campus_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    campus_code  TEXT NOT NULL UNIQUE,
    campus_name  TEXT NOT NULL UNIQUE
);

-- incident_number is NULL when extraction failed; UNIQUE ignores NULLs.
CREATE TABLE IF NOT EXISTS incidents (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    incident_number     TEXT UNIQUE,
    campus_id           INTEGER NOT NULL REFERENCES campuses(campus_id),
    reported_datetime   TEXT NOT NULL DEFAULT '',
    occurred_start      TEXT NOT NULL DEFAULT '',
    occurred_end        TEXT NOT NULL DEFAULT '',
    nature_of_incident  TEXT NOT NULL DEFAULT '',
    location            TEXT NOT NULL DEFAULT '',
    created_at          TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS offense_types (
    offense_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    offense_code TEXT NOT NULL UNIQUE,
    description  TEXT               -- reserved; ingestion never sets it
);

-- rowid order is link insertion order.
CREATE TABLE IF NOT EXISTS incident_offenses (
    incident_id INTEGER NOT NULL REFERENCES incidents(id),
    offense_id  INTEGER NOT NULL REFERENCES offense_types(offense_id),
    PRIMARY KEY (incident_id, offense_id)
);

CREATE INDEX IF NOT EXISTS incidents_campus_idx  ON incidents(campus_id);
CREATE INDEX IF NOT EXISTS incident_offenses_idx ON incident_offenses(offense_id);

CREATE VIEW IF NOT EXISTS v_incidents_full AS
SELECT
    i.id,
    i.incident_number,
    c.campus_name AS campus,
    i.reported_datetime,
    i.occurred_start,
    i.occurred_end,
    i.nature_of_incident,
    i.location,
    (
        SELECT GROUP_CONCAT(ot.offense_code, ' | ' ORDER BY io.rowid)
        FROM incident_offenses io
        JOIN offense_types ot ON ot.offense_id = io.offense_id
        WHERE io.incident_id = i.id
    ) AS offenses
FROM incidents i
JOIN campuses c ON c.campus_id = i.campus_id;

CREATE VIEW IF NOT EXISTS v_incidents_by_campus AS
SELECT
    c.campus_name,
    COUNT(*)                 AS total_incidents,
    MIN(i.reported_datetime) AS earliest_report,
    MAX(i.reported_datetime) AS latest_report
FROM incidents i
JOIN campuses c ON c.campus_id = i.campus_id
GROUP BY c.campus_name
ORDER BY total_incidents DESC, c.campus_name;

CREATE VIEW IF NOT EXISTS v_top_offenses AS
SELECT
    ot.offense_code,
    COUNT(*) AS frequency
FROM incident_offenses io
JOIN offense_types ot ON ot.offense_id = io.offense_id
GROUP BY ot.offense_code
ORDER BY frequency DESC, ot.offense_code;

PRAGMA user_version = 1;
";
