//! SQLite schema definitions for the race database
//!
//! Tables:
//! - race_info: one row per race
//! - race_result: one row per runner
//! - payoff: one row per (race, ticket type, combination)
//! - horse: one row per horse, with sire and dam references

use rusqlite::{Connection, Result};

/// Create all tables in the database
pub fn create_tables(conn: &Connection) -> Result<()> {
    // Core race information
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS race_info (
            id                INTEGER PRIMARY KEY,
            name              TEXT    NOT NULL,
            racetrack         TEXT    NOT NULL,
            race_number       INTEGER NOT NULL,
            surface           TEXT    NOT NULL,
            direction         TEXT    NOT NULL,
            distance          INTEGER NOT NULL,
            weather           TEXT    NOT NULL,
            surface_condition TEXT    NOT NULL,
            post_time         TEXT    NOT NULL,
            surface_score     INTEGER,
            date              TEXT,
            place_detail      TEXT    NOT NULL,
            class             INTEGER NOT NULL CHECK(class BETWEEN -1 AND 7),
            class_description TEXT    NOT NULL,
            classification    TEXT    NOT NULL
        )
        "#,
        [],
    )?;

    // Per-runner results
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS race_result (
            race_id         INTEGER NOT NULL REFERENCES race_info(id),
            order_of_finish TEXT    NOT NULL,
            bracket         INTEGER NOT NULL,
            horse_number    INTEGER NOT NULL,
            horse_id        TEXT    NOT NULL,
            horse_name      TEXT    NOT NULL,
            sex             TEXT    NOT NULL,
            age             INTEGER NOT NULL,
            basis_weight    REAL    NOT NULL,
            jockey_id       TEXT    NOT NULL,
            jockey_name     TEXT    NOT NULL,
            finishing_time  TEXT,
            time_seconds    REAL,
            margin          TEXT    NOT NULL,
            speed_figure    INTEGER,
            passing_order   TEXT    NOT NULL,
            last_phase      REAL,
            odds            REAL    NOT NULL,
            popularity      INTEGER NOT NULL,
            horse_weight    TEXT    NOT NULL,
            remark          TEXT,
            stable          TEXT    NOT NULL,
            trainer_id      TEXT    NOT NULL,
            owner_id        TEXT    NOT NULL,
            earnings        REAL    NOT NULL,
            PRIMARY KEY (race_id, horse_number)
        )
        "#,
        [],
    )?;

    // Payouts
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS payoff (
            race_id     INTEGER NOT NULL REFERENCES race_info(id),
            ticket_type INTEGER NOT NULL CHECK(ticket_type BETWEEN -1 AND 7),
            combination TEXT    NOT NULL,
            payoff      REAL    NOT NULL CHECK(payoff >= 0),
            popularity  INTEGER NOT NULL CHECK(popularity >= 0),
            PRIMARY KEY (race_id, ticket_type, combination)
        )
        "#,
        [],
    )?;

    // Pedigree
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS horse (
            id      TEXT PRIMARY KEY,
            name    TEXT NOT NULL,
            sire_id TEXT,
            dam_id  TEXT
        )
        "#,
        [],
    )?;

    // Create indexes for common queries
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_race_info_date ON race_info(date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_race_result_race ON race_result(race_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_race_result_horse ON race_result(horse_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_race_result_jockey ON race_result(jockey_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_race_result_trainer ON race_result(trainer_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_race_result_owner ON race_result(owner_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_race_result_horse_speed ON race_result(horse_id, speed_figure)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_create_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        // Verify tables exist
        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
                 ('race_info', 'race_result', 'payoff', 'horse')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_create_tables_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        // Should not fail on second call
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_payoff_checks() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let bad_type = conn.execute(
            "INSERT INTO payoff VALUES (1, 8, '1', 100.0, 1)",
            [],
        );
        assert!(bad_type.is_err());

        let negative = conn.execute(
            "INSERT INTO payoff VALUES (1, 1, '1', -5.0, 1)",
            [],
        );
        assert!(negative.is_err());
    }
}
