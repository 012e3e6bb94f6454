//! SQLite repository for race, result, payoff and pedigree records

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use super::schema::create_tables;
use crate::types::{HorseRecord, PayoffRecord, RaceRecord, RaceResultRecord, Surface, TicketType};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository for the race database
pub struct RaceRepository {
    conn: Connection,
}

impl RaceRepository {
    /// Create a new repository, initializing the database if needed
    pub fn new(db_path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create database directory")?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;

        // Enable foreign keys
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        // Create tables if they don't exist
        create_tables(&conn)?;

        Ok(Self { conn })
    }

    /// Create an in-memory repository (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    // ==================== Insert Operations ====================

    /// Store one race page in a single transaction.
    ///
    /// Earlier payoff and result rows of the race are dropped first, so a
    /// re-import leaves exactly what the page holds now.
    pub fn import_race(
        &mut self,
        race: &RaceRecord,
        payoffs: &[PayoffRecord],
        results: &[RaceResultRecord],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM payoff WHERE race_id = ?1", [race.id])?;
        tx.execute("DELETE FROM race_result WHERE race_id = ?1", [race.id])?;

        tx.execute(
            r#"
            INSERT OR REPLACE INTO race_info
            (id, name, racetrack, race_number, surface, direction, distance, weather,
             surface_condition, post_time, surface_score, date, place_detail, class,
             class_description, classification)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                race.id,
                race.name,
                race.racetrack,
                race.race_number,
                race.surface.as_str(),
                race.direction,
                race.distance,
                race.weather,
                race.surface_condition,
                race.post_time,
                race.surface_score,
                race.date.map(|d| d.format(DATE_FORMAT).to_string()),
                race.place_detail,
                race.class_level,
                race.class_description,
                race.classification_code.to_string(),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO payoff
                (race_id, ticket_type, combination, payoff, popularity)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for payoff in payoffs {
                stmt.execute(params![
                    payoff.race_id,
                    payoff.ticket_type.code(),
                    payoff.combination,
                    payoff.amount,
                    payoff.popularity,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO race_result
                (race_id, order_of_finish, bracket, horse_number, horse_id, horse_name, sex, age,
                 basis_weight, jockey_id, jockey_name, finishing_time, time_seconds, margin,
                 speed_figure, passing_order, last_phase, odds, popularity, horse_weight, remark,
                 stable, trainer_id, owner_id, earnings)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                        ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)
                "#,
            )?;
            for r in results {
                stmt.execute(params![
                    r.race_id,
                    r.order_of_finish,
                    r.bracket,
                    r.horse_number,
                    r.horse_id,
                    r.horse_name,
                    r.sex,
                    r.age,
                    r.basis_weight,
                    r.jockey_id,
                    r.jockey_name,
                    r.finishing_time,
                    r.time_seconds,
                    r.margin,
                    r.speed_figure,
                    r.passing_order,
                    r.last_phase,
                    r.odds,
                    r.popularity,
                    r.horse_weight,
                    r.remark,
                    r.stable,
                    r.trainer_id,
                    r.owner_id,
                    r.earnings,
                ])?;
            }
        }

        tx.commit().context("Failed to commit race import")?;
        Ok(())
    }

    /// Upsert pedigree records in a single transaction.
    ///
    /// Parents already stored are kept when the incoming record has none, so a
    /// horse seen as a leaf of another tree keeps its own sire and dam.
    pub fn upsert_horses(&mut self, horses: &[HorseRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO horse (id, name, sire_id, dam_id) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    name    = excluded.name,
                    sire_id = COALESCE(excluded.sire_id, horse.sire_id),
                    dam_id  = COALESCE(excluded.dam_id, horse.dam_id)
                "#,
            )?;
            for horse in horses.iter().filter(|h| !h.id.is_empty()) {
                stmt.execute(params![horse.id, horse.name, horse.sire_id, horse.dam_id])?;
            }
        }
        tx.commit().context("Failed to commit pedigree import")?;
        Ok(())
    }

    // ==================== Query Operations ====================

    /// Check if a race exists
    pub fn race_exists(&self, race_id: i64) -> Result<bool> {
        let count: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM race_info WHERE id = ?1",
            [race_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get a stored race
    pub fn race(&self, race_id: i64) -> Result<Option<RaceRecord>> {
        let race = self
            .conn
            .query_row(
                r#"
                SELECT id, name, racetrack, race_number, surface, direction, distance, weather,
                       surface_condition, post_time, surface_score, date, place_detail,
                       class_description, classification, class
                FROM race_info
                WHERE id = ?1
                "#,
                [race_id],
                race_from_row,
            )
            .optional()?;
        Ok(race)
    }

    /// Get payoffs for a race, by ticket type
    pub fn payoffs_for(&self, race_id: i64) -> Result<Vec<PayoffRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT race_id, ticket_type, combination, payoff, popularity
            FROM payoff
            WHERE race_id = ?1
            ORDER BY ticket_type, popularity, combination
            "#,
        )?;

        let payoffs = stmt
            .query_map([race_id], |row| {
                Ok(PayoffRecord {
                    race_id: row.get(0)?,
                    ticket_type: TicketType::from_code(row.get(1)?),
                    combination: row.get(2)?,
                    amount: row.get(3)?,
                    popularity: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(payoffs)
    }

    /// Get results for a race, by horse number
    pub fn results_for(&self, race_id: i64) -> Result<Vec<RaceResultRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT race_id, order_of_finish, bracket, horse_number, horse_id, horse_name, sex, age,
                   basis_weight, jockey_id, jockey_name, finishing_time, time_seconds, margin,
                   speed_figure, passing_order, last_phase, odds, popularity, horse_weight, remark,
                   stable, trainer_id, owner_id, earnings
            FROM race_result
            WHERE race_id = ?1
            ORDER BY horse_number
            "#,
        )?;

        let results = stmt
            .query_map([race_id], |row| {
                Ok(RaceResultRecord {
                    race_id: row.get(0)?,
                    order_of_finish: row.get(1)?,
                    bracket: row.get(2)?,
                    horse_number: row.get(3)?,
                    horse_id: row.get(4)?,
                    horse_name: row.get(5)?,
                    sex: row.get(6)?,
                    age: row.get(7)?,
                    basis_weight: row.get(8)?,
                    jockey_id: row.get(9)?,
                    jockey_name: row.get(10)?,
                    finishing_time: row.get(11)?,
                    time_seconds: row.get(12)?,
                    margin: row.get(13)?,
                    speed_figure: row.get(14)?,
                    passing_order: row.get(15)?,
                    last_phase: row.get(16)?,
                    odds: row.get(17)?,
                    popularity: row.get(18)?,
                    horse_weight: row.get(19)?,
                    remark: row.get(20)?,
                    stable: row.get(21)?,
                    trainer_id: row.get(22)?,
                    owner_id: row.get(23)?,
                    earnings: row.get(24)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(results)
    }

    /// Get a horse from the pedigree table
    pub fn horse(&self, horse_id: &str) -> Result<Option<HorseRecord>> {
        let horse = self
            .conn
            .query_row(
                "SELECT id, name, sire_id, dam_id FROM horse WHERE id = ?1",
                [horse_id],
                |row| {
                    Ok(HorseRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        sire_id: row.get(2)?,
                        dam_id: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(horse)
    }

    /// Horses that ran in a stored race but have no pedigree row yet
    pub fn horse_ids_without_pedigree(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT DISTINCT horse_id
            FROM race_result
            WHERE horse_id != '' AND horse_id NOT IN (SELECT id FROM horse)
            ORDER BY horse_id
            "#,
        )?;

        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(ids)
    }

    /// Date of the most recent stored race
    pub fn last_race_date(&self) -> Result<Option<NaiveDate>> {
        let result: Option<String> = self.conn.query_row(
            "SELECT MAX(date) FROM race_info",
            [],
            |row| row.get(0),
        )?;

        Ok(result.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()))
    }

    /// Get race count
    pub fn race_count(&self) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM race_info",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get horse count
    pub fn horse_count(&self) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM horse",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn race_from_row(row: &Row) -> rusqlite::Result<RaceRecord> {
    let surface: String = row.get(4)?;
    let date: Option<String> = row.get(11)?;
    let classification: String = row.get(14)?;

    Ok(RaceRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        racetrack: row.get(2)?,
        race_number: row.get(3)?,
        surface: Surface::from_name(&surface),
        direction: row.get(5)?,
        distance: row.get(6)?,
        weather: row.get(7)?,
        surface_condition: row.get(8)?,
        post_time: row.get(9)?,
        surface_score: row.get(10)?,
        date: date.and_then(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT).ok()),
        place_detail: row.get(12)?,
        class_description: row.get(13)?,
        classification_code: classification
            .parse()
            .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(14, Type::Text, e.into()))?,
        class_level: row.get(15)?,
    })
}
