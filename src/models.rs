use async_std::stream::{Stream, StreamExt};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use log::*;
use serde::Serialize;
use sqlx::sqlite::{SqliteExecutor, SqlitePool};

use std::fmt;

use crate::error::Error;

/// How many questions the index page shows
pub const LATEST_LIMIT: i64 = 5;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub choice_text: String,
    pub votes: i64,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.question_text)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.choice_text)
    }
}

/**
 * Closed UTC range [Jan 1st 00:00:00, Dec 31st 23:59:59.999999999] of `year`
 *
 * Both ends stay inside the year: timestamps are compared as stored text, and
 * the text of the following year isn't always ordered after it (9999 vs +10000)
 */
fn year_bounds(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31)?.and_hms_nano_opt(23, 59, 59, 999_999_999)?;
    Some((Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end)))
}

impl Question {
    /**
     * Whether the question went live within the last day, relative to `now`
     *
     * Both ends of [now - 24h, now] are inclusive, anything scheduled after
     * `now` has not been published at all
     */
    pub fn was_published_recently_at(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }

    pub fn was_published_recently(&self) -> bool {
        self.was_published_recently_at(Utc::now())
    }

    pub async fn create<'e, E>(
        executor: E,
        question_text: &str,
        pub_date: DateTime<Utc>,
    ) -> Result<Self, Error>
    where
        E: SqliteExecutor<'e>,
    {
        let done = sqlx::query("INSERT INTO polls_question (question_text, pub_date) VALUES (?, ?)")
            .bind(question_text)
            .bind(pub_date)
            .execute(executor)
            .await?;

        let question = Self {
            id: done.last_insert_rowid(),
            question_text: question_text.to_string(),
            pub_date,
        };
        info!("Created question {}: {}", question.id, question);
        Ok(question)
    }

    pub async fn get<'e, E>(executor: E, id: i64) -> Result<Self, Error>
    where
        E: SqliteExecutor<'e>,
    {
        debug!("Fetching question: {}", id);
        sqlx::query_as::<_, Self>(
            "SELECT id, question_text, pub_date FROM polls_question WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(Error::NotFound)
    }

    /**
     * Like `get`, but a question scheduled after `now` does not exist yet
     */
    pub async fn get_published<'e, E>(executor: E, id: i64, now: DateTime<Utc>) -> Result<Self, Error>
    where
        E: SqliteExecutor<'e>,
    {
        debug!("Fetching published question: {}", id);
        sqlx::query_as::<_, Self>(
            "SELECT id, question_text, pub_date FROM polls_question WHERE id = ? AND pub_date <= ?",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(executor)
        .await?
        .ok_or(Error::NotFound)
    }

    /**
     * The first `LATEST_LIMIT` published questions, oldest first
     */
    pub async fn latest<'e, E>(executor: E, now: DateTime<Utc>) -> Result<Vec<Self>, Error>
    where
        E: SqliteExecutor<'e>,
    {
        let questions = sqlx::query_as::<_, Self>(
            "SELECT id, question_text, pub_date FROM polls_question
                WHERE pub_date <= ? ORDER BY pub_date ASC LIMIT ?",
        )
        .bind(now)
        .bind(LATEST_LIMIT)
        .fetch_all(executor)
        .await?;
        Ok(questions)
    }

    /**
     * Stream every question published during the calendar year `year` (UTC)
     *
     * Nothing is read until the stream is polled, and every call runs a new
     * query so the sequence can simply be requested again
     */
    pub fn get_by_year<'a>(
        pool: &'a SqlitePool,
        year: i32,
    ) -> Result<impl Stream<Item = Result<Self, Error>> + 'a, Error> {
        let (start, end) = year_bounds(year).ok_or(Error::InvalidYear(year))?;

        let rows = sqlx::query_as::<_, Self>(
            "SELECT id, question_text, pub_date FROM polls_question
                WHERE pub_date BETWEEN ? AND ? ORDER BY pub_date ASC",
        )
        .bind(start)
        .bind(end)
        .fetch(pool);

        Ok(rows.map(|row| row.map_err(Error::from)))
    }

    pub async fn choices<'e, E>(&self, executor: E) -> Result<Vec<Choice>, Error>
    where
        E: SqliteExecutor<'e>,
    {
        let choices = sqlx::query_as::<_, Choice>(
            "SELECT id, question_id, choice_text, votes FROM polls_choice
                WHERE question_id = ? ORDER BY id ASC",
        )
        .bind(self.id)
        .fetch_all(executor)
        .await?;
        Ok(choices)
    }

    /**
     * Remove the question, its choices go with it through the foreign key
     */
    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<(), Error>
    where
        E: SqliteExecutor<'e>,
    {
        let done = sqlx::query("DELETE FROM polls_question WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;

        if done.rows_affected() == 0 {
            return Err(Error::NotFound);
        }
        info!("Deleted question {}", id);
        Ok(())
    }
}

impl Choice {
    /**
     * Negative `votes` are rejected by the `votes_non_negative` check
     * constraint and come back as `Error::Integrity`
     */
    pub async fn create<'e, E>(
        executor: E,
        question_id: i64,
        choice_text: &str,
        votes: i64,
    ) -> Result<Self, Error>
    where
        E: SqliteExecutor<'e>,
    {
        let done = sqlx::query(
            "INSERT INTO polls_choice (question_id, choice_text, votes) VALUES (?, ?, ?)",
        )
        .bind(question_id)
        .bind(choice_text)
        .bind(votes)
        .execute(executor)
        .await?;

        debug!("Created choice for question {}: {}", question_id, choice_text);
        Ok(Self {
            id: done.last_insert_rowid(),
            question_id,
            choice_text: choice_text.to_string(),
            votes,
        })
    }
}
