// ABOUTME: Database operations for user profile snapshots
// ABOUTME: Location, timezone, madhab, and prayer calculation preferences
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # User Profiles
//!
//! A small preferences record per user. Tools read it through the
//! execution context to fill in defaults the request omitted. A user with
//! no stored profile gets an empty snapshot, never an error.

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::errors::{AppError, AppResult};

/// Profile snapshot handed to tools at the start of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileSnapshot {
    /// User the profile belongs to
    pub user_id: String,
    /// Saved home location (free-form place name)
    pub location: Option<String>,
    /// IANA timezone name
    pub timezone: Option<String>,
    /// School of jurisprudence (hanafi, shafi, maliki, hanbali)
    pub madhab: Option<String>,
    /// Preferred prayer calculation method (Aladhan numbering 1-12)
    pub calculation_method: Option<u8>,
    /// Preferred response language
    pub language: Option<String>,
}

impl UserProfileSnapshot {
    /// Empty snapshot for a user with no stored profile
    #[must_use]
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_owned(),
            location: None,
            timezone: None,
            madhab: None,
            calculation_method: None,
            language: None,
        }
    }
}

/// User profile operations manager
pub struct ProfileManager {
    pool: SqlitePool,
}

impl ProfileManager {
    /// Create a new profile manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user's profile snapshot, empty when none is stored
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_snapshot(&self, user_id: &str) -> AppResult<UserProfileSnapshot> {
        let row = sqlx::query(
            r"
            SELECT user_id, location, timezone, madhab, calculation_method, language
            FROM user_profiles
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get profile: {e}")))?;

        Ok(row.map_or_else(
            || UserProfileSnapshot::empty(user_id),
            |r| {
                let method: Option<i64> = r.get("calculation_method");
                UserProfileSnapshot {
                    user_id: r.get("user_id"),
                    location: r.get("location"),
                    timezone: r.get("timezone"),
                    madhab: r.get("madhab"),
                    calculation_method: method.and_then(|m| u8::try_from(m).ok()),
                    language: r.get("language"),
                }
            },
        ))
    }

    /// Insert or update a user's profile
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn upsert(&self, snapshot: &UserProfileSnapshot) -> AppResult<()> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO user_profiles
                (user_id, location, timezone, madhab, calculation_method, language, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                location = excluded.location,
                timezone = excluded.timezone,
                madhab = excluded.madhab,
                calculation_method = excluded.calculation_method,
                language = excluded.language,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&snapshot.user_id)
        .bind(&snapshot.location)
        .bind(&snapshot.timezone)
        .bind(&snapshot.madhab)
        .bind(snapshot.calculation_method.map(i64::from))
        .bind(&snapshot.language)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert profile: {e}")))?;

        Ok(())
    }
}
