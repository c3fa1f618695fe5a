// ABOUTME: Defines ToolExecutionContext, the per-request context handed to every tool
// ABOUTME: Bundles the user profile snapshot and request-level location/timezone overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Tool Execution Context
//!
//! A unified context object for tool execution, carrying:
//! - The user's profile snapshot (location, timezone, preferences)
//! - Request-level overrides supplied alongside the message
//! - Today's date, fixed once per run so all steps agree on it
//!
//! Tools that need a location fall back from explicit arguments to the
//! request override to the profile, in that order.

use chrono::NaiveDate;

use crate::database::profiles::UserProfileSnapshot;

/// Context provided to every tool execution
#[derive(Debug, Clone)]
pub struct ToolExecutionContext {
    /// Profile snapshot taken at the start of the run
    pub profile: UserProfileSnapshot,
    /// Location supplied with this request, overriding the profile
    pub request_location: Option<String>,
    /// Timezone supplied with this request, overriding the profile
    pub request_timezone: Option<String>,
    /// Date of the run, in the user's timezone where known
    pub today: NaiveDate,
}

impl ToolExecutionContext {
    /// Create a context from a profile snapshot and request overrides
    #[must_use]
    pub fn new(
        profile: UserProfileSnapshot,
        request_location: Option<String>,
        request_timezone: Option<String>,
        today: NaiveDate,
    ) -> Self {
        Self {
            profile,
            request_location,
            request_timezone,
            today,
        }
    }

    /// Location to use when tool arguments carry none
    ///
    /// Request override wins over the stored profile.
    #[must_use]
    pub fn default_location(&self) -> Option<&str> {
        self.request_location
            .as_deref()
            .or(self.profile.location.as_deref())
            .map(str::trim)
            .filter(|loc| !loc.is_empty())
    }

    /// Prayer calculation method from the profile, default 2 (ISNA)
    #[must_use]
    pub fn calculation_method(&self) -> u8 {
        self.profile.calculation_method.unwrap_or(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with_location(location: Option<&str>) -> UserProfileSnapshot {
        UserProfileSnapshot {
            user_id: "user-1".to_owned(),
            location: location.map(str::to_owned),
            timezone: None,
            madhab: None,
            calculation_method: None,
            language: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_request_location_wins_over_profile() {
        let ctx = ToolExecutionContext::new(
            profile_with_location(Some("Cairo")),
            Some("Istanbul".to_owned()),
            None,
            today(),
        );
        assert_eq!(ctx.default_location(), Some("Istanbul"));
    }

    #[test]
    fn test_profile_location_is_fallback() {
        let ctx = ToolExecutionContext::new(profile_with_location(Some("Cairo")), None, None, today());
        assert_eq!(ctx.default_location(), Some("Cairo"));
    }

    #[test]
    fn test_blank_locations_are_none() {
        let ctx = ToolExecutionContext::new(
            profile_with_location(Some("  ")),
            None,
            None,
            today(),
        );
        assert_eq!(ctx.default_location(), None);
    }
}
