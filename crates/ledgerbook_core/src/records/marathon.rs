//! Marathon participants, matches and enrollments.
//!
//! Participants and matches are only ever read by key. Enrollments are
//! indexed by user so a participant's results can be listed without a
//! full scan.

use crate::error::{CoreError, CoreResult};
use crate::query::IndexProjection;
use crate::record::Record;
use crate::types::IndexDef;
use serde::{Deserialize, Serialize};

/// A registered runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Numeric user ID.
    pub user_id: String,
    /// Display name.
    pub user_name: String,
    /// Date of birth.
    pub birthday: String,
    /// National ID number.
    pub national_id: String,
    /// Passport number.
    pub passport_number: String,
    /// Mobile phone number.
    pub mobile: String,
    /// Points balance.
    #[serde(rename = "point_free")]
    pub point: String,
}

impl Participant {
    /// Key prefix of participant records.
    pub const KEY_PREFIX: &'static str = "ParticipantInfo_";

    /// Returns the primary key for `user_id`.
    pub fn key_for(user_id: &str) -> String {
        format!("{}{user_id}", Self::KEY_PREFIX)
    }

    /// Builds a participant from positional arguments
    /// `[user_id, user_name, birthday, national_id, passport_number, mobile, point]`.
    pub fn from_args(args: &[String]) -> CoreResult<Self> {
        let [user_id, user_name, birthday, national_id, passport_number, mobile, point] =
            positional(args)?;
        Ok(Self {
            user_id,
            user_name,
            birthday,
            national_id,
            passport_number,
            mobile,
            point,
        })
    }

    /// Returns the points-only view of this participant.
    #[must_use]
    pub fn points(&self) -> ParticipantPoints {
        ParticipantPoints {
            user_id: self.user_id.clone(),
            point: self.point.clone(),
        }
    }
}

impl Record for Participant {
    const KIND: &'static str = "Participant";

    fn primary_key(&self) -> String {
        Self::key_for(&self.user_id)
    }
}

/// Points-only projection of a [`Participant`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantPoints {
    /// Numeric user ID.
    pub user_id: String,
    /// Points balance.
    pub point: String,
}

impl ParticipantPoints {
    /// Projects stored participant bytes to points-only JSON.
    pub fn project(bytes: &[u8]) -> CoreResult<Vec<u8>> {
        let participant = Participant::decode(bytes)?;
        Ok(serde_json::to_vec(&participant.points())?)
    }
}

/// A scheduled match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInfo {
    /// Match ID.
    pub match_id: String,
    /// Match name.
    pub name: String,
    /// Match status.
    pub status: String,
    /// Date the match is held.
    pub match_date: String,
}

impl MatchInfo {
    /// Key prefix of match records.
    pub const KEY_PREFIX: &'static str = "MatchInfo_";

    /// Returns the primary key for `match_id`.
    pub fn key_for(match_id: &str) -> String {
        format!("{}{match_id}", Self::KEY_PREFIX)
    }

    /// Builds a match from `[match_id, name, status, match_date]`.
    pub fn from_args(args: &[String]) -> CoreResult<Self> {
        let [match_id, name, status, match_date] = positional(args)?;
        Ok(Self {
            match_id,
            name,
            status,
            match_date,
        })
    }
}

impl Record for MatchInfo {
    const KIND: &'static str = "MatchInfo";

    fn primary_key(&self) -> String {
        Self::key_for(&self.match_id)
    }
}

/// Enrollments by user, carrying every enrollment field.
pub const ENROLLMENT_BY_USER: IndexDef = IndexDef::new(
    "userid~enrollment",
    &["user_id", "user_enter_id", "match_id", "status", "match_result", "score"],
);

/// A participant's enrollment in a match, with its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Enrollment ID.
    pub user_enter_id: String,
    /// Enrolled user.
    pub user_id: String,
    /// Match enrolled in.
    pub match_id: String,
    /// Enrollment status.
    pub status: String,
    /// Finishing result.
    pub match_result: String,
    /// Score.
    pub score: String,
}

impl Enrollment {
    /// Key prefix of enrollment records.
    pub const KEY_PREFIX: &'static str = "MatchEnrollScoreInfo_";

    /// Returns the primary key for `user_enter_id`.
    pub fn key_for(user_enter_id: &str) -> String {
        format!("{}{user_enter_id}", Self::KEY_PREFIX)
    }

    /// Builds an enrollment from
    /// `[user_enter_id, user_id, match_id, status, match_result, score]`.
    pub fn from_args(args: &[String]) -> CoreResult<Self> {
        let [user_enter_id, user_id, match_id, status, match_result, score] = positional(args)?;
        Ok(Self {
            user_enter_id,
            user_id,
            match_id,
            status,
            match_result,
            score,
        })
    }
}

impl Record for Enrollment {
    const KIND: &'static str = "Enrollment";

    fn primary_key(&self) -> String {
        Self::key_for(&self.user_enter_id)
    }

    fn indexes() -> &'static [IndexDef] {
        &[ENROLLMENT_BY_USER]
    }

    fn projection(&self, _index: &IndexDef) -> Vec<String> {
        vec![
            self.user_id.clone(),
            self.user_enter_id.clone(),
            self.match_id.clone(),
            self.status.clone(),
            self.match_result.clone(),
            self.score.clone(),
        ]
    }
}

impl IndexProjection for Enrollment {
    const INDEX: IndexDef = ENROLLMENT_BY_USER;

    fn from_attributes(attributes: Vec<String>) -> CoreResult<Self> {
        let [user_id, user_enter_id, match_id, status, match_result, score] =
            positional(&attributes)?;
        Ok(Self {
            user_enter_id,
            user_id,
            match_id,
            status,
            match_result,
            score,
        })
    }
}

/// Splits exactly `N` positional values.
pub(crate) fn positional<const N: usize>(values: &[String]) -> CoreResult<[String; N]> {
    <[String; N]>::try_from(values.to_vec()).map_err(|v| {
        CoreError::decoding(format!("expected {N} positional values, got {}", v.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn participant_json_field_names() {
        let p = Participant::from_args(&args(&[
            "1", "Ann", "1990-01-01", "N1", "P1", "555", "10",
        ]))
        .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&p.encode().unwrap()).unwrap();
        assert_eq!(json["user_id"], "1");
        assert_eq!(json["point_free"], "10");
        assert_eq!(p.primary_key(), "ParticipantInfo_1");
    }

    #[test]
    fn points_projection() {
        let p = Participant::from_args(&args(&["7", "A", "b", "c", "d", "e", "42"])).unwrap();
        let projected = ParticipantPoints::project(&p.encode().unwrap()).unwrap();
        assert_eq!(
            String::from_utf8(projected).unwrap(),
            r#"{"user_id":"7","point":"42"}"#
        );
    }

    #[test]
    fn match_key() {
        let m = MatchInfo::from_args(&args(&["m1", "City Run", "open", "2024-05-01"])).unwrap();
        assert_eq!(m.primary_key(), "MatchInfo_m1");
    }

    #[test]
    fn enrollment_projection_roundtrips_through_index() {
        let e = Enrollment::from_args(&args(&["e1", "7", "m1", "done", "1st", "99"])).unwrap();
        let tuple = e.projection(&ENROLLMENT_BY_USER);
        assert_eq!(tuple.len(), ENROLLMENT_BY_USER.arity());
        assert_eq!(tuple[0], "7");
        assert_eq!(Enrollment::from_attributes(tuple).unwrap(), e);
    }

    #[test]
    fn wrong_arity_rejected() {
        assert!(MatchInfo::from_args(&args(&["m1"])).is_err());
    }
}
