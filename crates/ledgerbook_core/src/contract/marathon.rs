use super::{require_non_empty, require_numeric, unknown, Contract, FunctionSpec};
use crate::config::Config;
use crate::error::CoreResult;
use crate::query::render_rows;
use crate::record::Record;
use crate::records::marathon::{Enrollment, MatchInfo, Participant, ParticipantPoints};
use crate::store::RecordStore;
use ledgerbook_ledger::Ledger;

const FUNCTIONS: &[FunctionSpec] = &[
    FunctionSpec::new("addParticipantInfo", 7),
    FunctionSpec::new("updateParticipantInfo", 7),
    FunctionSpec::new("queryParticipantInfo", 1),
    FunctionSpec::new("queryParticipantPoint", 1),
    FunctionSpec::new("queryHistoryParticipantInfo", 1),
    FunctionSpec::new("queryHistoryParticipantPoint", 1),
    FunctionSpec::new("addMatchInfo", 4),
    FunctionSpec::new("updateMatchInfo", 4),
    FunctionSpec::new("queryMatchInfo", 1),
    FunctionSpec::new("queryHistoryMatchInfo", 1),
    FunctionSpec::new("addMatchEnrollScoreInfo", 6),
    FunctionSpec::new("updateMatchEnrollScoreInfo", 6),
    FunctionSpec::new("queryMatchEnrollScoreInfo", 1),
    FunctionSpec::new("queryHistoryMatchEnrollScoreInfo", 1),
    FunctionSpec::new("queryMatchInfoBasedOnUser", 1),
];

/// Marathon participants, matches and enrollment results.
#[derive(Debug, Clone, Default)]
pub struct MarathonContract {
    config: Config,
}

impl MarathonContract {
    /// Creates the contract.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::DomainConstraint`] if `config` cannot produce
    /// well-formed index entries.
    pub fn new(config: Config) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }
}

/// Replaces the stored record with `record`, which must already exist.
fn replace<R: Record>(store: &mut RecordStore<'_>, record: R) -> CoreResult<()> {
    let key = record.primary_key();
    store.update(&key, move |_: R| Ok(record))?;
    Ok(())
}

impl Contract for MarathonContract {
    fn name(&self) -> &'static str {
        "marathon"
    }

    fn functions(&self) -> &'static [FunctionSpec] {
        FUNCTIONS
    }

    fn dispatch(
        &self,
        ledger: &mut dyn Ledger,
        function: &str,
        args: &[String],
    ) -> CoreResult<Option<Vec<u8>>> {
        let mut store = RecordStore::new(ledger, &self.config);
        match function {
            "addParticipantInfo" => {
                require_numeric("user_id", &args[0])?;
                store.create(&Participant::from_args(args)?)?;
                Ok(None)
            }
            "updateParticipantInfo" => {
                require_non_empty("user_id", &args[0])?;
                replace(&mut store, Participant::from_args(args)?)?;
                Ok(None)
            }
            "queryParticipantInfo" => store.read_raw(&Participant::key_for(&args[0])).map(Some),
            "queryParticipantPoint" => {
                let participant: Participant = store.read(&Participant::key_for(&args[0]))?;
                Ok(Some(serde_json::to_vec(&participant.points())?))
            }
            "queryHistoryParticipantInfo" => store
                .history(&Participant::key_for(&args[0]))?
                .render_json()
                .map(Some),
            "queryHistoryParticipantPoint" => store
                .history_projected(&Participant::key_for(&args[0]), ParticipantPoints::project)?
                .render_json()
                .map(Some),
            "addMatchInfo" => {
                require_non_empty("match_id", &args[0])?;
                store.create(&MatchInfo::from_args(args)?)?;
                Ok(None)
            }
            "updateMatchInfo" => {
                require_non_empty("match_id", &args[0])?;
                replace(&mut store, MatchInfo::from_args(args)?)?;
                Ok(None)
            }
            "queryMatchInfo" => store.read_raw(&MatchInfo::key_for(&args[0])).map(Some),
            "queryHistoryMatchInfo" => store
                .history(&MatchInfo::key_for(&args[0]))?
                .render_json()
                .map(Some),
            "addMatchEnrollScoreInfo" => {
                require_non_empty("user_enter_id", &args[0])?;
                store.create(&Enrollment::from_args(args)?)?;
                Ok(None)
            }
            "updateMatchEnrollScoreInfo" => {
                require_non_empty("user_enter_id", &args[0])?;
                replace(&mut store, Enrollment::from_args(args)?)?;
                Ok(None)
            }
            "queryMatchEnrollScoreInfo" => store.read_raw(&Enrollment::key_for(&args[0])).map(Some),
            "queryHistoryMatchEnrollScoreInfo" => store
                .history(&Enrollment::key_for(&args[0]))?
                .render_json()
                .map(Some),
            "queryMatchInfoBasedOnUser" => {
                let rows: Vec<Enrollment> = store.query_rows(&args[..1])?;
                render_rows(&rows).map(Some)
            }
            _ => Err(unknown(function)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use ledgerbook_ledger::InMemoryLedger;
    use serde_json::Value;

    fn call(
        ledger: &mut InMemoryLedger,
        function: &str,
        args: &[&str],
    ) -> CoreResult<Option<Vec<u8>>> {
        ledger.begin_transaction();
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        MarathonContract::default().invoke(ledger, function, &args)
    }

    fn json(bytes: Option<Vec<u8>>) -> Value {
        serde_json::from_slice(&bytes.unwrap()).unwrap()
    }

    #[test]
    fn participant_lifecycle() {
        let mut ledger = InMemoryLedger::new();
        let ann = ["7", "Ann", "1990", "N", "P", "555", "10"];
        call(&mut ledger, "addParticipantInfo", &ann).unwrap();
        let ann = ["7", "Ann", "1990", "N", "P", "555", "25"];
        call(&mut ledger, "updateParticipantInfo", &ann).unwrap();

        let info = json(call(&mut ledger, "queryParticipantInfo", &["7"]).unwrap());
        assert_eq!(info["point_free"], "25");

        let points = json(call(&mut ledger, "queryParticipantPoint", &["7"]).unwrap());
        assert_eq!(points, serde_json::json!({"user_id": "7", "point": "25"}));

        let history = json(call(&mut ledger, "queryHistoryParticipantPoint", &["7"]).unwrap());
        let history = history.as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["Value"], serde_json::json!({"user_id": "7", "point": "10"}));
    }

    #[test]
    fn participant_id_must_be_numeric() {
        let mut ledger = InMemoryLedger::new();
        let ann = ["x7", "Ann", "1990", "N", "P", "555", "10"];
        let result = call(&mut ledger, "addParticipantInfo", &ann);
        assert!(matches!(result, Err(CoreError::InvalidFieldValue { .. })));
        assert!(ledger.is_empty());
    }

    #[test]
    fn duplicate_and_missing_records() {
        let mut ledger = InMemoryLedger::new();
        call(&mut ledger, "addMatchInfo", &["m1", "City Run", "open", "2024-05-01"]).unwrap();
        assert!(matches!(
            call(&mut ledger, "addMatchInfo", &["m1", "City Run", "open", "2024-05-01"]),
            Err(CoreError::AlreadyExists { .. })
        ));
        assert!(matches!(
            call(&mut ledger, "updateMatchInfo", &["m2", "x", "y", "z"]),
            Err(CoreError::NotFound { .. })
        ));
        assert!(matches!(
            call(&mut ledger, "queryMatchInfo", &["m2"]),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn enrollments_by_user() {
        let mut ledger = InMemoryLedger::new();
        let enrollment = ["e1", "7", "m1", "done", "3", "80"];
        call(&mut ledger, "addMatchEnrollScoreInfo", &enrollment).unwrap();
        call(&mut ledger, "addMatchEnrollScoreInfo", &["e2", "7", "m2", "open", "", ""]).unwrap();
        let enrollment = ["e3", "8", "m1", "done", "1", "95"];
        call(&mut ledger, "addMatchEnrollScoreInfo", &enrollment).unwrap();
        let enrollment = ["e2", "7", "m2", "done", "2", "88"];
        call(&mut ledger, "updateMatchEnrollScoreInfo", &enrollment).unwrap();

        let rows = json(call(&mut ledger, "queryMatchInfoBasedOnUser", &["7"]).unwrap());
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["user_enter_id"], "e1");
        assert_eq!(rows[1]["score"], "88");

        let none = call(&mut ledger, "queryMatchInfoBasedOnUser", &["9"]).unwrap();
        assert_eq!(none.unwrap(), b"[]".to_vec());
    }

    #[test]
    fn arity_checked_before_ledger_access() {
        let mut ledger = InMemoryLedger::new();
        assert!(matches!(
            call(&mut ledger, "addMatchInfo", &["m1"]),
            Err(CoreError::InvalidArgumentCount { expected: 4, actual: 1, .. })
        ));
        assert!(matches!(
            call(&mut ledger, "dropEverything", &[]),
            Err(CoreError::UnknownFunction { .. })
        ));
        assert!(ledger.is_empty());
    }
}
