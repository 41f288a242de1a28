//! Record types served by the contracts.

pub mod certificate;
pub mod loyalty;
pub mod marathon;
pub mod registry;

pub use certificate::Certificate;
pub use loyalty::{Balance, BalanceRow, Category, Transfer};
pub use marathon::{Enrollment, MatchInfo, Participant, ParticipantPoints};
pub use registry::RegisteredCertificate;
