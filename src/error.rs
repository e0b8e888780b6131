use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Failures of the scoring and ranking core. These are always returned to
/// the immediate caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    #[error("unrecognized IANA timezone '{0}'")]
    InvalidTimezone(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("at least one participant is required")]
    InsufficientParticipants,

    #[error("hour {0} is outside 0..=23")]
    InvalidHour(u32),

    #[error("date range starts on {start} but ends on {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("could not read a UTC time from '{0}'")]
    UnparseableStartTime(String),

    #[error("no participant with id '{0}'")]
    ParticipantNotFound(String),

    #[error("the local participant cannot be removed")]
    LocalParticipantRemoval,
}

/// Failures talking to the external reasoning service. The gateway recovers
/// from all of them by ranking locally.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service answered with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("no answer within {0} seconds")]
    Timeout(u64),

    #[error("service returned no content")]
    EmptyResponse,

    #[error("malformed suggestion payload: {0}")]
    MalformedResponse(String),

    #[error("client error: {0}")]
    Client(String),
}
