use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A query that replays the saved bpm range ran before any range was set.
    #[error("no bpm range has been requested yet")]
    RangeNotSet,

    #[error("invalid bpm range: {low} > {high}")]
    InvalidRange { low: u32, high: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
