use adspend_core::CampaignId;
use time::{Date, OffsetDateTime};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("invalid period: end {end} is before start {start}")]
    InvalidPeriod {
        start: OffsetDateTime,
        end: OffsetDateTime,
    },

    #[error("campaign {0} not found")]
    UnknownCampaign(CampaignId),

    /// Days before `day` stay committed.
    #[error("storage failure on {day} after {generated} events were written")]
    Storage {
        day: Date,
        generated: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl GenerationError {
    /// Events committed before the run stopped.
    pub fn generated(&self) -> usize {
        match self {
            Self::Storage { generated, .. } => *generated,
            _ => 0,
        }
    }
}
