//! Per-query pipeline stages
//!
//! A run moves strictly forward through
//! Start → Retrieve → Assemble → Generate → Evaluate → Cost → Done.
//! Any other move is rejected.

use crate::errors::{BakeError, Result};
use serde::{Deserialize, Serialize};

/// Pipeline execution stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Query received, nothing done yet
    Start,

    /// Querying the ranked sources and fusing
    Retrieve,

    /// Rendering the generation prompt
    Assemble,

    /// Waiting on the answer model
    Generate,

    /// Waiting on the judge model
    Evaluate,

    /// Pricing both calls
    Cost,

    /// Record complete (terminal)
    Done,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 7] = [
        PipelineStage::Start,
        PipelineStage::Retrieve,
        PipelineStage::Assemble,
        PipelineStage::Generate,
        PipelineStage::Evaluate,
        PipelineStage::Cost,
        PipelineStage::Done,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done)
    }

    /// The only stage reachable from this one
    pub fn next(&self) -> Option<PipelineStage> {
        use PipelineStage::*;

        match self {
            Start => Some(Retrieve),
            Retrieve => Some(Assemble),
            Assemble => Some(Generate),
            Generate => Some(Evaluate),
            Evaluate => Some(Cost),
            Cost => Some(Done),
            Done => None,
        }
    }

    /// Validated move to `to`
    pub fn transition(&self, to: PipelineStage) -> Result<PipelineStage> {
        match self.next() {
            Some(next) if next == to => Ok(to),
            Some(next) => Err(BakeError::InvalidTransition {
                from: format!("{:?}", self),
                to: format!("{:?}", to),
                reason: format!("{:?} must be followed by {:?}", self, next),
            }),
            None => Err(BakeError::InvalidTransition {
                from: format!("{:?}", self),
                to: format!("{:?}", to),
                reason: "run already finished".to_string(),
            }),
        }
    }

    /// Advance in place
    pub fn advance(&mut self, to: PipelineStage) -> Result<()> {
        *self = self.transition(to)?;
        Ok(())
    }

    /// Human-readable stage name
    pub fn display_name(&self) -> &'static str {
        match self {
            PipelineStage::Start => "Starting",
            PipelineStage::Retrieve => "Searching recipes",
            PipelineStage::Assemble => "Building prompt",
            PipelineStage::Generate => "Writing answer",
            PipelineStage::Evaluate => "Judging relevance",
            PipelineStage::Cost => "Pricing",
            PipelineStage::Done => "Done",
        }
    }
}
