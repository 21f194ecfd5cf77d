//! Response sequence tracking for the host side of the link
//!
//! The stage stamps every response with a wrapping 16-bit counter. A host
//! feeds the counters it receives into [`SequenceTracker`] to learn how many
//! responses were lost in between.

/// Result of observing one sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceCheck {
    /// First response seen since creation or reset
    First,
    /// Exactly one more than the previous response
    InOrder,
    /// Responses were lost between the previous and this one
    Gap { missed: u16 },
    /// Same sequence number as the previous response
    Duplicate,
}

/// Tracks the last sequence number seen and counts lost responses
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    last: Option<u16>,
    missed_total: u32,
}

impl SequenceTracker {
    /// Create a tracker that has not seen any response
    pub const fn new() -> Self {
        Self {
            last: None,
            missed_total: 0,
        }
    }

    /// Forget the previous sequence number (e.g. after reconnecting)
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Observe the sequence number of a received response
    pub fn observe(&mut self, sequence: u16) -> SequenceCheck {
        let check = match self.last {
            None => SequenceCheck::First,
            Some(last) if last == sequence => SequenceCheck::Duplicate,
            Some(last) => match sequence.wrapping_sub(last) {
                1 => SequenceCheck::InOrder,
                delta => {
                    let missed = delta - 1;
                    self.missed_total = self.missed_total.saturating_add(missed as u32);
                    SequenceCheck::Gap { missed }
                }
            },
        };
        self.last = Some(sequence);
        check
    }

    /// Last sequence number observed
    pub fn last(&self) -> Option<u16> {
        self.last
    }

    /// Total responses lost since creation
    pub fn missed_total(&self) -> u32 {
        self.missed_total
    }
}
