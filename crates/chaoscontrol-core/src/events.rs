//! Engine-to-UI signals.
//!
//! The engine emits plain events; presentation (toast, confetti, chime) is
//! entirely the embedder's business. The day-cleared quip text is picked
//! here because it is spec-level content, but nothing is rendered.

use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Quips for the day-cleared celebration.
pub const QUIPS: [&str; 4] = [
    "All done — look at you, a responsible tornado.",
    "Everything finished. The productivity gods are mildly impressed.",
    "Gold star earned. HR can’t ding you for today.",
    "You cleared the board. Treat yo’ self.",
];

/// Pick a celebration quip at random.
pub fn pick_quip() -> &'static str {
    QUIPS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(QUIPS[0])
}

/// Every engine-side state change of interest produces an Event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TaskPlaced {
        id: String,
        date: NaiveDate,
        start_minute: u32,
        at: DateTime<Utc>,
    },
    /// A lower-priority flexible task was displaced to make room.
    TaskBumped {
        id: String,
        bumped_by: String,
        bump_count: u32,
        at: DateTime<Utc>,
    },
    TaskUnplaced {
        id: String,
        at: DateTime<Utc>,
    },
    /// Every placed task for the day is completed. Emitted at most once per
    /// day and calendar filter; `chime` asks the UI for an audio cue.
    DayCleared {
        date: NaiveDate,
        quip: String,
        chime: bool,
        at: DateTime<Utc>,
    },
}
