//! Request sequencing for discarding stale responses
//!
//! Every outgoing request gets a tag from a monotonically increasing counter.
//! A response is only acted on if its tag is still the latest one issued.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Tag attached to one outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestTag(pub u64);

impl RequestTag {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Thread-safe issuer of request tags
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new tag, superseding all earlier ones
    pub fn issue(&self) -> RequestTag {
        RequestTag(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, tag: RequestTag) -> bool {
        self.latest.load(Ordering::SeqCst) == tag.0
    }

    /// Most recently issued tag, if any
    pub fn latest(&self) -> Option<RequestTag> {
        match self.latest.load(Ordering::SeqCst) {
            0 => None,
            n => Some(RequestTag(n)),
        }
    }
}
