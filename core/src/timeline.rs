//! Timelines: the undo scope for mutating calls.
//!
//! A session creates its timeline on first use. Cutting it only forgets the
//! id locally, so the next mutating call starts a fresh timeline and earlier
//! operations can no longer be undone through it.

use tracing::debug;

use crate::client::METHOD_CREATE_TIMELINE;
use crate::context::Context;
use crate::error::Result;
use crate::session::Session;
use crate::types::TimelineCreated;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    id: String,
}

impl Timeline {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Session {
    /// Create a new timeline without storing it on the session.
    pub fn create_timeline(&self, ctx: &Context) -> Result<Timeline> {
        let client = self.client()?;
        let request = client.build_create_timeline(self.token());
        let created: TimelineCreated = client.call(ctx, METHOD_CREATE_TIMELINE, request)?;
        Ok(Timeline {
            id: created.timeline,
        })
    }

    /// The session's timeline, created on first access.
    pub fn timeline(&mut self, ctx: &Context) -> Result<&Timeline> {
        let timeline = match self.timeline.take() {
            Some(timeline) => timeline,
            None => {
                let timeline = self.create_timeline(ctx)?;
                debug!(timeline = timeline.id(), "timeline created");
                timeline
            }
        };
        let timeline: &Timeline = self.timeline.insert(timeline);
        Ok(timeline)
    }

    pub fn current_timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    /// Forget the current timeline. No remote call is made.
    pub fn cut_timeline(&mut self) -> Option<Timeline> {
        self.timeline.take()
    }
}
