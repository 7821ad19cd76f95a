use super::ArtworkId;

/// Transitions published by the generation poller.
#[derive(Clone, Debug, PartialEq)]
pub enum PollEvent {
    Progress(ArtworkId, Option<f64>),
    Completed(ArtworkId, Option<String>),
    Failed(ArtworkId, Option<String>),
    /// Nothing is left to track, the timer is gone.
    Idle(),
}
