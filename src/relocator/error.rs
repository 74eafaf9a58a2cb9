use std::fmt;

use super::api::ApiError;

/// Workflow step a remote failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    FetchReference,
    ScanHistory,
    ResolveForum,
    CreateThread,
    PostGuidance,
    Notify,
    Log,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FetchReference => "fetching the replied-to message",
            Self::ScanHistory => "reading channel history",
            Self::ResolveForum => "resolving the support forum",
            Self::CreateThread => "creating the support thread",
            Self::PostGuidance => "posting the guidance embed",
            Self::Notify => "notifying the origin channel",
            Self::Log => "posting the relocation log",
        };
        f.write_str(name)
    }
}

/// Why a relocation did not complete.
#[derive(Debug)]
pub enum RelocationError {
    /// The trigger carried no reply reference.
    ReferenceMissing,
    /// The configured support forum does not exist.
    ForumUnavailable { channel_id: u64 },
    /// The configured support channel is not a forum.
    NotAForum { channel_id: u64 },
    /// A remote call failed.
    Api { step: Step, source: ApiError },
}

impl RelocationError {
    pub fn api(step: Step) -> impl FnOnce(ApiError) -> Self {
        move |source| Self::Api { step, source }
    }
}

impl fmt::Display for RelocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReferenceMissing => write!(f, "trigger message is not a reply"),
            Self::ForumUnavailable { channel_id } => {
                write!(f, "Support channel with ID {channel_id} not found")
            }
            Self::NotAForum { channel_id } => {
                write!(f, "Support channel with ID {channel_id} is not a forum channel")
            }
            Self::Api { step, source } => write!(f, "{step} failed: {source}"),
        }
    }
}

impl std::error::Error for RelocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api { source, .. } => Some(source),
            _ => None,
        }
    }
}
