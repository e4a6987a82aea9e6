//! Posting casts, with optional channel tag resolution.
//!
//! A cast may target a channel either through an explicit `channel` field or
//! by starting its text with `/name`. The tag is resolved to the channel's
//! parent URL through Neynar unless the caller already supplied `parent`.

use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::ServiceError;
use crate::metrics;
use crate::neynar::NeynarClient;

const MAX_CHANNEL_ID_LEN: usize = 32;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastInput {
    #[serde(default)]
    pub signer_uuid: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedCast {
    pub hash: String,
    pub parent: Option<String>,
}

/// Validated cast request, ready to be sent.
#[derive(Debug)]
struct CastDraft {
    signer_uuid: String,
    text: String,
    parent: Option<String>,
    channel: Option<String>,
}

impl CastInput {
    fn validate(self) -> Result<CastDraft, ServiceError> {
        let signer_uuid = non_blank(self.signer_uuid);
        let text = self.content.filter(|c| !c.trim().is_empty());
        let (Some(signer_uuid), Some(text)) = (signer_uuid, text) else {
            return Err(ServiceError::Validation("Request body missing".into()));
        };

        let parent = non_blank(self.parent);
        // An explicit parent means no channel lookup, so the channel is not checked.
        let channel = match (&parent, non_blank(self.channel)) {
            (Some(_), _) => None,
            (None, Some(raw)) => Some(normalize_channel_id(&raw).ok_or_else(|| {
                ServiceError::Validation(format!("invalid channel: {raw}"))
            })?),
            (None, None) => parse_channel_tag(&text),
        };

        Ok(CastDraft { signer_uuid, text, parent, channel })
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Channel id from a leading `/name` token of the cast text.
pub fn parse_channel_tag(content: &str) -> Option<String> {
    let token = content.trim_start().split_whitespace().next()?;
    let name = token.strip_prefix('/')?;
    normalize_channel_id(name)
}

/// Lowercased channel id, with an optional leading `/`, or `None` if it is not a valid id.
pub fn normalize_channel_id(raw: &str) -> Option<String> {
    let id = raw.trim();
    let id = id.strip_prefix('/').unwrap_or(id).to_ascii_lowercase();
    let valid = !id.is_empty()
        && id.len() <= MAX_CHANNEL_ID_LEN
        && id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    valid.then_some(id)
}

/// Validate `input`, resolve its channel if needed, and publish it.
pub async fn post_cast(neynar: &NeynarClient, input: CastInput) -> Result<PostedCast, ServiceError> {
    let draft = input.validate()?;

    let parent = match (draft.parent, draft.channel.as_deref()) {
        (Some(parent), _) => Some(parent),
        (None, Some(channel)) => resolve_channel_parent(neynar, channel).await?,
        (None, None) => None,
    };

    let hash = neynar
        .publish_cast(&draft.signer_uuid, &draft.text, parent.as_deref())
        .await?;
    metrics::CASTS_TOTAL.inc();
    info!(event = "cast_sent", signer_uuid = %draft.signer_uuid, %hash, parent = ?parent, "cast published");
    Ok(PostedCast { hash, parent })
}

async fn resolve_channel_parent(
    neynar: &NeynarClient,
    channel: &str,
) -> Result<Option<String>, ServiceError> {
    match neynar.lookup_channel(channel).await? {
        Some(ch) => {
            let parent = ch.parent().map(str::to_string);
            if parent.is_none() {
                warn!(%channel, "channel has no parent url; posting without channel");
            }
            Ok(parent)
        }
        None => {
            warn!(%channel, "unknown channel; posting without channel");
            Ok(None)
        }
    }
}
