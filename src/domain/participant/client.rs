//! Participants sub-client: paginated listing and count refresh.

use crate::client::GiveawayClient;
use crate::domain::participant::ParticipantPage;
use crate::error::SdkError;
use crate::shared::GiveawayId;

/// Sub-client for participant operations.
pub struct Participants<'a> {
    pub(crate) client: &'a GiveawayClient,
}

impl<'a> Participants<'a> {
    pub async fn list(
        &self,
        giveaway_id: &GiveawayId,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ParticipantPage, SdkError> {
        let resp = self
            .client
            .http
            .get_participants(giveaway_id, page, limit)
            .await?;
        Ok(resp.into())
    }

    /// Server-side participant count.
    pub async fn count(&self, giveaway_id: &GiveawayId) -> Result<u64, SdkError> {
        Ok(self.client.http.get_participant_count(giveaway_id).await?.count)
    }

    /// Fetch the count and feed it to the store if `giveaway_id` is still tracked.
    ///
    /// Useful after a reconnect, when live increments may have been missed.
    pub async fn refresh_count(&self, giveaway_id: &GiveawayId) -> Result<u64, SdkError> {
        let count = self.count(giveaway_id).await?;
        if self.client.store.active_id().as_ref() == Some(giveaway_id) {
            self.client.store.update_participant_count(count);
        }
        Ok(count)
    }
}
