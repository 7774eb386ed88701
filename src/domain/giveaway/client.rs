//! Giveaways sub-client: active snapshot, lookup, create, finish calls.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::client::GiveawayClient;
use crate::domain::giveaway::wire::{CreateGiveawayRequest, FinishMessagesRequest};
use crate::domain::giveaway::{ActiveGiveaway, FinishMessages, GiveawayBackend, Winner};
use crate::error::SdkError;
use crate::shared::{AccountId, GiveawayId};

/// Sub-client for giveaway operations.
pub struct Giveaways<'a> {
    pub(crate) client: &'a GiveawayClient,
}

impl<'a> Giveaways<'a> {
    /// Fetch the account's active giveaway. Does not touch the store.
    pub async fn active(&self, account_id: &AccountId) -> Result<Option<ActiveGiveaway>, SdkError> {
        let resp = self.client.http.get_active_giveaway(account_id).await?;
        Ok(resp.map(ActiveGiveaway::try_from).transpose()?)
    }

    /// Fetch the active giveaway and make it the tracked one (or clear the store).
    pub async fn load_active(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<ActiveGiveaway>, SdkError> {
        let snapshot = self.active(account_id).await?;
        match &snapshot {
            Some(g) => self.client.store.set_active_giveaway(g.clone()),
            None => self.client.store.clear_active_giveaway(),
        }
        Ok(snapshot)
    }

    pub async fn get(&self, giveaway_id: &GiveawayId) -> Result<ActiveGiveaway, SdkError> {
        let resp = self.client.http.get_giveaway(giveaway_id).await?;
        Ok(ActiveGiveaway::try_from(resp)?)
    }

    /// Create a giveaway. The new giveaway becomes the tracked one.
    pub async fn create(&self, request: CreateGiveawayRequest) -> Result<ActiveGiveaway, SdkError> {
        if request.name.trim().is_empty() {
            return Err(SdkError::Validation("giveaway name is empty".to_string()));
        }
        if request.winners_count == 0 {
            return Err(SdkError::Validation(
                "winners_count must be at least 1".to_string(),
            ));
        }

        let resp = self.client.http.create_giveaway(&request).await?;
        let giveaway = ActiveGiveaway::try_from(resp)?;
        tracing::info!(giveaway_id = %giveaway.id, name = %giveaway.name, "Giveaway created");
        self.client.store.set_active_giveaway(giveaway.clone());
        Ok(giveaway)
    }

    /// Raw persist call. Prefer the finish workflow, which also flips `messages_ready`.
    pub async fn persist_finish_messages(
        &self,
        giveaway_id: &GiveawayId,
        messages: &FinishMessages,
    ) -> Result<(), SdkError> {
        let body = FinishMessagesRequest::from(messages);
        self.client
            .http
            .put_finish_messages(giveaway_id, &body)
            .await?;
        Ok(())
    }

    /// Raw finish call. Prefer the finish workflow, which also updates the store.
    pub async fn finish(&self, giveaway_id: &GiveawayId) -> Result<Vec<Winner>, SdkError> {
        let resp = self.client.http.finish_giveaway(giveaway_id).await?;
        Ok(resp.winners.into_iter().map(Winner::from).collect())
    }
}

impl GiveawayBackend for GiveawayClient {
    fn fetch_active_giveaway<'a>(
        &'a self,
        account_id: &'a AccountId,
    ) -> BoxFuture<'a, Result<Option<ActiveGiveaway>, SdkError>> {
        async move { self.giveaways().active(account_id).await }.boxed()
    }

    fn persist_finish_messages<'a>(
        &'a self,
        giveaway_id: &'a GiveawayId,
        messages: &'a FinishMessages,
    ) -> BoxFuture<'a, Result<(), SdkError>> {
        async move {
            self.giveaways()
                .persist_finish_messages(giveaway_id, messages)
                .await
        }
        .boxed()
    }

    fn finish_giveaway<'a>(
        &'a self,
        giveaway_id: &'a GiveawayId,
    ) -> BoxFuture<'a, Result<Vec<Winner>, SdkError>> {
        async move { self.giveaways().finish(giveaway_id).await }.boxed()
    }
}
