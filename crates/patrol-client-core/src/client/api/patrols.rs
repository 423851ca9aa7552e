use patrol_shared::{
    const_config::path::{
        PATH_PATROL, PATH_PATROLS, PATH_PATROLS_CREATE, PATH_PATROL_DELETE, PATH_PATROL_UPDATE,
    },
    id::EntityId,
    paging::{ListQuery, PagedResult},
    patrol::{Patrol, PatrolDraft, PatrolPatch},
};

use crate::{client::NO_QUERY, errors::RequestError, Client};

impl Client {
    #[tracing::instrument]
    pub async fn list_patrols(
        &self,
        query: &ListQuery,
    ) -> Result<PagedResult<Patrol>, RequestError> {
        let body = self
            .request(&PATH_PATROLS, &query.as_query_pairs(), None)
            .await?;
        Ok(PagedResult::from_wire(&body, query, Patrol::from_wire))
    }

    #[tracing::instrument]
    pub async fn get_patrol(&self, id: &EntityId) -> Result<Patrol, RequestError> {
        let body = self
            .request(&PATH_PATROL.with_id(id), NO_QUERY, None)
            .await?;
        Patrol::from_single_wire(&body)
            .ok_or_else(|| RequestError::Decode("patrol record without an id".to_string()))
    }

    #[tracing::instrument]
    pub async fn create_patrol(&self, draft: &PatrolDraft) -> Result<(), RequestError> {
        self.request_json(&PATH_PATROLS_CREATE, draft).await?;
        Ok(())
    }

    #[tracing::instrument]
    pub async fn update_patrol(
        &self,
        id: &EntityId,
        patch: &PatrolPatch,
    ) -> Result<(), RequestError> {
        self.request_json(&PATH_PATROL_UPDATE.with_id(id), patch)
            .await?;
        Ok(())
    }

    #[tracing::instrument]
    pub async fn delete_patrol(&self, id: &EntityId) -> Result<(), RequestError> {
        self.request(&PATH_PATROL_DELETE.with_id(id), NO_QUERY, None)
            .await?;
        Ok(())
    }
}
