use patrol_shared::{
    const_config::{
        client::screens::SCREEN_FALLBACK_ROLES,
        path::{
            PATH_USER, PATH_USERS, PATH_USERS_CREATE, PATH_USERS_ROLES, PATH_USER_DELETE,
            PATH_USER_UPDATE,
        },
    },
    id::EntityId,
    paging::{ListQuery, PagedResult},
    user::{roles_from_wire, User, UserDraft, UserPatch},
};

use crate::{client::NO_QUERY, errors::RequestError, Client};

impl Client {
    #[tracing::instrument]
    pub async fn list_users(&self, query: &ListQuery) -> Result<PagedResult<User>, RequestError> {
        let body = self
            .request(&PATH_USERS, &query.as_query_pairs(), None)
            .await?;
        Ok(PagedResult::from_wire(&body, query, User::from_wire))
    }

    #[tracing::instrument]
    pub async fn get_user(&self, id: &EntityId) -> Result<User, RequestError> {
        let body = self.request(&PATH_USER.with_id(id), NO_QUERY, None).await?;
        User::from_single_wire(&body)
            .ok_or_else(|| RequestError::Decode("user record without an id".to_string()))
    }

    #[tracing::instrument]
    pub async fn create_user(&self, draft: &UserDraft) -> Result<(), RequestError> {
        self.request_json(&PATH_USERS_CREATE, draft).await?;
        Ok(())
    }

    #[tracing::instrument]
    pub async fn update_user(&self, id: &EntityId, patch: &UserPatch) -> Result<(), RequestError> {
        self.request_json(&PATH_USER_UPDATE.with_id(id), patch)
            .await?;
        Ok(())
    }

    #[tracing::instrument]
    pub async fn delete_user(&self, id: &EntityId) -> Result<(), RequestError> {
        self.request(&PATH_USER_DELETE.with_id(id), NO_QUERY, None)
            .await?;
        Ok(())
    }

    /// Role catalogue for the user editor. Falls back to the built in list
    /// unless the session has expired
    #[tracing::instrument]
    pub async fn list_roles(&self) -> Result<Vec<String>, RequestError> {
        let fallback = || SCREEN_FALLBACK_ROLES.map(String::from).to_vec();
        match self.request(&PATH_USERS_ROLES, NO_QUERY, None).await {
            Ok(body) => Ok(roles_from_wire(&body).unwrap_or_else(fallback)),
            Err(RequestError::Unauthenticated) => Err(RequestError::Unauthenticated),
            Err(e) => {
                tracing::warn!(?e, "using built in roles");
                Ok(fallback())
            }
        }
    }
}
