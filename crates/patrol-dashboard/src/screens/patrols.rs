use futures::{future::BoxFuture, FutureExt as _};
use patrol_client_core::{Client, RequestError};
use patrol_shared::{
    errors::ValidationError,
    id::EntityId,
    paging::{ListQuery, PagedResult},
    patrol::{Patrol, PatrolForm},
};

use super::{CrudEntity, MutationFuture};

impl CrudEntity for Patrol {
    type Form = PatrolForm;

    const LABEL: &'static str = "Patrulla";
    const ALLOWS_VIEW: bool = false;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn new_form() -> Self::Form {
        PatrolForm::new_for_create()
    }

    fn edit_form(&self) -> Self::Form {
        PatrolForm::from_patrol(self)
    }

    fn list(
        client: &Client,
        query: ListQuery,
    ) -> BoxFuture<'static, Result<PagedResult<Self>, RequestError>> {
        let client = client.clone();
        async move { client.list_patrols(&query).await }.boxed()
    }

    fn create(client: &Client, form: &Self::Form) -> Result<MutationFuture, ValidationError> {
        let draft = form.to_draft()?;
        let client = client.clone();
        Ok(async move { client.create_patrol(&draft).await }.boxed())
    }

    /// The code is left out, it cannot change after creation
    fn update(
        client: &Client,
        id: &EntityId,
        form: &Self::Form,
    ) -> Result<MutationFuture, ValidationError> {
        let patch = form.to_patch();
        let client = client.clone();
        let id = id.clone();
        Ok(async move { client.update_patrol(&id, &patch).await }.boxed())
    }

    fn delete(client: &Client, id: &EntityId) -> MutationFuture {
        let client = client.clone();
        let id = id.clone();
        async move { client.delete_patrol(&id).await }.boxed()
    }
}
