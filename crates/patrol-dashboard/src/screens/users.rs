use futures::{future::BoxFuture, FutureExt as _};
use patrol_client_core::{Client, RequestError};
use patrol_shared::{
    const_config::client::screens::SCREEN_FALLBACK_ROLES,
    errors::ValidationError,
    id::EntityId,
    paging::{ListQuery, PagedResult},
    user::{User, UserForm},
};

use super::{CrudEntity, MutationFuture};

impl CrudEntity for User {
    type Form = UserForm;

    const LABEL: &'static str = "Usuario";
    const ALLOWS_VIEW: bool = true;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn new_form() -> Self::Form {
        UserForm::new_for_create(SCREEN_FALLBACK_ROLES[0])
    }

    fn edit_form(&self) -> Self::Form {
        UserForm::from_user(self)
    }

    fn list(
        client: &Client,
        query: ListQuery,
    ) -> BoxFuture<'static, Result<PagedResult<Self>, RequestError>> {
        let client = client.clone();
        async move { client.list_users(&query).await }.boxed()
    }

    fn create(client: &Client, form: &Self::Form) -> Result<MutationFuture, ValidationError> {
        let draft = form.to_draft()?;
        let client = client.clone();
        Ok(async move { client.create_user(&draft).await }.boxed())
    }

    fn update(
        client: &Client,
        id: &EntityId,
        form: &Self::Form,
    ) -> Result<MutationFuture, ValidationError> {
        let patch = form.to_patch()?;
        let client = client.clone();
        let id = id.clone();
        Ok(async move { client.update_user(&id, &patch).await }.boxed())
    }

    fn delete(client: &Client, id: &EntityId) -> MutationFuture {
        let client = client.clone();
        let id = id.clone();
        async move { client.delete_user(&id).await }.boxed()
    }
}
