use yew::prelude::*;

use crate::api::ApiClient;

#[derive(Properties, PartialEq, Clone)]
pub struct AdminDashboardProps {
    /// Client carrying the admin's token.
    pub client: ApiClient,
    /// Fired when the backend rejects the token, so the shell can sign out.
    #[prop_or_default]
    pub on_unauthorized: Callback<()>,
}
