use yew::prelude::*;

use crate::api::ApiClient;

#[derive(Properties, PartialEq, Clone)]
pub struct MediaLibraryProps {
    pub client: ApiClient,
    #[prop_or_default]
    pub on_unauthorized: Callback<()>,
}
