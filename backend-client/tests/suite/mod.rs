use std::sync::Arc;

use prospector_backend_client::BackendClient;
use prospector_backend_client::TokenStore;
use wiremock::MockServer;

mod session_recovery;

pub(crate) fn token_store(access: Option<&str>, refresh: Option<&str>) -> Arc<TokenStore> {
    let store = TokenStore::ephemeral();
    store
        .set(access.map(str::to_string), refresh.map(str::to_string))
        .expect("ephemeral store accepts tokens");
    Arc::new(store)
}

pub(crate) fn client_for(server: &MockServer, tokens: Arc<TokenStore>) -> BackendClient {
    BackendClient::new(server.uri(), tokens).expect("client builds")
}
