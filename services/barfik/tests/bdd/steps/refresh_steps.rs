//! BDD step definitions for the token refresh feature

use std::sync::atomic::Ordering;
use std::sync::Arc;

use cucumber::{given, then, when};

use barfik::api::{AnimalFilter, Api};
use barfik::session::TokenStore;
use barfik::{ApiClient, BarfikError, Config};

use crate::world::{BarfikWorld, ExpiringBackend, RecordingNavigator};

fn expired_session(world: &mut BarfikWorld, refresh_token: Option<&str>) {
    let tokens = TokenStore::in_memory();
    tokens.set_access_token("expired");
    if let Some(refresh_token) = refresh_token {
        tokens.set_refresh_token(refresh_token);
    }
    world.tokens = Some(tokens);
}

#[given("an expired session with a valid refresh token")]
fn expired_with_valid_refresh(world: &mut BarfikWorld) {
    expired_session(world, Some("refresh-ok"));
    world.refresh_accepted = true;
}

#[given("an expired session with a revoked refresh token")]
fn expired_with_revoked_refresh(world: &mut BarfikWorld) {
    expired_session(world, Some("refresh-revoked"));
    world.refresh_accepted = false;
}

#[given("an expired session without a refresh token")]
fn expired_without_refresh(world: &mut BarfikWorld) {
    expired_session(world, None);
    world.refresh_accepted = false;
}

#[when(expr = "{int} request(s) is/are sent at the same time")]
async fn requests_sent(world: &mut BarfikWorld, count: usize) {
    let backend = Arc::new(ExpiringBackend::new(count, world.refresh_accepted));
    let navigator = Arc::new(RecordingNavigator::default());
    let tokens = world.tokens.clone().expect("session not set up");
    let client = ApiClient::new(
        &Config::default(),
        Arc::clone(&backend) as _,
        tokens,
        Arc::clone(&navigator) as _,
    );
    let api = Api::new(Arc::new(client));

    let handles: Vec<_> = (0..count)
        .map(|_| {
            let api = api.clone();
            tokio::spawn(async move {
                api.list_animals(&AnimalFilter::default())
                    .await
                    .map(|_| ())
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.expect("request task panicked"));
    }

    world.results = results;
    world.backend = Some(backend);
    world.navigator = Some(navigator);
    world.api = Some(api);
}

#[then("exactly one refresh call is made")]
fn one_refresh_call(world: &mut BarfikWorld) {
    let backend = world.backend.as_ref().expect("no backend");
    assert_eq!(backend.refresh_calls(), 1);
}

#[then("no refresh call is made")]
fn no_refresh_call(world: &mut BarfikWorld) {
    let backend = world.backend.as_ref().expect("no backend");
    assert_eq!(backend.refresh_calls(), 0);
}

#[then("every request succeeds with the renewed token")]
fn all_succeed(world: &mut BarfikWorld) {
    assert!(world.results.iter().all(|r| r.is_ok()), "{:?}", world.results);
    let backend = world.backend.as_ref().expect("no backend");
    let retried = backend.retried_with.lock().unwrap();
    assert_eq!(retried.len(), world.results.len());
    assert!(retried.iter().all(|token| token == "renewed"));
}

#[then("every request fails with an expired session")]
fn all_fail(world: &mut BarfikWorld) {
    assert!(world
        .results
        .iter()
        .all(|r| matches!(r, Err(BarfikError::SessionExpired(_)))));
}

#[then("the stored tokens are cleared")]
fn tokens_cleared(world: &mut BarfikWorld) {
    let tokens = world.tokens.as_ref().expect("session not set up");
    assert!(tokens.access_token().is_none());
    assert!(tokens.refresh_token().is_none());
}

#[then("the renewed access token is stored")]
fn token_stored(world: &mut BarfikWorld) {
    let tokens = world.tokens.as_ref().expect("session not set up");
    assert_eq!(tokens.access_token().as_deref(), Some("renewed"));
}

#[then("the user is sent to the login page")]
fn redirected(world: &mut BarfikWorld) {
    let navigator = world.navigator.as_ref().expect("no navigator");
    assert!(navigator.redirects.load(Ordering::SeqCst) >= 1);
}

#[then("the refresh flow is idle again")]
async fn refresh_idle(world: &mut BarfikWorld) {
    let api = world.api.as_ref().expect("no api");
    assert_eq!(
        api.client().refresh_coordinator().state().await,
        barfik::refresh::RefreshState::Idle
    );
}
