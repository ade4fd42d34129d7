//! Sign-in against a local stand-in for the storefront cart API.

use std::{io, num::NonZeroU32, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header::CONTENT_TYPE},
    routing::{get, post},
};
use buybin::products::Product;
use buybin_app::{
    identity::{SignedInUser, UserId},
    manager::{CartManager, Transition},
    remote::HttpCartStore,
    storage::{DEFAULT_CART_KEY, GuestCartStore, InMemoryKeyValueStore},
};
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde_json::Value;
use testresult::TestResult;
use tokio::{net::TcpListener, sync::Mutex, task::JoinHandle};

#[derive(Clone)]
struct ApiState {
    cart_body: &'static str,
    saved: Arc<Mutex<Vec<Value>>>,
}

async fn fetch_cart(
    State(state): State<ApiState>,
    Path(_user_id): Path<String>,
) -> ([(axum::http::HeaderName, &'static str); 1], &'static str) {
    ([(CONTENT_TYPE, "application/json")], state.cart_body)
}

async fn save_cart(State(state): State<ApiState>, Json(body): Json<Value>) -> StatusCode {
    state.saved.lock().await.push(body);

    StatusCode::OK
}

/// Cart API answering every fetch with a fixed body.
struct CartApi {
    base_url: Url,
    saved: Arc<Mutex<Vec<Value>>>,
    server: JoinHandle<io::Result<()>>,
}

impl CartApi {
    async fn start(cart_body: &'static str) -> TestResult<Self> {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let state = ApiState {
            cart_body,
            saved: saved.clone(),
        };

        let app = Router::new()
            .route("/api/cart/save", post(save_cart))
            .route("/api/cart/{user_id}", get(fetch_cart))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = Url::parse(&format!("http://{}/", listener.local_addr()?))?;
        let server = tokio::spawn(async move { axum::serve(listener, app).await });

        Ok(Self {
            base_url,
            saved,
            server,
        })
    }

    fn manager(&self) -> TestResult<CartManager> {
        let guest = GuestCartStore::new(Arc::new(InMemoryKeyValueStore::new()), DEFAULT_CART_KEY);
        let remote = HttpCartStore::with_client(self.base_url.clone(), Client::new())?;

        Ok(CartManager::spawn(guest, Arc::new(remote)))
    }

    async fn saved(&self) -> Vec<Value> {
        self.saved.lock().await.clone()
    }
}

impl Drop for CartApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn sign_in_with_guest_line(api: &CartApi) -> TestResult<(CartManager, Transition)> {
    let manager = api.manager()?;
    manager
        .add_to_cart(Product::new("X", Decimal::from(4)), NonZeroU32::MIN)
        .await?;

    let transition = manager
        .on_auth_change(Some(SignedInUser::with_token("u1", "token-u1")))
        .await?;
    manager.flush().await?;

    Ok((manager, transition))
}

#[tokio::test]
async fn null_cart_items_sign_in_with_the_guest_cart() -> TestResult {
    let api = CartApi::start(r#"{"cartItems":null}"#).await?;

    let (manager, transition) = sign_in_with_guest_line(&api).await?;

    assert_eq!(transition, Transition::SignedIn);
    assert_eq!(manager.state().user(), Some(&UserId::from("u1")));
    assert_eq!(manager.cart_items().len(), 1);

    let saved = api.saved().await;
    let body = saved.last().ok_or("nothing saved")?;
    assert_eq!(body["userId"], "u1");
    assert_eq!(body["cartItems"][0]["id"], "X");

    Ok(())
}

#[tokio::test]
async fn null_body_is_an_empty_account_cart() -> TestResult {
    let api = CartApi::start("null").await?;

    let (manager, transition) = sign_in_with_guest_line(&api).await?;

    assert_eq!(transition, Transition::SignedIn);
    assert_eq!(manager.cart_items().len(), 1);

    Ok(())
}

#[tokio::test]
async fn undecodable_account_lines_are_dropped_on_sign_in() -> TestResult {
    let api = CartApi::start(
        r#"{"cartItems":[{"id":"Y","quantity":2,"price":5},{"id":"Z","quantity":1}]}"#,
    )
    .await?;

    let (manager, transition) = sign_in_with_guest_line(&api).await?;

    assert_eq!(transition, Transition::SignedIn);

    let ids: Vec<_> = manager
        .cart_items()
        .iter()
        .map(|line| line.product_id().to_string())
        .collect();
    assert_eq!(ids, ["Y", "X"]);

    Ok(())
}
