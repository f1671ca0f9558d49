// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end tests for the authorization code flow, using only the public
//! API of the crate.

use httptest::matchers::{all_of, contains, request, url_decoded};
use httptest::responders::json_encoded;
use httptest::{Expectation, Server};
use serde_json::json;
use std::sync::Arc;
use wechat_oauth::Builder;
use wechat_oauth::Result;
use wechat_oauth::store::{InMemoryTokenStore, TokenStore};
use wechat_oauth::token::Token;
use wechat_oauth::user::UserRequest;

type TestResult = anyhow::Result<()>;

const OPENID: &str = "o6_bmjrPTlm6_2sgVt7hMZOPfL2M";

fn profile() -> serde_json::Value {
    json!({
        "openid": OPENID,
        "nickname": "Band",
        "sex": 1,
        "province": "Guangdong",
        "city": "Guangzhou",
        "country": "CN",
        "headimgurl": "http://thirdwx.qlogo.cn/mmopen/46",
        "privilege": [],
        "unionid": "o6_bmasdasdsad6_2sgVt7hMZOPfL"
    })
}

// Stores tokens in a shared table, as an application would with a database.
#[derive(Debug, Default)]
struct SharedTable {
    inner: InMemoryTokenStore,
}

#[async_trait::async_trait]
impl TokenStore for SharedTable {
    async fn get(&self, openid: &str) -> Result<Option<Token>> {
        self.inner.get(openid).await
    }
    async fn set(&self, openid: &str, token: Token) -> Result<()> {
        self.inner.set(openid, token).await
    }
}

#[tokio::test]
async fn authorization_code_flow() -> TestResult {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/sns/oauth2/access_token"),
            request::query(url_decoded(contains(("code", "auth-code")))),
        ])
        .times(1)
        .respond_with(json_encoded(json!({
            "access_token": "ACCESS_TOKEN",
            "expires_in": 7200,
            "refresh_token": "REFRESH_TOKEN",
            "openid": OPENID,
            "scope": "snsapi_userinfo"
        }))),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/sns/userinfo"),
            request::query(url_decoded(contains(("access_token", "ACCESS_TOKEN")))),
            request::query(url_decoded(contains(("lang", "zh_CN")))),
        ])
        .times(1)
        .respond_with(json_encoded(profile())),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/sns/auth"),
            request::query(url_decoded(contains(("access_token", "ACCESS_TOKEN")))),
        ])
        .times(1)
        .respond_with(json_encoded(json!({"errcode": 0, "errmsg": "ok"}))),
    );

    let store = Arc::new(SharedTable::default());
    let client = Builder::new("test-appid", "test-secret")
        .with_store(store.clone())
        .with_api_endpoint(format!("http://{}", server.addr()))
        .build();

    let url = client.authorize_url(
        "https://example.com/callback",
        Some("xyz"),
        Some(wechat_oauth::constants::SCOPE_USERINFO),
    );
    assert!(url.contains("scope=snsapi_userinfo"), "{url}");
    assert!(url.ends_with("#wechat_redirect"), "{url}");

    let token = client.exchange_code("auth-code").await?;
    assert_eq!(token.openid, OPENID);
    assert!(token.is_valid(), "{token:?}");

    // A second client sharing the store sees the token.
    let other = client.clone();
    let user = other
        .get_user(UserRequest::new(OPENID).with_lang("zh_CN"))
        .await?;
    assert_eq!(user.nickname, "Band");
    assert_eq!(user.sex, Some(1));
    assert_eq!(user.unionid.as_deref(), Some("o6_bmasdasdsad6_2sgVt7hMZOPfL"));

    assert!(client.verify_token(OPENID, &token.access_token).await?);
    assert_eq!(store.get(OPENID).await?, Some(token));
    Ok(())
}

#[tokio::test]
async fn expired_token_is_refreshed() -> TestResult {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/sns/oauth2/refresh_token"),
            request::query(url_decoded(contains(("refresh_token", "OLD_REFRESH_TOKEN")))),
        ])
        .times(1)
        .respond_with(json_encoded(json!({
            "access_token": "NEW_ACCESS_TOKEN",
            "expires_in": 7200,
            "refresh_token": "NEW_REFRESH_TOKEN",
            "openid": OPENID,
            "scope": "snsapi_userinfo"
        }))),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/sns/userinfo"),
            request::query(url_decoded(contains(("access_token", "NEW_ACCESS_TOKEN")))),
        ])
        .times(2)
        .respond_with(json_encoded(profile())),
    );

    // Tokens persisted by a previous process, two hours and one minute ago.
    let stored = serde_json::from_value::<Token>(json!({
        "access_token": "OLD_ACCESS_TOKEN",
        "expires_in": 7200,
        "refresh_token": "OLD_REFRESH_TOKEN",
        "openid": OPENID,
        "scope": "snsapi_userinfo",
        "create_at": chrono::Utc::now().timestamp_millis() - 7_260_000
    }))?;
    assert!(!stored.is_valid(), "{stored:?}");
    let store = Arc::new(InMemoryTokenStore::new());
    store.set(OPENID, stored).await?;

    let client = Builder::new("test-appid", "test-secret")
        .with_store(store.clone())
        .with_api_endpoint(format!("http://{}", server.addr()))
        .build();

    let user = client.get_user(UserRequest::new(OPENID)).await?;
    assert_eq!(user.openid, OPENID);
    // The refreshed token is reused.
    let user = client.get_user(UserRequest::new(OPENID)).await?;
    assert_eq!(user.city, "Guangzhou");

    let token = client.token(OPENID).await?.expect("token is stored");
    assert_eq!(token.access_token, "NEW_ACCESS_TOKEN");
    assert_eq!(token.refresh_token.as_deref(), Some("NEW_REFRESH_TOKEN"));
    Ok(())
}

#[tokio::test]
async fn unknown_subject() -> TestResult {
    let client = Builder::new("test-appid", "test-secret")
        .with_store(InMemoryTokenStore::new())
        .build();
    let err = client
        .get_user(UserRequest::new("unknown"))
        .await
        .unwrap_err();
    assert!(err.is_no_token(), "{err:?}");
    assert!(!err.is_remote(), "{err:?}");
    Ok(())
}
