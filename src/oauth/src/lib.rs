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

//! WeChat OAuth 2.0 client.
//!
//! This crate implements the authorization code flow used by WeChat official
//! accounts and website applications. Applications redirect users to a
//! consent screen, exchange the returned code for an access token, and use
//! that token to read the user's profile.
//!
//! Tokens are saved in a [TokenStore][store::TokenStore], keyed by the
//! subject's `openid`. Applications running more than one process should
//! provide a shared store, such as a database table. The client refreshes
//! expired tokens on demand and saves the new token in the store.
//!
//! Start with [Builder] to create a [Client].

/// Endpoints, scopes, and other values defined by the provider.
pub mod constants;

pub mod client;
pub mod errors;

pub mod store;

pub mod token;

pub mod transport;

pub mod user;

pub use client::{Builder, Client};

/// A `Result` alias where the `Err` case is `wechat_oauth::errors::Error`.
pub type Result<T> = std::result::Result<T, crate::errors::Error>;
