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

/// Root of the consent screens hosted by the provider.
pub(crate) const OPEN_ENDPOINT: &str = "https://open.weixin.qq.com";
/// Root of the provider's `sns` API.
pub(crate) const API_ENDPOINT: &str = "https://api.weixin.qq.com";

pub(crate) const AUTHORIZE_PATH: &str = "/connect/oauth2/authorize";
pub(crate) const QRCONNECT_PATH: &str = "/connect/qrconnect";
pub(crate) const ACCESS_TOKEN_PATH: &str = "/sns/oauth2/access_token";
pub(crate) const REFRESH_TOKEN_PATH: &str = "/sns/oauth2/refresh_token";
pub(crate) const USERINFO_PATH: &str = "/sns/userinfo";
pub(crate) const VERIFY_PATH: &str = "/sns/auth";

/// Appended, unencoded, to every authorize URL.
pub(crate) const REDIRECT_FRAGMENT: &str = "wechat_redirect";

/// Silent authorization, only yields the subject id.
pub const SCOPE_BASE: &str = "snsapi_base";
/// Interactive authorization, grants access to the user profile.
pub const SCOPE_USERINFO: &str = "snsapi_userinfo";
/// Website (QR code) login.
pub const SCOPE_LOGIN: &str = "snsapi_login";

pub(crate) const DEFAULT_LANG: &str = "en";

pub(crate) const AUTHORIZATION_CODE_GRANT_TYPE: &str = "authorization_code";
pub(crate) const REFRESH_TOKEN_GRANT_TYPE: &str = "refresh_token";

/// Environment variable naming the deployment environment.
///
/// A value of `production` (case-insensitive) enables the warning about
/// keeping tokens in process memory.
pub const ENVIRONMENT_VAR: &str = "WECHAT_OAUTH_ENV";
pub(crate) const PRODUCTION: &str = "production";
