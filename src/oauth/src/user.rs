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

//! Request and response types for the profile endpoint.

use crate::constants::DEFAULT_LANG;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Identifies the profile to fetch.
///
/// # Example
/// ```
/// # use wechat_oauth::user::UserRequest;
/// let request = UserRequest::new("OPENID").with_lang("zh_CN");
/// assert_eq!(request.lang(), "zh_CN");
/// assert_eq!(UserRequest::new("OPENID").lang(), "en");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct UserRequest {
    openid: String,
    lang: Option<String>,
}

impl UserRequest {
    /// Creates a request for the profile of `openid`.
    pub fn new<T: Into<String>>(openid: T) -> Self {
        Self {
            openid: openid.into(),
            lang: None,
        }
    }

    /// Sets the language of the localized profile fields, such as `country`.
    ///
    /// Defaults to `en`. The provider accepts `zh_CN`, `zh_TW`, and `en`.
    pub fn with_lang<T: Into<String>>(mut self, lang: T) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// The subject whose profile is requested.
    pub fn openid(&self) -> &str {
        &self.openid
    }

    /// The requested language, `en` unless set.
    pub fn lang(&self) -> &str {
        self.lang.as_deref().unwrap_or(DEFAULT_LANG)
    }
}

/// A user profile, as returned by the provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub openid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nickname: String,
    /// `1` for male, `2` for female, `0` if unknown.
    #[serde(default, deserialize_with = "number_or_string")]
    pub sex: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub province: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    /// The avatar URL. Empty if the user has no avatar.
    #[serde(default, deserialize_with = "null_as_default")]
    pub headimgurl: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub privilege: Vec<String>,
    /// Only present when the application is bound to an open platform account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unionid: Option<String>,
    /// Any fields not listed above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Some accounts report missing profile fields as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Older responses encode `sex` as a string.
fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid sex value {n}"))),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid sex value {s:?}"))),
        Some(v) => Err(serde::de::Error::custom(format!("invalid sex value {v}"))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    pub(crate) fn test_profile() -> Value {
        json!({
            "openid": "OPENID",
            "nickname": "NICKNAME",
            "sex": "1",
            "province": "PROVINCE",
            "city": "CITY",
            "country": "COUNTRY",
            "headimgurl": "http://wx.qlogo.cn/mmopen/g3MonUZtNHkdmzicIlibx6iaFqAc56vxLSUfpb6n5WKSYVY0ChQKkiaJSgQ1dZuTOgvLLrhJbERQQ4eMsv84eavHiaiceqxibJxCfHe/46",
            "privilege": ["PRIVILEGE1", "PRIVILEGE2"],
        })
    }

    #[test]
    fn request() {
        let request = UserRequest::new("test-openid");
        assert_eq!(request.openid(), "test-openid");
        assert_eq!(request.lang(), "en");

        let request = request.with_lang("zh_CN");
        assert_eq!(request.lang(), "zh_CN");
        assert_eq!(request.openid(), "test-openid");
    }

    #[test]
    fn profile() -> anyhow::Result<()> {
        let got = serde_json::from_value::<UserInfo>(test_profile())?;
        assert_eq!(got.openid, "OPENID");
        assert_eq!(got.nickname, "NICKNAME");
        assert_eq!(got.sex, Some(1));
        assert_eq!(got.province, "PROVINCE");
        assert_eq!(got.city, "CITY");
        assert_eq!(got.country, "COUNTRY");
        assert!(got.headimgurl.starts_with("http://wx.qlogo.cn/"), "{got:?}");
        assert_eq!(got.privilege, vec!["PRIVILEGE1", "PRIVILEGE2"]);
        assert_eq!(got.unionid, None);
        assert!(got.extra.is_empty(), "{got:?}");
        Ok(())
    }

    #[test]
    fn profile_keeps_unknown_fields() -> anyhow::Result<()> {
        let got = serde_json::from_value::<UserInfo>(json!({
            "openid": "OPENID",
            "unionid": "UNIONID",
            "is_snapshotuser": 1,
        }))?;
        assert_eq!(got.unionid.as_deref(), Some("UNIONID"));
        assert_eq!(got.extra.get("is_snapshotuser"), Some(&json!(1)));
        assert_eq!(got.sex, None);
        Ok(())
    }

    #[test_case(json!(2), Some(2); "number")]
    #[test_case(json!("2"), Some(2); "string")]
    #[test_case(json!(""), None; "empty string")]
    #[test_case(json!(null), None; "null")]
    fn sex(input: Value, want: Option<i64>) {
        let got = serde_json::from_value::<UserInfo>(json!({"openid": "o", "sex": input}))
            .unwrap();
        assert_eq!(got.sex, want);
    }

    #[test_case("nickname")]
    #[test_case("province")]
    #[test_case("city")]
    #[test_case("country")]
    #[test_case("headimgurl")]
    #[test_case("privilege")]
    #[test_case("unionid")]
    fn null_field(field: &str) {
        let mut input = test_profile();
        input[field] = Value::Null;
        let got = serde_json::from_value::<UserInfo>(input).unwrap();
        match field {
            "nickname" => assert_eq!(got.nickname, ""),
            "province" => assert_eq!(got.province, ""),
            "city" => assert_eq!(got.city, ""),
            "country" => assert_eq!(got.country, ""),
            "headimgurl" => assert_eq!(got.headimgurl, ""),
            "privilege" => assert!(got.privilege.is_empty(), "{got:?}"),
            _ => assert_eq!(got.unionid, None),
        }
        assert_eq!(got.openid, "OPENID");
        assert!(got.extra.is_empty(), "{got:?}");
    }

    #[test]
    fn sex_rejects_garbage() {
        let got = serde_json::from_value::<UserInfo>(json!({"openid": "o", "sex": "male"}));
        assert!(got.is_err(), "{got:?}");
    }
}
