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

//! Errors returned by the client.
//!
//! All operations report failures with [Error]. The type is opaque, use the
//! predicates to classify it:
//!
//! ```
//! # use wechat_oauth::errors::Error;
//! fn describe(e: &Error) -> String {
//!     match e {
//!         e if e.is_no_token() => "send the user through the consent screen".into(),
//!         e if e.is_provider() => format!("rejected by the provider: {:?}", e.code()),
//!         e if e.is_transport() => "could not reach the provider".into(),
//!         _ => format!("{e}"),
//!     }
//! }
//! # assert!(describe(&Error::no_token("openid")).contains("consent"));
//! ```

use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The error type for all client operations.
///
/// Provider and transport failures share [is_remote][Error::is_remote], so
/// callers that only care whether the remote call succeeded need a single
/// check. The original cause, if any, is available via
/// [source][std::error::Error::source].
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

#[derive(thiserror::Error, Debug)]
enum ErrorKind {
    #[error("the provider rejected the request, errcode={code}, errmsg={message}")]
    Provider { code: i64, message: String },
    #[error("the request to the provider did not complete")]
    Transport,
    #[error("No token for {0}, please authorize first.")]
    NoToken(String),
    #[error("the token store failed")]
    Store,
}

impl Error {
    /// Creates an error from an `errcode`/`errmsg` pair returned by the
    /// provider.
    ///
    /// # Example
    /// ```
    /// # use wechat_oauth::errors::Error;
    /// let error = Error::provider(40029, "invalid code");
    /// assert!(error.is_provider());
    /// assert_eq!(error.code(), Some(40029));
    /// assert!(error.to_string().contains("invalid code"));
    /// ```
    pub fn provider<T: Into<String>>(code: i64, message: T) -> Self {
        Self {
            kind: ErrorKind::Provider {
                code,
                message: message.into(),
            },
            source: None,
        }
    }

    /// Creates an error for a request that did not produce a usable response.
    ///
    /// Connection failures, timeouts, and malformed response bodies all fall
    /// in this category.
    pub fn transport<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Transport,
            source: Some(source.into()),
        }
    }

    /// Creates an error for a subject that was never authorized.
    pub fn no_token<T: Into<String>>(subject: T) -> Self {
        Self {
            kind: ErrorKind::NoToken(subject.into()),
            source: None,
        }
    }

    /// Creates an error from a failure in a [TokenStore][crate::store::TokenStore].
    ///
    /// Store implementations outside this crate use this to report their
    /// failures.
    pub fn store<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Store,
            source: Some(source.into()),
        }
    }

    /// The provider returned a structured error.
    pub fn is_provider(&self) -> bool {
        matches!(self.kind, ErrorKind::Provider { .. })
    }

    /// The request did not complete, or its response could not be parsed.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport)
    }

    /// The remote call did not succeed, for any reason.
    pub fn is_remote(&self) -> bool {
        self.is_provider() || self.is_transport()
    }

    /// There is no stored token for the subject.
    ///
    /// This is never transient. The application must run the authorization
    /// code flow for the subject before trying again.
    pub fn is_no_token(&self) -> bool {
        matches!(self.kind, ErrorKind::NoToken(_))
    }

    /// The token store failed to read or write a token.
    pub fn is_store(&self) -> bool {
        matches!(self.kind, ErrorKind::Store)
    }

    /// The provider's `errcode`, if this is a provider error.
    pub fn code(&self) -> Option<i64> {
        match &self.kind {
            ErrorKind::Provider { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The provider's `errmsg`, if this is a provider error.
    pub fn message(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::Provider { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) if self.is_transport() || self.is_store() => {
                write!(f, "{}: {source}", self.kind)
            }
            _ => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}
