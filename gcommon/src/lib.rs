//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use gcommon::{SessionId, UserId};
//!
//! let session = SessionId::from("session-1");
//! let user = UserId::new("user-1");
//!
//! assert_eq!(session.as_str(), "session-1");
//! assert_eq!(user.to_string(), "user-1");
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use gcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Cross-crate identifier newtypes for sessions and users.
    //!
    //! ```rust
    //! use gcommon::{SessionId, UserId};
    //!
    //! let session = SessionId::new("session-42");
    //! let user = UserId::from("anonymous");
    //!
    //! assert_eq!(session.to_string(), "session-42");
    //! assert!(user.is_anonymous());
    //! ```

    use std::fmt::{Display, Formatter};

    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct SessionId(String);

    impl SessionId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for SessionId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for SessionId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for SessionId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    /// Identifies the person behind a session. Sessions without a signed-in
    /// user share the `anonymous` id.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct UserId(String);

    impl UserId {
        pub const ANONYMOUS: &'static str = "anonymous";

        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn anonymous() -> Self {
            Self::new(Self::ANONYMOUS)
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }

        pub fn is_anonymous(&self) -> bool {
            self.0 == Self::ANONYMOUS
        }
    }

    impl Default for UserId {
        fn default() -> Self {
            Self::anonymous()
        }
    }

    impl Display for UserId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for UserId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for UserId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub use context::{SessionId, UserId};
pub use future::BoxFuture;
