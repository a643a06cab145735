//! The optional `user`/`channel` pair a package is exported under.

use std::fmt;
use thiserror::Error;

/// A source declared an unusable `user`/`channel` combination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// `channel` was set without `user`.
    #[error("user needs to be specified if using channel (user: none, channel: \"{channel}\")")]
    ChannelWithoutUser {
        /// The channel that was declared.
        channel: String,
    },
}

/// Registrar namespace for an exported package.
///
/// # Examples
///
/// ```
/// use recipe_installer::namespace::Namespace;
///
/// let ns = Namespace::new(Some("acme".into()), Some("stable".into()));
/// assert!(ns.validate().is_ok());
/// assert_eq!(ns.to_string(), "@acme/stable");
///
/// let orphan = Namespace::new(None, Some("stable".into()));
/// assert!(orphan.validate().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    user: Option<String>,
    channel: Option<String>,
}

impl Namespace {
    /// Create a namespace; blank values are treated as absent.
    #[must_use]
    pub fn new(user: Option<String>, channel: Option<String>) -> Self {
        Self {
            user: user.filter(|u| !u.trim().is_empty()),
            channel: channel.filter(|c| !c.trim().is_empty()),
        }
    }

    /// The declared user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// The declared channel, if any.
    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// Check that a channel is only given together with a user.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ChannelWithoutUser`] when `channel` is set
    /// and `user` is not.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match (&self.user, &self.channel) {
            (None, Some(channel)) => Err(ConfigurationError::ChannelWithoutUser {
                channel: channel.clone(),
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Namespace {
    /// Renders as `@user/channel`, `@user`, or nothing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.user, &self.channel) {
            (Some(user), Some(channel)) => write!(f, "@{user}/{channel}"),
            (Some(user), None) => write!(f, "@{user}"),
            (None, Some(channel)) => write!(f, "@_/{channel}"),
            (None, None) => Ok(()),
        }
    }
}
