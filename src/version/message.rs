use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::compare::{Verdict, compare};

pub const DEFAULT_OLDER: &str = "There is a newer release available";
pub const DEFAULT_EQUAL: &str = "You are up to date";
pub const DEFAULT_NEWER: &str = "You are on an unreleased version";

/// Caller-supplied messages. Unset or empty fields fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMessages {
    pub older: Option<String>,
    pub equal: Option<String>,
    pub newer: Option<String>,
    /// Appended to the default "older" message as " at {url}"
    pub upgrade_url: Option<String>,
}

/// Opt-in policies. All default to false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionOptions {
    pub die_if_older: bool,
    pub die_if_newer: bool,
    pub show_message_on_current: bool,
}

/// Outcome of message resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Show this message and carry on. Empty means "say nothing".
    Message(String),
    /// A fail-fast policy fired; the caller should report the message and stop.
    Halt { verdict: Verdict, message: String },
}

impl Resolution {
    /// Process exit status conventionally used when acting on [`Resolution::Halt`].
    pub const EXIT_CODE: i32 = 125;

    pub fn message(&self) -> &str {
        match self {
            Resolution::Message(message) => message,
            Resolution::Halt { message, .. } => message,
        }
    }

    pub fn is_halt(&self) -> bool {
        matches!(self, Resolution::Halt { .. })
    }

    /// Turn a halt into an error so it can be propagated with `?`.
    pub fn into_result(self) -> Result<String, PolicyViolation> {
        match self {
            Resolution::Message(message) => Ok(message),
            Resolution::Halt { verdict, message } => Err(PolicyViolation { verdict, message }),
        }
    }
}

/// A fail-fast policy fired during message resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyViolation {
    pub verdict: Verdict,
    pub message: String,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PolicyViolation {}

fn configured(message: Option<&str>) -> Option<&str> {
    message.filter(|m| !m.is_empty())
}

/// Resolve the message for `verdict`.
pub fn resolve(
    verdict: Verdict,
    messages: &VersionMessages,
    options: &VersionOptions,
) -> Resolution {
    let resolution = match verdict {
        Verdict::Older => {
            let older = configured(messages.older.as_deref());
            let upgrade_url = configured(messages.upgrade_url.as_deref());
            let message = match (older, upgrade_url) {
                (Some(custom), _) => custom.to_string(),
                (None, Some(url)) => format!("{} at {}", DEFAULT_OLDER, url),
                (None, None) => DEFAULT_OLDER.to_string(),
            };
            if options.die_if_older {
                Resolution::Halt { verdict, message }
            } else {
                Resolution::Message(message)
            }
        }
        Verdict::Equal => {
            if !options.show_message_on_current {
                Resolution::Message(String::new())
            } else {
                let message = configured(messages.equal.as_deref()).unwrap_or(DEFAULT_EQUAL);
                Resolution::Message(message.to_string())
            }
        }
        Verdict::Newer => {
            let message = configured(messages.newer.as_deref())
                .unwrap_or(DEFAULT_NEWER)
                .to_string();
            if options.die_if_newer {
                Resolution::Halt { verdict, message }
            } else {
                Resolution::Message(message)
            }
        }
    };

    debug!("Verdict {} resolved to {:?}", verdict, resolution);
    resolution
}

/// Compare `own` against `other` and resolve the message in one step.
pub fn check(
    own: &str,
    other: &str,
    messages: &VersionMessages,
    options: &VersionOptions,
) -> Resolution {
    resolve(Verdict::from(compare(own, other)), messages, options)
}
