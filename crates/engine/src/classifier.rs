//! Recipient classifier — maps a raw recipient string to a delivery channel.
//!
//! Classification is purely syntactic: no DNS lookups, no Telegram API calls.
//! A string that is neither an email address nor a numeric chat ID is
//! `Invalid`, which callers treat as "skip", never as an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use herald_common::types::ChannelType;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.+-]+@[A-Za-z0-9-]+\.[A-Za-z0-9.-]+$")
        .expect("email pattern is a valid regex")
});

/// Channel tag for a single recipient string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientClass {
    Email,
    Telegram,
    Invalid,
}

impl RecipientClass {
    /// The dispatch channel for this class, `None` for `Invalid`.
    pub fn channel(self) -> Option<ChannelType> {
        match self {
            RecipientClass::Email => Some(ChannelType::Email),
            RecipientClass::Telegram => Some(ChannelType::Telegram),
            RecipientClass::Invalid => None,
        }
    }
}

/// Recipients split by channel, each list in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedRecipients {
    pub emails: Vec<String>,
    pub telegram_ids: Vec<String>,
    pub invalid: Vec<String>,
}

impl ClassifiedRecipients {
    /// True when no recipient maps to a delivery channel.
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.telegram_ids.is_empty()
    }

    /// Number of recipients that will get a dispatch unit.
    pub fn deliverable(&self) -> usize {
        self.emails.len() + self.telegram_ids.len()
    }
}

/// Classify a single recipient.
pub fn classify(raw: &str) -> RecipientClass {
    if is_telegram_id(raw) {
        RecipientClass::Telegram
    } else if EMAIL_PATTERN.is_match(raw) {
        RecipientClass::Email
    } else {
        RecipientClass::Invalid
    }
}

/// Split recipients into email and Telegram lists, keeping invalid entries aside.
pub fn partition<S: AsRef<str>>(recipients: &[S]) -> ClassifiedRecipients {
    let mut classified = ClassifiedRecipients::default();

    for recipient in recipients {
        let recipient = recipient.as_ref();
        let bucket = match classify(recipient) {
            RecipientClass::Email => &mut classified.emails,
            RecipientClass::Telegram => &mut classified.telegram_ids,
            RecipientClass::Invalid => &mut classified.invalid,
        };
        bucket.push(recipient.to_string());
    }

    classified
}

fn is_telegram_id(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}
