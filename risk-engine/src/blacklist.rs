use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// (tenant, type, value) composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlacklistType {
    Email,
    Phone,
    Ip,
    CardBin,
    Device,
}

impl BlacklistType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlacklistType::Email => "email",
            BlacklistType::Phone => "phone",
            BlacklistType::Ip => "ip",
            BlacklistType::CardBin => "card_bin",
            BlacklistType::Device => "device",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(BlacklistType::Email),
            "phone" => Some(BlacklistType::Phone),
            "ip" => Some(BlacklistType::Ip),
            "card_bin" => Some(BlacklistType::CardBin),
            "device" => Some(BlacklistType::Device),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub entry_type: BlacklistType,
    pub value: String,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl BlacklistEntry {
    /// Expired rows are invisible: callers that already
    /// fetched via a query filtering on `expires_at` won't see these, but
    /// this guards in-process reuse of a cached snapshot.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => expiry > now,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(expires_at: Option<DateTime<Utc>>) -> BlacklistEntry {
        BlacklistEntry {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            entry_type: BlacklistType::Email,
            value: "fraud@example.com".into(),
            reason: Some("chargeback".into()),
            expires_at,
        }
    }

    #[test]
    fn no_expiry_is_always_live() {
        assert!(entry(None).is_live(Utc::now()));
    }

    #[test]
    fn past_expiry_is_not_live() {
        let past = Utc::now() - Duration::hours(1);
        assert!(!entry(Some(past)).is_live(Utc::now()));
    }

    #[test]
    fn future_expiry_is_live() {
        let future = Utc::now() + Duration::hours(1);
        assert!(entry(Some(future)).is_live(Utc::now()));
    }
}
