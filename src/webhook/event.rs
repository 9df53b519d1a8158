// ABOUTME: Source-host webhook events and their payloads.
// ABOUTME: Push events deploy the pushed commit; ping is acknowledged; anything else is rejected.

use serde::Deserialize;

use super::RequestError;

/// Host every push payload's repository lives on.
const PUSH_HOST: &str = "github.com";

/// Webhook event kinds this agent understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    Push,
    Ping,
}

impl HookEvent {
    /// Parse the event name sent alongside a webhook delivery.
    pub fn from_name(name: &str) -> Result<Self, RequestError> {
        match name.trim() {
            "push" => Ok(HookEvent::Push),
            "ping" => Ok(HookEvent::Ping),
            other => Err(RequestError::UnsupportedEvent(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
}

/// The parts of a push payload a deployment needs.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    /// Commit the ref points at after the push.
    pub after: String,
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
    pub repository: Repository,
}

impl PushEvent {
    pub fn from_json(payload: &[u8]) -> Result<Self, RequestError> {
        let event: PushEvent = serde_json::from_slice(payload)?;
        if event.after.trim().is_empty() {
            return Err(RequestError::MissingField("after"));
        }
        if event.repository.full_name.trim().is_empty() {
            return Err(RequestError::MissingField("repository.full_name"));
        }
        Ok(event)
    }

    /// Project reference of the pushed repository.
    pub fn project(&self) -> String {
        format!("{}/{}", PUSH_HOST, self.repository.full_name.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_payload_maps_to_github_project() {
        let payload = br#"{
            "ref": "refs/heads/main",
            "before": "0000000",
            "after": "deadbeefcafe",
            "repository": {"id": 1, "name": "app", "full_name": "acme/app", "private": true}
        }"#;
        let event = PushEvent::from_json(payload).unwrap();
        assert_eq!(event.project(), "github.com/acme/app");
        assert_eq!(event.after, "deadbeefcafe");
        assert_eq!(event.git_ref.as_deref(), Some("refs/heads/main"));
        assert!(event.repository.private);
    }

    #[test]
    fn missing_commit_is_rejected() {
        let payload = br#"{"after": "", "repository": {"full_name": "acme/app"}}"#;
        let err = PushEvent::from_json(payload).unwrap_err();
        assert!(matches!(err, RequestError::MissingField("after")));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = PushEvent::from_json(b"{not json").unwrap_err();
        assert!(matches!(err, RequestError::Payload(_)));
    }

    #[test]
    fn event_names() {
        assert_eq!(HookEvent::from_name("push").unwrap(), HookEvent::Push);
        assert_eq!(HookEvent::from_name("ping").unwrap(), HookEvent::Ping);
        let err = HookEvent::from_name("issues").unwrap_err();
        assert_eq!(err.to_string(), "invalid event 'issues'");
    }
}
