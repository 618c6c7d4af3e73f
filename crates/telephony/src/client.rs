use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedCall {
    pub sid: String,
}

#[derive(Debug, Error)]
pub enum TelephonyError {
    #[error("telephony transport failure: {0}")]
    Transport(String),
    #[error("telephony provider rejected the call: status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("telephony response could not be decoded: {0}")]
    Decode(String),
}

/// Starts an outbound call and points the provider at `callback_url` for
/// every subsequent conversation turn.
#[async_trait]
pub trait CallInitiator: Send + Sync {
    async fn start_call(&self, to: &str, callback_url: &str)
        -> Result<PlacedCall, TelephonyError>;
}

pub struct TwilioCallClient {
    http: reqwest::Client,
    api_base_url: String,
    account_sid: String,
    auth_token: SecretString,
    from_number: String,
}

impl TwilioCallClient {
    pub fn new(
        api_base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: SecretString,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base_url: api_base_url.into(),
            account_sid: account_sid.into(),
            auth_token,
            from_number: from_number.into(),
        }
    }

    fn calls_endpoint(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base_url.trim_end_matches('/'),
            self.account_sid
        )
    }
}

#[derive(Debug, Deserialize)]
struct CallResource {
    sid: String,
}

#[async_trait]
impl CallInitiator for TwilioCallClient {
    async fn start_call(
        &self,
        to: &str,
        callback_url: &str,
    ) -> Result<PlacedCall, TelephonyError> {
        let params = [
            ("To", to),
            ("From", self.from_number.as_str()),
            ("Url", callback_url),
            ("MachineDetection", "Enable"),
        ];

        let response = self
            .http
            .post(self.calls_endpoint())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&params)
            .send()
            .await
            .map_err(|error| TelephonyError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelephonyError::Rejected { status: status.as_u16(), body });
        }

        let resource: CallResource = response
            .json()
            .await
            .map_err(|error| TelephonyError::Decode(error.to_string()))?;

        info!(
            event_name = "telephony.call.placed",
            call_sid = %resource.sid,
            "outbound call placed"
        );

        Ok(PlacedCall { sid: resource.sid })
    }
}

/// Stand-in initiator for tests and for deployments where outbound calling
/// is switched off. Hands back a synthetic call sid without any I/O.
#[derive(Clone, Debug, Default)]
pub struct NoopCallInitiator;

#[async_trait]
impl CallInitiator for NoopCallInitiator {
    async fn start_call(
        &self,
        to: &str,
        callback_url: &str,
    ) -> Result<PlacedCall, TelephonyError> {
        let sid = format!("noop-{}", Uuid::new_v4());
        debug!(
            event_name = "telephony.call.noop",
            call_sid = %sid,
            to = %to,
            callback_url = %callback_url,
            "telephony disabled, returning synthetic call sid"
        );
        Ok(PlacedCall { sid })
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{CallInitiator, NoopCallInitiator, TwilioCallClient};

    #[test]
    fn calls_endpoint_is_account_scoped() {
        let client = TwilioCallClient::new(
            "https://api.twilio.com/",
            "AC123",
            SecretString::from("token".to_string()),
            "+431234567",
        );

        assert_eq!(
            client.calls_endpoint(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Calls.json"
        );
    }

    #[tokio::test]
    async fn noop_initiator_hands_out_unique_sids() {
        let initiator = NoopCallInitiator;
        let first = initiator.start_call("+43111", "https://quell.example/voice").await.expect("ok");
        let second =
            initiator.start_call("+43111", "https://quell.example/voice").await.expect("ok");

        assert!(first.sid.starts_with("noop-"));
        assert_ne!(first.sid, second.sid);
    }
}
