//! # Notification Rules
//!
//! Peer responses are inspected after delivery and may raise domain events
//! (WhatsApp/SMS dispatch and the like listen for these). Each rule matches on
//! the command name, the outbound payload and the response; every rule is
//! evaluated independently, so one response can raise several events.
//!
//! Evaluation is pure. Publishing cannot fail and never blocks the response
//! from reaching the caller.

use super::publisher::EventPublisher;
use super::types::ProjectEvent;
use crate::constants::{commands, fields, BENEFICIARY_TYPE_REFERRED};
use crate::messaging::CommandEnvelope;
use serde_json::Value;
use tracing::debug;

/// One `(command, payload predicate, response predicate) -> event` entry
#[derive(Debug, Clone)]
pub struct NotificationRule {
    pub name: &'static str,
    pub command: &'static str,
    pub event: ProjectEvent,
    pub payload_matches: fn(&Value) -> bool,
    pub response_matches: fn(&Value) -> bool,
    /// Builds the event payload from `(response, outbound payload)`
    pub event_payload: fn(&Value, &Value) -> Value,
}

impl NotificationRule {
    pub fn matches(&self, response: &Value, envelope: &CommandEnvelope) -> bool {
        envelope.cmd == self.command
            && (self.payload_matches)(&envelope.payload)
            && (self.response_matches)(response)
    }
}

/// The rule table applied to every delivered peer response
pub fn default_rules() -> Vec<NotificationRule> {
    vec![
        NotificationRule {
            name: "referred_beneficiaries_added",
            command: commands::BENEFICIARY_BULK_REFER_TO_PROJECT,
            event: ProjectEvent::BeneficiaryAddedToProject,
            payload_matches: is_referred_dto,
            response_matches: has_wallet_bearing_insert,
            event_payload: outbound_dto,
        },
        NotificationRule {
            name: "beneficiary_added",
            command: commands::BENEFICIARY_ADD_TO_PROJECT,
            event: ProjectEvent::BeneficiaryAddedToProject,
            payload_matches: any_payload,
            response_matches: is_truthy,
            event_payload: outbound_dto,
        },
        // Fires when a registry routes REQUEST_REDEMPTION to the peer; the
        // default registry settles it on chain and announces it instead.
        NotificationRule {
            name: "redemption_requested",
            command: commands::REQUEST_REDEMPTION,
            event: ProjectEvent::RequestRedemption,
            payload_matches: any_payload,
            response_matches: has_identifier,
            event_payload: no_payload,
        },
        NotificationRule {
            name: "redemption_updated",
            command: commands::UPDATE_REDEMPTION,
            event: ProjectEvent::UpdateRedemption,
            payload_matches: any_payload,
            response_matches: has_vendor_data,
            event_payload: vendor_data,
        },
    ]
}

fn any_payload(_: &Value) -> bool {
    true
}

fn is_referred_dto(payload: &Value) -> bool {
    payload
        .get(fields::DTO)
        .and_then(|dto| dto.get(fields::TYPE))
        .and_then(Value::as_str)
        == Some(BENEFICIARY_TYPE_REFERRED)
}

fn has_wallet_bearing_insert(response: &Value) -> bool {
    response
        .get(fields::INSERTED_DATA)
        .and_then(Value::as_array)
        .is_some_and(|records| {
            records.iter().any(|record| {
                record
                    .get(fields::WALLET_ADDRESS)
                    .and_then(Value::as_str)
                    .is_some_and(|wallet| !wallet.is_empty())
            })
        })
}

fn has_identifier(response: &Value) -> bool {
    response.get(fields::ID).is_some_and(|id| !id.is_null())
}

fn has_vendor_data(response: &Value) -> bool {
    response
        .get(fields::VENDOR_DATA)
        .and_then(Value::as_array)
        .is_some_and(|data| !data.is_empty())
}

/// JavaScript-style truthiness of a peer response
fn is_truthy(response: &Value) -> bool {
    match response {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn outbound_dto(_: &Value, payload: &Value) -> Value {
    payload.get(fields::DTO).cloned().unwrap_or(Value::Null)
}

fn no_payload(_: &Value, _: &Value) -> Value {
    Value::Null
}

fn vendor_data(response: &Value, _: &Value) -> Value {
    response
        .get(fields::VENDOR_DATA)
        .cloned()
        .unwrap_or(Value::Null)
}

/// Applies the rule table to peer responses and publishes the matches
#[derive(Debug, Clone)]
pub struct NotificationEmitter {
    rules: Vec<NotificationRule>,
    publisher: EventPublisher,
}

impl NotificationEmitter {
    pub fn new(publisher: EventPublisher) -> Self {
        Self::with_rules(publisher, default_rules())
    }

    pub fn with_rules(publisher: EventPublisher, rules: Vec<NotificationRule>) -> Self {
        Self { rules, publisher }
    }

    /// Events the response would raise, without publishing them
    pub fn evaluate(
        &self,
        response: &Value,
        envelope: &CommandEnvelope,
    ) -> Vec<(ProjectEvent, Value)> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(response, envelope))
            .map(|rule| {
                debug!(rule = rule.name, cmd = %envelope.cmd, event = %rule.event, "Notification rule matched");
                (rule.event, (rule.event_payload)(response, &envelope.payload))
            })
            .collect()
    }

    /// Publish every event the response raises
    pub fn on_response(&self, response: &Value, envelope: &CommandEnvelope) {
        for (event, payload) in self.evaluate(response, envelope) {
            self.publisher.publish(event, payload);
        }
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    pub fn rules(&self) -> &[NotificationRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn emitter() -> NotificationEmitter {
        NotificationEmitter::new(EventPublisher::default())
    }

    fn envelope(cmd: &str, payload: Value) -> CommandEnvelope {
        CommandEnvelope::new(cmd).with_payload(payload)
    }

    #[test]
    fn test_referred_bulk_insert_raises_beneficiary_added() {
        let dto = json!({"type": "REFERRED", "referrerVendor": "v-1"});
        let events = emitter().evaluate(
            &json!({"insertedData": [{"walletAddress": ""}, {"walletAddress": "0xabc"}]}),
            &envelope(
                commands::BENEFICIARY_BULK_REFER_TO_PROJECT,
                json!({"dto": dto}),
            ),
        );
        assert_eq!(events, vec![(ProjectEvent::BeneficiaryAddedToProject, dto)]);
    }

    #[test]
    fn test_non_referred_bulk_insert_is_silent() {
        let events = emitter().evaluate(
            &json!({"insertedData": [{"walletAddress": "0xabc"}]}),
            &envelope(
                commands::BENEFICIARY_BULK_REFER_TO_PROJECT,
                json!({"dto": {"type": "ENROLLED"}}),
            ),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_insert_without_wallets_is_silent() {
        let events = emitter().evaluate(
            &json!({"insertedData": [{"name": "Sita"}]}),
            &envelope(
                commands::BENEFICIARY_BULK_REFER_TO_PROJECT,
                json!({"dto": {"type": "REFERRED"}}),
            ),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_request_redemption_requires_identifier() {
        let e = emitter();
        let cmd = envelope(commands::REQUEST_REDEMPTION, json!({}));
        assert_eq!(
            e.evaluate(&json!({"id": 7}), &cmd),
            vec![(ProjectEvent::RequestRedemption, Value::Null)]
        );
        assert!(e.evaluate(&json!({"status": "ok"}), &cmd).is_empty());
        assert!(e.evaluate(&json!({"id": null}), &cmd).is_empty());
    }

    #[test]
    fn test_update_redemption_requires_vendor_data() {
        let e = emitter();
        let cmd = envelope(commands::UPDATE_REDEMPTION, json!({}));
        let vendordata = json!([{"vendor": "0x1", "amount": 20}]);

        assert_eq!(
            e.evaluate(&json!({"vendordata": vendordata}), &cmd),
            vec![(ProjectEvent::UpdateRedemption, vendordata)]
        );
        assert!(e.evaluate(&json!({"vendordata": []}), &cmd).is_empty());
    }

    #[test]
    fn test_rules_are_scoped_to_their_command() {
        let events = emitter().evaluate(
            &json!({"id": 1, "vendordata": [1]}),
            &envelope(commands::LIST_REDEMPTION, json!({})),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[tokio::test]
    async fn test_on_response_publishes_matches() {
        let e = emitter();
        let mut rx = e.publisher().subscribe();

        e.on_response(
            &json!({"uuid": "b-1"}),
            &envelope(
                commands::BENEFICIARY_ADD_TO_PROJECT,
                json!({"dto": {"uuid": "b-1"}}),
            ),
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, ProjectEvent::BeneficiaryAddedToProject);
        assert_eq!(event.payload, json!({"uuid": "b-1"}));
        assert!(rx.try_recv().is_err());
    }
}
