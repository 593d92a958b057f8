//! Built-in action tables for the project service.
//!
//! Each table maps inbound action identifiers onto outbound peer commands.
//! The meta-transaction table is registered last as an override layer: the
//! regional project actions it names are settled on chain instead of being
//! answered by the peer.

use super::handler::{MetaTransactionAction, PayloadShape, PeerCommandAction};
use super::registry::{ActionRegistry, ActionRegistryBuilder, ActionTable};
use crate::constants::{actions, commands, timeouts};
use crate::events::{EventPublisher, ProjectEvent};
use crate::orchestration::errors::RegistryError;
use crate::orchestration::meta_transaction::MetaTransactionSubmitter;
use std::sync::Arc;

pub const SETTINGS_TABLE: &str = "settings";
pub const EL_PROJECT_TABLE: &str = "el_project";
pub const BENEFICIARY_TABLE: &str = "beneficiary";
pub const VENDOR_TABLE: &str = "vendor";
pub const META_TRANSACTION_TABLE: &str = "meta_transaction";

pub fn settings_actions() -> ActionTable {
    ActionTable::new(SETTINGS_TABLE)
        .action(
            actions::SETTINGS_LIST,
            PeerCommandAction::new(commands::PROJECT_SETTINGS_LIST, PayloadShape::SubjectOnly),
        )
        .action(
            actions::SETTINGS_GET,
            PeerCommandAction::new(commands::PROJECT_SETTINGS_GET, PayloadShape::Passthrough),
        )
}

pub fn el_project_actions() -> ActionTable {
    let passthrough = |cmd: &'static str| PeerCommandAction::new(cmd, PayloadShape::Passthrough);

    ActionTable::new(EL_PROJECT_TABLE)
        .action(actions::REDEEM_VOUCHER, passthrough(commands::REDEEM_VOUCHER))
        .action(actions::PROCESS_OTP, passthrough(commands::PROCESS_OTP))
        .action(
            actions::ASSIGN_DISCOUNT_VOUCHER,
            passthrough(commands::ASSIGN_DISCOUNT_VOUCHER),
        )
        .action(
            actions::REQUEST_REDEMPTION,
            passthrough(commands::REQUEST_REDEMPTION).with_timeout(timeouts::REDEMPTION_TIMEOUT_MS),
        )
        .action(
            actions::UPDATE_REDEMPTION,
            passthrough(commands::UPDATE_REDEMPTION).with_timeout(timeouts::REDEMPTION_TIMEOUT_MS),
        )
        .action(
            actions::LIST_REDEMPTION,
            passthrough(commands::LIST_REDEMPTION).with_timeout(timeouts::REDEMPTION_TIMEOUT_MS),
        )
        .action(
            actions::GET_VENDOR_REDEMPTION,
            passthrough(commands::GET_VENDOR_REDEMPTION)
                .with_timeout(timeouts::REDEMPTION_TIMEOUT_MS),
        )
        .action(
            actions::GET_VENDOR_REFERRER,
            passthrough(commands::BENEFICIARY_VENDOR_REFERRAL)
                .with_timeout(timeouts::VENDOR_REFERRER_TIMEOUT_MS),
        )
}

pub fn beneficiary_actions() -> ActionTable {
    ActionTable::new(BENEFICIARY_TABLE)
        .action(
            actions::BENEFICIARY_ADD_TO_PROJECT,
            PeerCommandAction::new(commands::BENEFICIARY_ADD_TO_PROJECT, PayloadShape::WrappedDto),
        )
        .action(
            actions::BENEFICIARY_BULK_REFER_TO_PROJECT,
            PeerCommandAction::new(
                commands::BENEFICIARY_BULK_REFER_TO_PROJECT,
                PayloadShape::WrappedDto,
            ),
        )
        .action(
            actions::BENEFICIARY_ASSIGN_TO_PROJECT,
            PeerCommandAction::new(
                commands::BENEFICIARY_ASSIGN_TO_PROJECT,
                PayloadShape::ProjectScoped,
            ),
        )
        .action(
            actions::BENEFICIARY_BULK_ASSIGN_TO_PROJECT,
            PeerCommandAction::new(
                commands::BENEFICIARY_BULK_ASSIGN_TO_PROJECT,
                PayloadShape::ProjectScoped,
            ),
        )
        .action(
            actions::BENEFICIARY_LIST_BY_PROJECT,
            PeerCommandAction::new(
                commands::BENEFICIARY_LIST_BY_PROJECT,
                PayloadShape::ProjectScoped,
            ),
        )
}

pub fn vendor_actions() -> ActionTable {
    ActionTable::new(VENDOR_TABLE)
        .action(
            actions::VENDOR_ASSIGN_TO_PROJECT,
            PeerCommandAction::new(commands::VENDOR_ASSIGN_PROJECT, PayloadShape::ProjectScoped),
        )
        .action(
            actions::VENDOR_LIST_BY_PROJECT,
            PeerCommandAction::new(commands::VENDOR_LIST_BY_PROJECT, PayloadShape::ProjectScoped),
        )
}

/// Override layer routing the on-chain actions through the queue
pub fn meta_transaction_actions(
    submitter: Arc<MetaTransactionSubmitter>,
    publisher: EventPublisher,
) -> ActionTable {
    actions::META_TRANSACTION_ACTIONS
        .iter()
        .fold(
            ActionTable::override_layer(META_TRANSACTION_TABLE),
            |table, action_id| {
                let handler = MetaTransactionAction::new(Arc::clone(&submitter));
                let handler = match settlement_event(action_id) {
                    Some(event) => handler.announce_settlement(event, publisher.clone()),
                    None => handler,
                };
                table.action(*action_id, handler)
            },
        )
}

/// Event raised once a queued action settles on chain
fn settlement_event(action_id: &str) -> Option<ProjectEvent> {
    match action_id {
        actions::REDEEM_VOUCHER => Some(ProjectEvent::RedeemVoucher),
        actions::REQUEST_REDEMPTION => Some(ProjectEvent::RequestRedemption),
        _ => None,
    }
}

/// The project service registry: base tables, then the meta-transaction layer
pub fn default_registry(
    submitter: Arc<MetaTransactionSubmitter>,
    publisher: EventPublisher,
) -> Result<ActionRegistry, RegistryError> {
    ActionRegistryBuilder::new()
        .register(settings_actions())
        .register(el_project_actions())
        .register(beneficiary_actions())
        .register(vendor_actions())
        .register(meta_transaction_actions(submitter, publisher))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::handler::HandlerKind;
    use crate::config::MetaTransactionConfig;
    use crate::messaging::InMemoryTransactionQueue;

    fn registry() -> ActionRegistry {
        let submitter = Arc::new(MetaTransactionSubmitter::new(
            Arc::new(InMemoryTransactionQueue::default()),
            &MetaTransactionConfig::default(),
        ));
        default_registry(submitter, EventPublisher::default()).unwrap()
    }

    #[test]
    fn test_default_registry_covers_every_table() {
        let registry = registry();
        assert_eq!(registry.len(), 17);

        for action_id in [
            actions::SETTINGS_LIST,
            actions::GET_VENDOR_REFERRER,
            actions::BENEFICIARY_LIST_BY_PROJECT,
            actions::VENDOR_ASSIGN_TO_PROJECT,
        ] {
            assert_eq!(
                registry.resolve(action_id).map(|h| h.kind()),
                Some(HandlerKind::PeerCommand),
                "{action_id}"
            );
        }
    }

    #[test]
    fn test_meta_layer_overrides_el_project_actions() {
        let registry = registry();

        for action_id in actions::META_TRANSACTION_ACTIONS {
            assert_eq!(registry.owner(action_id), Some(META_TRANSACTION_TABLE));
            assert_eq!(
                registry.resolve(action_id).map(|h| h.kind()),
                Some(HandlerKind::MetaTransaction)
            );
        }
        assert_eq!(registry.overridden_actions().len(), 4);
        assert_eq!(registry.owner(actions::UPDATE_REDEMPTION), Some(EL_PROJECT_TABLE));
        assert_eq!(registry.stats().meta_transaction_actions, 4);
    }

    #[test]
    fn test_settlement_events() {
        assert_eq!(
            settlement_event(actions::REDEEM_VOUCHER),
            Some(ProjectEvent::RedeemVoucher)
        );
        assert_eq!(
            settlement_event(actions::REQUEST_REDEMPTION),
            Some(ProjectEvent::RequestRedemption)
        );
        assert_eq!(settlement_event(actions::PROCESS_OTP), None);
        assert_eq!(settlement_event(actions::ASSIGN_DISCOUNT_VOUCHER), None);
    }

    #[test]
    fn test_base_tables_are_disjoint() {
        let tables = [
            settings_actions(),
            el_project_actions(),
            beneficiary_actions(),
            vendor_actions(),
        ];
        let mut ids: Vec<&str> = tables.iter().flat_map(|t| t.action_ids()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
