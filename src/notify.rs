//! Balance-change notifications.
//!
//! Every successful ledger write publishes an event so that other systems,
//! e.g. a parent-facing portal, can react. Publishing is best effort and
//! never rolls back the write it describes.

use serde_json::json;

use crate::{Error, ledger::Account};

/// The topic balance-change events are published under.
pub const BALANCE_TOPIC: &str = "bursar.balance_changed";

/// A sink for application events.
pub trait NotificationPublisher: Send + Sync {
    /// Publish an event payload under a topic.
    ///
    /// # Errors
    /// Returns [Error::PublishFailed] when delivery fails. Callers treat
    /// this as non-fatal.
    fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), Error>;
}

/// A publisher that writes events to the application log.
#[derive(Debug, Default, Clone)]
pub struct TracingPublisher;

impl NotificationPublisher for TracingPublisher {
    fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), Error> {
        tracing::info!(topic, %payload, "event published");

        Ok(())
    }
}

/// Publish a balance-change event for `account`, logging a warning if
/// delivery fails.
pub fn publish_balance_changed(publisher: &dyn NotificationPublisher, account: &Account) {
    let payload = json!({
        "account_id": account.id,
        "student_code": account.code,
        "balance": account.balance,
        "version": account.version,
    });

    if let Err(error) = publisher.publish(BALANCE_TOPIC, payload) {
        tracing::warn!("could not publish balance change: {}", error);
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        ledger::Account,
        session::AcademicSession,
    };

    use super::{BALANCE_TOPIC, publish_balance_changed, testing::{FailingPublisher, RecordingPublisher}};

    fn account() -> Account {
        Account {
            id: 7,
            name: "Asha Rao".to_owned(),
            code: "S-041".to_owned(),
            profile_image: None,
            academic_year: AcademicSession::default(),
            balance: 130.0,
            version: 3,
            next_transaction_id: 5,
            transactions: Vec::new(),
        }
    }

    #[test]
    fn balance_changes_carry_account_id_code_balance_and_version() {
        let publisher = RecordingPublisher::default();

        publish_balance_changed(&publisher, &account());

        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, BALANCE_TOPIC);
        assert_eq!(
            events[0].1,
            json!({
                "account_id": 7,
                "student_code": "S-041",
                "balance": 130.0,
                "version": 3,
            })
        );
    }

    #[test]
    fn publish_failures_do_not_panic() {
        publish_balance_changed(&FailingPublisher, &account());
    }
}
