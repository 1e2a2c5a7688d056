use crate::models::AuditEntry;

/// Audit trail as structured events on the `audit` target, so it can be routed
/// to its own sink by the subscriber.
pub struct AuditService;

impl AuditService {
    pub fn log(entry: AuditEntry) {
        let details = entry
            .details
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();

        tracing::info!(
            target: "audit",
            actor_id = %entry.actor_id,
            action = entry.action.as_str(),
            resource_type = entry.resource_type.as_str(),
            resource_id = entry.resource_id.as_deref().unwrap_or("-"),
            details = %details,
            "audit"
        );
    }
}
