//! Organization create/delete saga. Create goes external-first, local
//! commit last, with compensation on local failure. Delete goes
//! local-first, external cleanup best-effort after.

use crate::error::OrgSagaError;
use crate::model::{ApiKeyRecord, BillingRecord, MembershipRecord, NewOrganization, OrganizationRecord};
use crate::providers::{IdentityProvider, PaymentsProvider, WebhookTenant};
use airweave_core::types::OrganizationId;
use airweave_data::{InMemoryRepository, Repository};
use airweave_events::{topics, EventBus};
use serde_json::json;
use std::sync::Arc;

/// `R` is the local organization-row repository; production code always
/// gets the default `InMemoryRepository`, tests can substitute a double
/// that fails `save()` to exercise the local-commit compensation path.
pub struct OrganizationSaga<R = InMemoryRepository<OrganizationRecord, OrganizationId>>
where
    R: Repository<OrganizationRecord, OrganizationId>,
{
    identity: Arc<dyn IdentityProvider>,
    payments: Arc<dyn PaymentsProvider>,
    webhooks: Arc<dyn WebhookTenant>,
    orgs: R,
    memberships: InMemoryRepository<MembershipRecord, (OrganizationId, airweave_core::types::UserId)>,
    billing: InMemoryRepository<BillingRecord, OrganizationId>,
    api_keys: InMemoryRepository<ApiKeyRecord, String>,
    bus: EventBus,
}

impl OrganizationSaga<InMemoryRepository<OrganizationRecord, OrganizationId>> {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        payments: Arc<dyn PaymentsProvider>,
        webhooks: Arc<dyn WebhookTenant>,
        bus: EventBus,
    ) -> Self {
        Self {
            identity,
            payments,
            webhooks,
            orgs: InMemoryRepository::new(|o: &OrganizationRecord| o.id),
            memberships: InMemoryRepository::new(|m: &MembershipRecord| (m.organization_id, m.user_id)),
            billing: InMemoryRepository::new(|b: &BillingRecord| b.organization_id),
            api_keys: InMemoryRepository::new(|k: &ApiKeyRecord| k.key_hash.clone()),
            bus,
        }
    }
}

impl<R> OrganizationSaga<R>
where
    R: Repository<OrganizationRecord, OrganizationId>,
{
    /// External resources first, local unit-of-work last. A failure at the
    /// local-commit step compensates by deleting the identity org and the
    /// payment customer; compensation failures are CRITICAL since they
    /// leave orphaned external resources requiring manual cleanup.
    pub async fn create_organization(&self, new_org: NewOrganization) -> Result<OrganizationRecord, OrgSagaError> {
        let identity_org_id = self
            .identity
            .create_org(&new_org.name)
            .await
            .map_err(OrgSagaError::IdentityProvider)?;

        if let Err(e) = self.identity.add_owner(&identity_org_id, &new_org.owner_email).await {
            self.compensate_identity_only(&identity_org_id).await;
            return Err(OrgSagaError::IdentityProvider(e));
        }

        if let Err(e) = self.identity.enable_default_connections(&identity_org_id).await {
            self.compensate_identity_only(&identity_org_id).await;
            return Err(OrgSagaError::IdentityProvider(e));
        }

        let payment_customer_id = match self
            .payments
            .create_customer(&new_org.name, &new_org.owner_email, !new_org.is_production)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                self.compensate_identity_only(&identity_org_id).await;
                return Err(OrgSagaError::Payments(e));
            }
        };

        match self
            .commit_local(&new_org, &identity_org_id, &payment_customer_id)
            .await
        {
            Ok(record) => {
                self.bus
                    .emit(
                        topics::ORGANIZATION_CREATED,
                        json!({ "organization_id": record.id.to_string(), "name": record.name }),
                    )
                    .await;
                Ok(record)
            }
            Err(e) => {
                self.compensate_both(&identity_org_id, &payment_customer_id).await;
                Err(e)
            }
        }
    }

    async fn commit_local(
        &self,
        new_org: &NewOrganization,
        identity_org_id: &str,
        payment_customer_id: &str,
    ) -> Result<OrganizationRecord, OrgSagaError> {
        let record = OrganizationRecord {
            id: OrganizationId::new(),
            name: new_org.name.clone(),
            identity_org_id: identity_org_id.to_string(),
            payment_customer_id: Some(payment_customer_id.to_string()),
        };
        self.orgs
            .save(record.clone())
            .await
            .map_err(|e| OrgSagaError::LocalCommit(e.to_string()))?;
        self.memberships
            .save(MembershipRecord {
                organization_id: record.id,
                user_id: new_org.owner_user_id,
                is_owner: true,
            })
            .await
            .map_err(|e| OrgSagaError::LocalCommit(e.to_string()))?;
        self.billing
            .save(BillingRecord {
                organization_id: record.id,
                payment_customer_id: payment_customer_id.to_string(),
                subscription_id: None,
            })
            .await
            .map_err(|e| OrgSagaError::LocalCommit(e.to_string()))?;
        self.api_keys
            .save(ApiKeyRecord {
                organization_id: record.id,
                key_hash: format!("default-key-{}", record.id),
            })
            .await
            .map_err(|e| OrgSagaError::LocalCommit(e.to_string()))?;
        Ok(record)
    }

    async fn compensate_identity_only(&self, identity_org_id: &str) {
        if let Err(e) = self.identity.delete_org(identity_org_id).await {
            tracing::error!(identity_org_id, error = %e, "CRITICAL: failed to compensate identity org, requires manual cleanup");
        }
    }

    async fn compensate_both(&self, identity_org_id: &str, payment_customer_id: &str) {
        self.compensate_identity_only(identity_org_id).await;
        if let Err(e) = self.payments.delete_customer(payment_customer_id).await {
            tracing::error!(payment_customer_id, error = %e, "CRITICAL: failed to compensate payment customer, requires manual cleanup");
        }
    }

    /// Local commit first: delete memberships and the org row, then commit.
    /// External cleanup runs best-effort after and never blocks on failure.
    pub async fn delete_organization(&self, organization_id: OrganizationId) -> Result<Vec<String>, OrgSagaError> {
        let record = self
            .orgs
            .find_by_id(&organization_id)
            .await
            .map_err(|e| OrgSagaError::LocalCommit(e.to_string()))?
            .ok_or(OrgSagaError::NotFound)?;

        let affected_memberships = self.memberships.find_where(|m| m.organization_id == organization_id);
        for membership in &affected_memberships {
            self.memberships
                .delete(&(membership.organization_id, membership.user_id))
                .await
                .map_err(|e| OrgSagaError::LocalCommit(e.to_string()))?;
        }
        self.billing
            .delete(&organization_id)
            .await
            .map_err(|e| OrgSagaError::LocalCommit(e.to_string()))?;
        self.orgs
            .delete(&organization_id)
            .await
            .map_err(|e| OrgSagaError::LocalCommit(e.to_string()))?;

        if let Err(e) = self.identity.delete_org(&record.identity_org_id).await {
            tracing::warn!(org = %organization_id, error = %e, "best-effort identity org cleanup failed");
        }
        if let Some(customer_id) = &record.payment_customer_id {
            if let Err(e) = self.payments.cancel_subscription(customer_id).await {
                tracing::warn!(org = %organization_id, error = %e, "best-effort subscription cancellation failed");
            }
        }
        if let Err(e) = self.webhooks.delete_tenant(&record.identity_org_id).await {
            tracing::warn!(org = %organization_id, error = %e, "best-effort webhook tenant cleanup failed");
        }

        let affected_user_ids: Vec<String> = affected_memberships.iter().map(|m| m.user_id.to_string()).collect();
        self.bus
            .emit(
                topics::ORGANIZATION_DELETED,
                json!({ "organization_id": organization_id.to_string(), "affected_user_ids": affected_user_ids }),
            )
            .await;

        Ok(affected_user_ids)
    }

    pub fn organizations(&self) -> &R {
        &self.orgs
    }
}
