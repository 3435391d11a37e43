use airweave_core::types::{OrganizationId, UserId};

#[derive(Debug, Clone)]
pub struct OrganizationRecord {
    pub id: OrganizationId,
    pub name: String,
    pub identity_org_id: String,
    pub payment_customer_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MembershipRecord {
    pub organization_id: OrganizationId,
    pub user_id: UserId,
    pub is_owner: bool,
}

#[derive(Debug, Clone)]
pub struct BillingRecord {
    pub organization_id: OrganizationId,
    pub payment_customer_id: String,
    pub subscription_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiKeyRecord {
    pub organization_id: OrganizationId,
    pub key_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub owner_user_id: UserId,
    pub owner_email: String,
    pub is_production: bool,
}
