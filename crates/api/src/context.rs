use alumni_auth::{Identity, Role};
use alumni_core::AccountId;

/// Principal context for a gated request (identity attached by the gate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    account_id: AccountId,
    role: Role,
}

impl PrincipalContext {
    pub fn new(account_id: AccountId, role: Role) -> Self {
        Self { account_id, role }
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl From<Identity> for PrincipalContext {
    fn from(value: Identity) -> Self {
        Self::new(value.subject, value.role)
    }
}
