use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Authenticated identity scoping every storage operation.
///
/// `user_id` must match a thread's owner exactly; `organization_id` and
/// `tenant_id` match with null-equals-null semantics, so a thread created
/// without an org is only visible to tokens without an org claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserContext {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}
