//! Entitlement resolution.
//!
//! # Responsibilities
//! - Derive the effective access tier from profile + subscription rows
//! - Apply the developer allow-list override
//!
//! # Design Decisions
//! - Pure projection: no clock reads, no provider calls, no caching;
//!   the evaluation instant is a parameter
//! - Absent rows are valid input and degrade to free-tier defaults
//! - Developer status flips the access boolean only; plan/status/expiry
//!   always report what the subscription row actually says

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::types::{Plan, Profile, Role, Subscription, SubscriptionStatus};

/// Emails granted unconditional premium access, independent of billing state.
pub const DEVELOPER_EMAILS: &[&str] = &["egeng@umich.edu", "eric@egeng.co"];

/// Effective entitlements for one user at one instant.
///
/// Recomputed from provider rows on every sign-in, sign-up, or refresh and
/// discarded on sign-out; nothing owns it persistently. Serialized camelCase
/// for the web frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessInfo {
    pub has_premium_access: bool,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_developer: bool,
}

/// Whether an email is on the developer allow-list (case-insensitive).
pub fn is_developer_email(email: Option<&str>, allow_list: &[String]) -> bool {
    let Some(email) = email else {
        return false;
    };
    if email.is_empty() {
        return false;
    }
    let lowered = email.to_lowercase();
    allow_list.iter().any(|e| e.to_lowercase() == lowered)
}

/// Compute the access tier for a user.
///
/// Premium is granted either by developer status (allow-listed email or a
/// `developer`/`admin` profile role) or by an `active`, non-free subscription
/// whose period end is strictly after `now`. A period ending exactly at `now`
/// is already expired.
pub fn resolve_access(
    email: Option<&str>,
    profile: Option<&Profile>,
    subscription: Option<&Subscription>,
    allow_list: &[String],
    now: DateTime<Utc>,
) -> AccessInfo {
    let privileged_role = matches!(
        profile.map(|p| p.role),
        Some(Role::Developer) | Some(Role::Admin)
    );
    let is_developer = is_developer_email(email, allow_list) || privileged_role;

    let subscription_grants = subscription.is_some_and(|sub| {
        sub.status == SubscriptionStatus::Active
            && sub.plan != Plan::Free
            && sub.current_period_end.is_some_and(|end| end > now)
    });

    AccessInfo {
        has_premium_access: is_developer || subscription_grants,
        plan: subscription.map(|s| s.plan).unwrap_or_default(),
        status: subscription.map(|s| s.status).unwrap_or_default(),
        expires_at: subscription.and_then(|s| s.current_period_end),
        is_developer,
    }
}
