use crate::error::IamError;
use async_trait::async_trait;
use std::fmt::Debug;
use velaux_kernel::domain::config::RbacRule;
use velaux_kernel::domain::identity::{Caller, Permission};

const WILDCARD: &str = "*";
const USER_PREFIX: &str = "user:";
const GROUP_PREFIX: &str = "group:";

/// Decides whether a caller may perform an action on a resource.
#[async_trait]
pub trait PermissionChecker: Send + Sync + Debug {
    /// # Errors
    /// Returns an error when no decision can be made (e.g. the backend is unavailable).
    async fn check(&self, caller: &Caller, permission: Permission) -> Result<bool, IamError>;
}

/// Static allow-list built from `security.rbac.rules`.
#[derive(Debug, Clone, Default)]
pub struct RuleChecker {
    rules: Vec<RbacRule>,
}

impl RuleChecker {
    /// # Errors
    /// Returns [`IamError::Validation`] for subjects that are neither `*`, `user:<name>` nor `group:<name>`.
    pub fn new(rules: Vec<RbacRule>) -> Result<Self, IamError> {
        for subject in rules.iter().flat_map(|rule| &rule.subjects) {
            let named = subject
                .strip_prefix(USER_PREFIX)
                .or_else(|| subject.strip_prefix(GROUP_PREFIX))
                .is_some_and(|name| !name.is_empty());
            if subject != WILDCARD && !named {
                return Err(IamError::Validation {
                    message: format!("unsupported RBAC subject '{subject}'").into(),
                    context: None,
                });
            }
        }
        Ok(Self { rules })
    }

    fn allows(rule: &RbacRule, caller: &Caller, permission: Permission) -> bool {
        let subject = rule.subjects.iter().any(|s| {
            s == WILDCARD
                || s.strip_prefix(USER_PREFIX).is_some_and(|user| user == caller.username)
                || s.strip_prefix(GROUP_PREFIX).is_some_and(|group| caller.in_group(group))
        });
        subject
            && matches_any(&rule.resources, permission.resource)
            && matches_any(&rule.actions, permission.action)
    }
}

fn matches_any(patterns: &[String], value: &str) -> bool {
    patterns.iter().any(|p| p == WILDCARD || p == value)
}

#[async_trait]
impl PermissionChecker for RuleChecker {
    async fn check(&self, caller: &Caller, permission: Permission) -> Result<bool, IamError> {
        let allowed = self.rules.iter().any(|rule| Self::allows(rule, caller, permission));
        tracing::debug!(user = %caller.username, %permission, allowed, "Permission evaluated");
        Ok(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use velaux_kernel::domain::constants::{ACTION_DETAIL, ACTION_UPDATE, SYSTEM_SETTING};

    const UPDATE: Permission = Permission::new(SYSTEM_SETTING, ACTION_UPDATE);

    fn rule(subjects: &[&str], resources: &[&str], actions: &[&str]) -> RbacRule {
        let owned = |items: &[&str]| items.iter().map(|s| (*s).to_owned()).collect();
        RbacRule { subjects: owned(subjects), resources: owned(resources), actions: owned(actions) }
    }

    #[tokio::test]
    async fn matches_users_groups_and_wildcards() {
        let checker = RuleChecker::new(vec![
            rule(&["user:alice"], &[SYSTEM_SETTING], &[ACTION_UPDATE]),
            rule(&["group:admins"], &["*"], &["*"]),
            rule(&["*"], &[SYSTEM_SETTING], &[ACTION_DETAIL]),
        ])
        .expect("valid rules");

        assert!(checker.check(&Caller::new("alice"), UPDATE).await.expect("decision"));
        assert!(!checker.check(&Caller::new("bob"), UPDATE).await.expect("decision"));

        let admin = Caller::new("carol").with_groups(["admins"]);
        assert!(checker.check(&admin, UPDATE).await.expect("decision"));

        let detail = Permission::new(SYSTEM_SETTING, ACTION_DETAIL);
        assert!(checker.check(&Caller::new("bob"), detail).await.expect("decision"));
    }

    #[tokio::test]
    async fn empty_rule_set_denies() {
        let checker = RuleChecker::new(Vec::new()).expect("valid rules");
        assert!(!checker.check(&Caller::new("alice"), UPDATE).await.expect("decision"));
    }

    #[test]
    fn rejects_unknown_subject_forms() {
        for subject in ["alice", "user:", "team:ops"] {
            let err = RuleChecker::new(vec![rule(&[subject], &["*"], &["*"])]).expect_err(subject);
            assert!(matches!(err, IamError::Validation { .. }));
        }
    }
}
