//! Post-commit hooks keyed by rule category.
//!
//! Applying a rule can trigger a side effect beyond the balance transfer.
//! Rather than branching on category strings inside the commit path, the
//! mapping lives in one table here; adding a category with a side effect
//! means adding a row, not editing the ledger writer.

/// Side effects a rule category can attach to a successful application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCommitHook {
    /// Insert an append-only `legados` audit row for the destination student.
    LegacyAudit,
}

/// Category → hook table.
const CATEGORY_HOOKS: &[(&str, PostCommitHook)] = &[("Legado", PostCommitHook::LegacyAudit)];

/// Looks up the hook attached to a rule category, if any.
#[must_use]
pub fn hook_for_category(category: &str) -> Option<PostCommitHook> {
    CATEGORY_HOOKS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, hook)| *hook)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legado_category_has_audit_hook() {
        assert_eq!(
            hook_for_category("Legado"),
            Some(PostCommitHook::LegacyAudit)
        );
    }

    #[test]
    fn test_unknown_categories_have_no_hook() {
        assert_eq!(hook_for_category("Mérito"), None);
        assert_eq!(hook_for_category(""), None);
        // Matching is exact, not case-insensitive.
        assert_eq!(hook_for_category("legado"), None);
    }
}
