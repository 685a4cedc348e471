//! Group context builder
//!
//! Produces the matching context the prompt composer feeds to the reasoning
//! step: one [`MatchContext`] per candidate group. Groups with an empty
//! stored context get a minimal keyword set derived from their category, so
//! every group has at least something to match against.
//!
//! Pure functions, no side effects.

use crate::error::{Error, Result};
use crate::models::{ExpenseGroup, GroupCategory, MatchContext};

/// Default keywords per group category, used when a group's stored context
/// is empty.
fn default_keywords(category: GroupCategory) -> &'static [&'static str] {
    match category {
        GroupCategory::Dining => &["restaurant", "dinner", "lunch", "cafe", "bar", "takeout"],
        GroupCategory::Transport => &["uber", "lyft", "taxi", "transit", "parking", "gas"],
        GroupCategory::Household => &["grocery", "groceries", "rent", "utilities", "supplies"],
        GroupCategory::Travel => &["hotel", "flight", "airbnb", "airline", "rental", "resort"],
        GroupCategory::Other => &["shared", "misc", "general"],
    }
}

/// Build a MatchContext for a single group
pub fn build_context(group: &ExpenseGroup) -> MatchContext {
    if !group.context.is_empty() {
        return group.context.clone();
    }
    MatchContext {
        keywords: default_keywords(group.category)
            .iter()
            .map(|k| k.to_string())
            .collect(),
        merchants: Vec::new(),
        locations: Vec::new(),
    }
}

/// Build matching contexts for the full candidate list.
///
/// An empty candidate list short-circuits the whole request with
/// [`Error::NoGroups`] - there is nothing for the reasoning step to rank,
/// so no external call is made.
pub fn build_contexts(groups: &[ExpenseGroup]) -> Result<Vec<(ExpenseGroup, MatchContext)>> {
    if groups.is_empty() {
        return Err(Error::NoGroups);
    }
    Ok(groups
        .iter()
        .map(|g| (g.clone(), build_context(g)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Member;

    fn group(category: GroupCategory, context: MatchContext) -> ExpenseGroup {
        ExpenseGroup {
            id: "g1".into(),
            name: "Test".into(),
            description: String::new(),
            category,
            color: "#ffffff".into(),
            members: vec![Member {
                id: "m1".into(),
                name: "Ana".into(),
                email: "ana@example.com".into(),
            }],
            context,
        }
    }

    #[test]
    fn test_empty_context_gets_category_defaults() {
        let g = group(GroupCategory::Dining, MatchContext::default());
        let ctx = build_context(&g);
        assert!(ctx.keywords.contains(&"restaurant".to_string()));
        assert!(!ctx.keywords.is_empty());
    }

    #[test]
    fn test_stored_context_is_kept_verbatim() {
        let stored = MatchContext {
            keywords: vec!["sushi".into()],
            merchants: vec!["Nobu".into()],
            locations: vec!["SF".into()],
        };
        let g = group(GroupCategory::Dining, stored.clone());
        assert_eq!(build_context(&g), stored);
    }

    #[test]
    fn test_every_category_has_nonempty_defaults() {
        for category in [
            GroupCategory::Dining,
            GroupCategory::Transport,
            GroupCategory::Household,
            GroupCategory::Travel,
            GroupCategory::Other,
        ] {
            let g = group(category, MatchContext::default());
            assert!(!build_context(&g).keywords.is_empty());
        }
    }

    #[test]
    fn test_empty_candidate_list_short_circuits() {
        let err = build_contexts(&[]).unwrap_err();
        assert!(matches!(err, Error::NoGroups));
    }

    #[test]
    fn test_contexts_preserve_group_order() {
        let mut g1 = group(GroupCategory::Dining, MatchContext::default());
        g1.id = "g1".into();
        let mut g2 = group(GroupCategory::Travel, MatchContext::default());
        g2.id = "g2".into();

        let contexts = build_contexts(&[g1, g2]).unwrap();
        assert_eq!(contexts[0].0.id, "g1");
        assert_eq!(contexts[1].0.id, "g2");
    }
}
