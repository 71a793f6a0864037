//! Member filter deciding which operations of a guarded type are wrapped.
//!
//! By default, formatting, representation, introspection, and
//! construction operations are left unguarded. Rules added on top of the
//! defaults can exclude more members or bring excluded ones back.

/// Members that are never wrapped unless a rule includes them explicitly.
pub const DEFAULT_EXCLUDED: [&str; 9] = [
    "fmt",
    "to_string",
    "repr",
    "format",
    "type_name",
    "type_id",
    "new",
    "default",
    "init",
];

/// A rule to apply on top of the default exclusions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterRule {
    /// Wrap the named member even if it is excluded by default
    Include(String),
    /// Leave the named member unwrapped
    Exclude(String),
}

impl FilterRule {
    fn name(&self) -> &str {
        match self {
            Self::Include(name) | Self::Exclude(name) => name,
        }
    }
}

/// Decides, per member name, whether a member is wrapped.
///
/// Rules are checked newest first; the first rule naming the member decides.
/// Without a matching rule, a member is wrapped unless it is one of the
/// default exclusions (and those are enabled).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberFilter {
    default_exclusions: bool,
    rules:              Vec<FilterRule>,
}

impl Default for MemberFilter {
    fn default() -> Self {
        Self {
            default_exclusions: true,
            rules:              Vec::new(),
        }
    }
}

impl MemberFilter {
    /// A filter with the default exclusions and no extra rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter that wraps every member.
    #[must_use]
    pub fn wrap_all() -> Self {
        Self {
            default_exclusions: false,
            rules:              Vec::new(),
        }
    }

    /// Adds a rule wrapping `name`.
    #[must_use]
    pub fn include(mut self, name: impl Into<String>) -> Self {
        self.rules.push(FilterRule::Include(name.into()));
        self
    }

    /// Adds a rule leaving `name` unwrapped.
    #[must_use]
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.rules.push(FilterRule::Exclude(name.into()));
        self
    }

    /// The extra rules, oldest first.
    #[must_use]
    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// Whether `name` is wrapped under this filter.
    #[must_use]
    pub fn is_guarded(&self, name: &str) -> bool {
        if let Some(rule) = self.rules.iter().rev().find(|rule| rule.name() == name) {
            return matches!(rule, FilterRule::Include(_));
        }
        !(self.default_exclusions && DEFAULT_EXCLUDED.contains(&name))
    }
}
