//! Feature-module resolution.
//!
//! A client configuration is assembled from an ordered list of entries,
//! each contributing, removing, or replacing modules. Resolution is
//! deterministic: entries are processed strictly in input order and the
//! result is a de-duplicated module list with unique feature ids.
use std::collections::HashMap;
use std::sync::Arc;

/// Identity of a logical feature. Two modules with equal ids provide the
/// same feature and must never both end up in a resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureId(String);

impl FeatureId {
    /// Create a feature id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FeatureId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

struct ModuleInner {
    name: String,
    feature_id: Option<FeatureId>,
}

/// A named bundle of bindings contributed to the client configuration.
///
/// Cheap to clone; clones are the *same* module. Module identity is handle
/// identity, not name equality — two separately constructed modules are
/// always distinct, even with equal names.
#[derive(Clone)]
pub struct Module {
    inner: Arc<ModuleInner>,
}

impl Module {
    /// A plain container module with no feature identity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ModuleInner {
                name: name.into(),
                feature_id: None,
            }),
        }
    }

    /// A feature module identified by `feature_id`.
    pub fn feature(name: impl Into<String>, feature_id: impl Into<FeatureId>) -> Self {
        Self {
            inner: Arc::new(ModuleInner {
                name: name.into(),
                feature_id: Some(feature_id.into()),
            }),
        }
    }

    /// The module's name (diagnostic only, not identity).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The feature this module provides, if any.
    pub fn feature_id(&self) -> Option<&FeatureId> {
        self.inner.feature_id.as_ref()
    }

    /// Whether `other` is the same module instance.
    pub fn same(&self, other: &Module) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.inner.name)
            .field("feature_id", &self.inner.feature_id)
            .finish()
    }
}

/// Declarative add/remove/replace of modules. Within one directive the
/// removals apply first, then the additions, then the replacements.
#[derive(Debug, Default)]
pub struct ModuleDirective {
    /// Modules added (distinctly) at the current end of the list.
    pub add: Vec<Module>,
    /// Modules removed from the current list. A removed module may be
    /// re-added by a later entry.
    pub remove: Vec<Module>,
    /// Modules replacing an existing module with the same feature id,
    /// keeping its position. With no match the replacement is appended.
    pub replace: Vec<Module>,
}

/// One entry of a container configuration.
#[derive(Debug)]
pub enum ContainerConfiguration {
    /// A module contributed directly.
    Module(Module),
    /// An add/remove/replace directive.
    Directive(ModuleDirective),
}

impl ContainerConfiguration {
    /// A directive that only adds modules.
    pub fn add(modules: Vec<Module>) -> Self {
        Self::Directive(ModuleDirective {
            add: modules,
            ..ModuleDirective::default()
        })
    }

    /// A directive that only removes modules.
    pub fn remove(modules: Vec<Module>) -> Self {
        Self::Directive(ModuleDirective {
            remove: modules,
            ..ModuleDirective::default()
        })
    }

    /// A directive that only replaces modules.
    pub fn replace(modules: Vec<Module>) -> Self {
        Self::Directive(ModuleDirective {
            replace: modules,
            ..ModuleDirective::default()
        })
    }
}

impl From<Module> for ContainerConfiguration {
    fn from(module: Module) -> Self {
        Self::Module(module)
    }
}

/// Errors from container resolution.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Two distinct modules claim the same feature.
    #[error("duplicate feature modules configured for: {ids}")]
    DuplicateFeature {
        /// The offending feature ids, comma separated.
        ids: String,
    },
}

/// Resolve an ordered configuration into the final module list.
///
/// Modules are de-duplicated by identity; removal and re-addition across
/// entries is allowed. After processing, feature modules must have unique
/// feature ids; a collision is a configuration error. Plain modules (no
/// feature id) are exempt from the uniqueness check.
pub fn resolve_container_configuration(
    entries: impl IntoIterator<Item = ContainerConfiguration>,
) -> Result<Vec<Module>, ContainerError> {
    let mut modules: Vec<Module> = Vec::new();

    for entry in entries {
        match entry {
            ContainerConfiguration::Module(module) => add_distinct(&mut modules, module),
            ContainerConfiguration::Directive(directive) => {
                for removed in &directive.remove {
                    modules.retain(|module| !module.same(removed));
                }
                for added in directive.add {
                    add_distinct(&mut modules, added);
                }
                for replacement in directive.replace {
                    apply_replacement(&mut modules, replacement);
                }
            }
        }
    }

    check_unique_features(&modules)?;
    Ok(modules)
}

fn add_distinct(modules: &mut Vec<Module>, module: Module) {
    if !modules.iter().any(|existing| existing.same(&module)) {
        modules.push(module);
    }
}

fn apply_replacement(modules: &mut Vec<Module>, replacement: Module) {
    let position = replacement.feature_id().and_then(|id| {
        modules
            .iter()
            .position(|module| module.feature_id() == Some(id))
    });
    match position {
        Some(position) => modules[position] = replacement,
        None => {
            tracing::warn!(
                module = replacement.name(),
                "no module with a matching feature id to replace; appending"
            );
            add_distinct(modules, replacement);
        }
    }
}

fn check_unique_features(modules: &[Module]) -> Result<(), ContainerError> {
    let mut counts: HashMap<&FeatureId, usize> = HashMap::new();
    for module in modules {
        if let Some(id) = module.feature_id() {
            *counts.entry(id).or_insert(0) += 1;
        }
    }
    let mut duplicates: Vec<&str> = counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(id, _)| id.as_str())
        .collect();
    if duplicates.is_empty() {
        return Ok(());
    }
    duplicates.sort_unstable();
    Err(ContainerError::DuplicateFeature {
        ids: duplicates.join(", "),
    })
}
