// src/registry.rs
//
// Environment and agent registries.
//
// A registry is an explicit value built by whoever drives a run; nothing is
// registered as a side effect of loading a module. Each spec carries a
// validated id of the form `[namespace/]name-vN`, default keyword overrides,
// and a factory closure that builds a fresh instance.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;

use crate::agent::Agent;
use crate::env::Environment;
use crate::error::{SimError, SimResult};
use crate::space::ActionSpace;

/// Registration id grammar: optional namespace, name (group 1), version (group 2).
pub const ID_PATTERN: &str = r"^(?:[\w:-]+/)?([\w:.-]+)-v(\d+)$";

static ID_REGEX: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

/// Override every agent factory accepts. Orchestrated runs set it from the
/// run seed; agents without randomness ignore it.
pub const SEED_OVERRIDE: &str = "seed";

/// Keyword overrides passed to a factory.
pub type Overrides = BTreeMap<String, Value>;

pub type BoxedEnv<O, A> = Box<dyn Environment<Observation = O, Action = A>>;
pub type BoxedAgent<O, A> = Box<dyn Agent<O, A>>;

pub type EnvFactory<O, A> = Arc<dyn Fn(&Overrides) -> SimResult<BoxedEnv<O, A>> + Send + Sync>;
pub type AgentFactory<O, A> =
    Arc<dyn Fn(&ActionSpace, &Overrides) -> SimResult<BoxedAgent<O, A>> + Send + Sync>;

/// A parsed registration id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryId {
    id: String,
    name: String,
    version: u32,
}

impl RegistryId {
    pub fn parse(id: &str) -> SimResult<Self> {
        let malformed = || SimError::MalformedId {
            id: id.to_string(),
            pattern: ID_PATTERN.to_string(),
        };
        let regex = ID_REGEX
            .get_or_init(|| Regex::new(ID_PATTERN))
            .as_ref()
            .map_err(|_| malformed())?;
        let caps = regex.captures(id).ok_or_else(malformed)?;
        let version = caps[2].parse::<u32>().map_err(|_| malformed())?;
        Ok(Self {
            id: id.to_string(),
            name: caps[1].to_string(),
            version,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Anything that can be stored in a [`Registry`].
pub trait Spec {
    fn registry_id(&self) -> &RegistryId;

    fn id(&self) -> &str {
        self.registry_id().as_str()
    }

    fn name(&self) -> &str {
        self.registry_id().name()
    }

    fn version(&self) -> u32 {
        self.registry_id().version()
    }
}

fn merged(defaults: &Overrides, overrides: &Overrides) -> Overrides {
    let mut all = defaults.clone();
    all.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    all
}

/// Specification of one registered environment.
pub struct EnvSpec<O, A> {
    id: RegistryId,
    kwargs: Overrides,
    factory: EnvFactory<O, A>,
}

impl<O, A> EnvSpec<O, A> {
    pub fn new<F>(id: &str, factory: F) -> SimResult<Self>
    where
        F: Fn(&Overrides) -> SimResult<BoxedEnv<O, A>> + Send + Sync + 'static,
    {
        Ok(Self {
            id: RegistryId::parse(id)?,
            kwargs: Overrides::new(),
            factory: Arc::new(factory),
        })
    }

    /// Default overrides, applied before those given to `make`.
    pub fn with_kwargs(mut self, kwargs: Overrides) -> Self {
        self.kwargs = kwargs;
        self
    }

    pub fn kwargs(&self) -> &Overrides {
        &self.kwargs
    }

    /// Build a fresh environment.
    pub fn make(&self, overrides: &Overrides) -> SimResult<BoxedEnv<O, A>> {
        (self.factory)(&merged(&self.kwargs, overrides))
    }
}

impl<O, A> Spec for EnvSpec<O, A> {
    fn registry_id(&self) -> &RegistryId {
        &self.id
    }
}

impl<O, A> Clone for EnvSpec<O, A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            kwargs: self.kwargs.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<O, A> fmt::Debug for EnvSpec<O, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvSpec")
            .field("id", &self.id.as_str())
            .field("kwargs", &self.kwargs)
            .finish_non_exhaustive()
    }
}

/// Specification of one registered agent.
pub struct AgentSpec<O, A> {
    id: RegistryId,
    kwargs: Overrides,
    factory: AgentFactory<O, A>,
}

impl<O, A> AgentSpec<O, A> {
    pub fn new<F>(id: &str, factory: F) -> SimResult<Self>
    where
        F: Fn(&ActionSpace, &Overrides) -> SimResult<BoxedAgent<O, A>> + Send + Sync + 'static,
    {
        Ok(Self {
            id: RegistryId::parse(id)?,
            kwargs: Overrides::new(),
            factory: Arc::new(factory),
        })
    }

    pub fn with_kwargs(mut self, kwargs: Overrides) -> Self {
        self.kwargs = kwargs;
        self
    }

    pub fn kwargs(&self) -> &Overrides {
        &self.kwargs
    }

    /// Build a fresh agent for an environment with `space`.
    pub fn make(&self, space: &ActionSpace, overrides: &Overrides) -> SimResult<BoxedAgent<O, A>> {
        (self.factory)(space, &merged(&self.kwargs, overrides))
    }
}

impl<O, A> Spec for AgentSpec<O, A> {
    fn registry_id(&self) -> &RegistryId {
        &self.id
    }
}

impl<O, A> Clone for AgentSpec<O, A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            kwargs: self.kwargs.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<O, A> fmt::Debug for AgentSpec<O, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSpec")
            .field("id", &self.id.as_str())
            .field("kwargs", &self.kwargs)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of specs with unique ids.
#[derive(Debug, Clone)]
pub struct Registry<S> {
    specs: Vec<S>,
}

pub type EnvRegistry<O, A> = Registry<EnvSpec<O, A>>;
pub type AgentRegistry<O, A> = Registry<AgentSpec<O, A>>;

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self { specs: Vec::new() }
    }
}

impl<S: Spec> Registry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: S) -> SimResult<()> {
        if self.get(spec.id()).is_some() {
            return Err(SimError::DuplicateId {
                id: spec.id().to_string(),
            });
        }
        self.specs.push(spec);
        Ok(())
    }

    /// Every spec, in registration order.
    pub fn all(&self) -> &[S] {
        &self.specs
    }

    pub fn get(&self, id: &str) -> Option<&S> {
        self.specs.iter().find(|s| s.id() == id)
    }

    pub fn spec(&self, id: &str) -> SimResult<&S> {
        self.get(id).ok_or_else(|| SimError::UnknownId { id: id.to_string() })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.id())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Keep only the specs whose id satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.specs.retain(|s| keep(s.id()));
    }
}

impl<O, A> EnvRegistry<O, A> {
    pub fn make(&self, id: &str, overrides: &Overrides) -> SimResult<BoxedEnv<O, A>> {
        self.spec(id)?.make(overrides)
    }
}

impl<O, A> AgentRegistry<O, A> {
    pub fn make(
        &self,
        id: &str,
        space: &ActionSpace,
        overrides: &Overrides,
    ) -> SimResult<BoxedAgent<O, A>> {
        self.spec(id)?.make(space, overrides)
    }
}

/// Fail with `DuplicateId` if any id occurs in more than one of `registries`.
pub fn ensure_unique_ids<S: Spec>(registries: &[Registry<S>]) -> SimResult<()> {
    let mut seen = HashSet::new();
    for id in registries.iter().flat_map(Registry::ids) {
        if !seen.insert(id) {
            return Err(SimError::DuplicateId { id: id.to_string() });
        }
    }
    Ok(())
}

/// Read an optional non-negative integer override.
pub fn override_u64(overrides: &Overrides, key: &str) -> SimResult<Option<u64>> {
    match overrides.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_u64().map(Some).ok_or_else(|| SimError::InvalidOverride {
            key: key.to_string(),
            reason: format!("expected a non-negative integer, got {}", v),
        }),
    }
}

/// Reject overrides a factory does not understand.
pub fn ensure_known_overrides(overrides: &Overrides, known: &[&str]) -> SimResult<()> {
    match overrides.keys().find(|k| !known.contains(&k.as_str())) {
        Some(key) => Err(SimError::InvalidOverride {
            key: key.clone(),
            reason: format!("unknown override, expected one of [{}]", known.join(", ")),
        }),
        None => Ok(()),
    }
}
