use crate::error::{Error, Result};
use crate::plugin::{CohortPlugin, Plugin, PluginOptions};
use crate::{gregor, plugin};
use std::fmt;

type Constructor = fn(&PluginOptions) -> Result<Box<dyn CohortPlugin>>;

fn construct<P: Plugin>(options: &PluginOptions) -> Result<Box<dyn CohortPlugin>> {
    Ok(Box::new(P::from_options(options)?))
}

/// A registered, not yet instantiated, plugin.
#[derive(Clone, Copy)]
pub struct PluginType {
    name: &'static str,
    constructor: Constructor,
}

impl PluginType {
    pub fn of<P: Plugin>() -> Self {
        Self {
            name: P::NAME,
            constructor: construct::<P>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Creates a plugin instance.
    ///
    /// A failure is logged and returned as `Error::Load` wrapping the cause.
    pub fn instantiate(&self, options: &PluginOptions) -> Result<Box<dyn CohortPlugin>> {
        (self.constructor)(options).map_err(|e| {
            log::error!("Error loading plugin {}: {}", self.name, e);
            Error::Load {
                name: self.name.to_owned(),
                source: Box::new(e),
            }
        })
    }
}

impl fmt::Debug for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PluginType").field(&self.name).finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginType>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the plugins shipped with this crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        plugin::register(&mut registry);
        gregor::register(&mut registry);
        registry
    }

    /// Adds `P` under its name. A name that is already taken keeps its
    /// first registration.
    pub fn register<P: Plugin>(&mut self) -> &mut Self {
        if self.plugins.iter().any(|p| p.name == P::NAME) {
            log::warn!("plugin {} is already registered, ignoring", P::NAME);
            return self;
        }
        log::debug!("registering plugin {}", P::NAME);
        self.plugins.push(PluginType::of::<P>());
        self
    }

    /// The plugin registered under `name`.
    pub fn load(&self, name: &str) -> Result<PluginType> {
        self.plugins
            .iter()
            .find(|p| p.name == name)
            .copied()
            .ok_or_else(|| Error::PluginNotFound(name.to_owned()))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.iter().map(|p| p.name)
    }
}
