use crate::{MatchResult, RouterHistory};
use core::fmt;
use std::{collections::HashMap, rc::Rc};

/// Static props passed through to a route's child.
pub type ComponentProps = serde_json::Map<String, serde_json::Value>;

/// Renders a route's child directly instead of looking up a component.
pub type RouteRender<V> = Rc<dyn Fn(ChildProps) -> V>;

/// Everything a matched route hands to the child it renders.
#[derive(Clone)]
pub struct ChildProps {
    /// The route's static `component_props`.
    pub component_props: ComponentProps,
    pub history: Rc<dyn RouterHistory>,
    pub matched: MatchResult,
    /// The route's component name. Only set for a [`RouteRender`].
    pub component: Option<String>,
}

impl fmt::Debug for ChildProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildProps")
            .field("component_props", &self.component_props)
            .field("matched", &self.matched)
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

/// Maps component names to the factories that build them.
pub struct ComponentRegistry<V> {
    factories: HashMap<String, Rc<dyn Fn(ChildProps) -> V>>,
}

impl<V> ComponentRegistry<V> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register(
        mut self,
        name: impl Into<String>,
        factory: impl Fn(ChildProps) -> V + 'static,
    ) -> Self {
        self.insert(name, factory);
        self
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(ChildProps) -> V + 'static,
    ) {
        self.factories.insert(name.into(), Rc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Builds the component registered as `name`, if there is one.
    pub fn create(&self, name: &str, props: ChildProps) -> Option<V> {
        self.factories.get(name).map(|factory| factory(props))
    }
}

impl<V> Default for ComponentRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ComponentRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}
