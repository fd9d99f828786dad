use super::{ChildProps, ComponentProps, ComponentRegistry, RouteRender};
use crate::{
    match_path, ActiveRouter, Barrier, MatchOptions, MatchResult, RouteState,
    RoutePattern, RouterError, Subscription, Unsubscribe,
};
use core::fmt;
use futures::{channel::oneshot, future::LocalBoxFuture, FutureExt};
use std::{cell::RefCell, future::Future, rc::Rc};
use typed_builder::TypedBuilder;

/// Resolves once a route's rendered child has finished mounting or updating.
pub type ChildReady = LocalBoxFuture<'static, ()>;

/// The declared configuration of a single route.
#[derive(TypedBuilder)]
pub struct RouteProps<V: 'static> {
    /// The pattern this route should match. Static (`users`), a parameter
    /// (`:id`), a trailing wildcard (`files/*path`), or a list of
    /// alternatives tried in order.
    #[builder(setter(into))]
    pub url: RoutePattern,
    /// The name of the component to build from the [`ComponentRegistry`]
    /// when the route is visible.
    #[builder(default, setter(strip_option, into))]
    pub component: Option<String>,
    /// Static props merged into every child the route renders.
    #[builder(default)]
    pub component_props: ComponentProps,
    /// Whether the pattern has to consume the whole path.
    #[builder(default)]
    pub exact: bool,
    /// Sibling routes sharing a group show at most one member at a time.
    #[builder(default, setter(strip_option, into))]
    pub group: Option<String>,
    /// Rank within `group`; lowest wins. Unranked members lose to ranked
    /// ones.
    #[builder(default, setter(strip_option))]
    pub group_index: Option<u32>,
    /// Renders the child directly instead of going through `component`.
    #[builder(default, setter(strip_option))]
    pub route_render: Option<RouteRender<V>>,
}

impl<V: 'static> fmt::Debug for RouteProps<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteProps")
            .field("url", &self.url)
            .field("component", &self.component)
            .field("component_props", &self.component_props)
            .field("exact", &self.exact)
            .field("group", &self.group)
            .field("group_index", &self.group_index)
            .field("route_render", &self.route_render.is_some())
            .finish()
    }
}

/// Attributes a route applies to its own host element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostData {
    pub style: Vec<(&'static str, &'static str)>,
}

impl HostData {
    pub fn hidden() -> Self {
        Self {
            style: vec![("display", "none")],
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.style.contains(&("display", "none"))
    }
}

/// One declared route, bound to the host's lifecycle.
///
/// The host calls [`will_load`](Self::will_load) before the route first
/// mounts, [`did_update`](Self::did_update) after every re-render and
/// [`did_unload`](Self::did_unload) once it is gone. In between the route
/// follows the router: it records each match it is handed, and the router
/// does not consider a navigation settled until the route's next
/// `did_update` has run.
pub struct RouteBinding<V: 'static> {
    inner: Rc<BindingInner<V>>,
}

struct BindingInner<V: 'static> {
    router: Option<ActiveRouter>,
    props: RouteProps<V>,
    options: MatchOptions,
    state: RefCell<BindingState>,
    subscription: RefCell<Option<Unsubscribe>>,
}

#[derive(Default)]
struct BindingState {
    matched: Option<MatchResult>,
    active_in_group: bool,
    pending_active: bool,
    rerendered: Option<oneshot::Sender<()>>,
}

impl<V: 'static> fmt::Debug for RouteBinding<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("RouteBinding")
            .field("props", &self.inner.props)
            .field("matched", &state.matched)
            .field("active_in_group", &state.active_in_group)
            .field("subscribed", &self.inner.subscription.borrow().is_some())
            .finish()
    }
}

impl<V: 'static> RouteBinding<V> {
    /// Binds a route to `router`. A route without a router never matches
    /// and stays hidden.
    pub fn new(router: Option<ActiveRouter>, props: RouteProps<V>) -> Self {
        let options = MatchOptions {
            path: props.url.clone(),
            exact: props.exact,
            strict: true,
        };
        Self {
            inner: Rc::new(BindingInner {
                router,
                props,
                options,
                state: RefCell::new(BindingState::default()),
                subscription: RefCell::new(None),
            }),
        }
    }

    pub fn props(&self) -> &RouteProps<V> {
        &self.inner.props
    }

    pub fn router(&self) -> Option<&ActiveRouter> {
        self.inner.router.as_ref()
    }

    /// The match most recently handed to this route.
    pub fn matched(&self) -> Option<MatchResult> {
        self.inner.state.borrow().matched.clone()
    }

    pub fn active_in_group(&self) -> bool {
        self.inner.state.borrow().active_in_group
    }

    /// Whether the route is waiting for a `did_update` to settle a
    /// navigation.
    pub fn is_pending(&self) -> bool {
        self.inner.state.borrow().rerendered.is_some()
    }

    /// Matches `pathname`, or the router's current pathname, against this
    /// route's pattern.
    pub fn compute_match(
        &self,
        pathname: Option<&str>,
    ) -> Result<Option<MatchResult>, RouterError> {
        self.inner.compute_match(pathname)
    }

    /// Subscribes to the router. The route's state for the current location
    /// arrives before this returns.
    pub fn will_load(&self) -> Result<(), RouterError> {
        let Some(router) = &self.inner.router else {
            return Ok(());
        };
        if self.inner.subscription.borrow().is_some() {
            return Ok(());
        }

        let is_match = {
            let inner = Rc::downgrade(&self.inner);
            move |pathname: Option<&str>| match inner.upgrade() {
                Some(inner) => inner.compute_match(pathname),
                None => Ok(None),
            }
        };
        let listener = {
            let inner = Rc::downgrade(&self.inner);
            move |state: RouteState| match inner.upgrade() {
                Some(inner) => inner.receive(state),
                None => async { Ok(()) }.boxed_local(),
            }
        };
        let mut subscription = Subscription::new(is_match, listener);
        if let Some(group) = &self.inner.props.group {
            subscription = subscription.in_group(group, self.inner.props.group_index);
        }

        let unsubscribe = router.subscribe(subscription)?;
        *self.inner.subscription.borrow_mut() = Some(unsubscribe);
        Ok(())
    }

    /// Runs after the host re-rendered this route. Waits for `child_ready`,
    /// releases the router's barrier and applies the latest group flag.
    pub fn did_update(
        &self,
        child_ready: Option<ChildReady>,
    ) -> impl Future<Output = ()> + 'static {
        let inner = Rc::clone(&self.inner);
        // a delivery arriving while the child settles arms its own barrier
        let rerendered = inner.state.borrow_mut().rerendered.take();
        async move {
            if let Some(child_ready) = child_ready {
                child_ready.await;
            }
            if let Some(rerendered) = rerendered {
                _ = rerendered.send(());
            }
            let mut state = inner.state.borrow_mut();
            let pending = state.pending_active;
            state.active_in_group = pending;
        }
    }

    /// Unsubscribes from the router. Calling it again does nothing.
    pub fn did_unload(&self) {
        let subscription = self.inner.subscription.borrow_mut().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        // nothing will re-render this route any more
        let rerendered = self.inner.state.borrow_mut().rerendered.take();
        if let Some(rerendered) = rerendered {
            _ = rerendered.send(());
        }
    }

    /// Hides the route's host element unless the route is bound, matched
    /// and, when grouped, the active member of its group.
    pub fn host_data(&self) -> Option<HostData> {
        let state = self.inner.state.borrow();
        let hidden = self.inner.router.is_none()
            || state.matched.is_none()
            || (self.inner.props.group.is_some() && !state.active_in_group);
        hidden.then(HostData::hidden)
    }

    pub fn is_visible(&self) -> bool {
        self.host_data().is_none()
    }

    /// Builds the route's child for the current match.
    ///
    /// Returns `None` while the route is unbound or unmatched, or when it
    /// names a component `components` does not know.
    pub fn render(&self, components: &ComponentRegistry<V>) -> Option<V> {
        let router = self.inner.router.as_ref()?;
        let matched = self.inner.state.borrow().matched.clone()?;
        let props = &self.inner.props;
        let child_props = ChildProps {
            component_props: props.component_props.clone(),
            history: router.history(),
            matched,
            component: None,
        };

        if let Some(route_render) = &props.route_render {
            return Some(route_render(ChildProps {
                component: props.component.clone(),
                ..child_props
            }));
        }

        let component = props.component.as_deref()?;
        let view = components.create(component, child_props);
        if view.is_none() {
            tracing::warn!(component, "no component registered under this name");
        }
        view
    }
}

impl<V: 'static> BindingInner<V> {
    fn compute_match(
        &self,
        pathname: Option<&str>,
    ) -> Result<Option<MatchResult>, RouterError> {
        let Some(router) = &self.router else {
            return Ok(None);
        };
        let pathname = match pathname {
            Some(pathname) => pathname.to_string(),
            None => match router.route_pathname() {
                Some(pathname) => pathname,
                None => return Ok(None),
            },
        };
        match_path(&pathname, &self.options)
    }

    fn receive(&self, state: RouteState) -> Barrier {
        let (tx, rx) = oneshot::channel();
        let stale = {
            let mut current = self.state.borrow_mut();
            current.matched = state.matched;
            current.pending_active = state.active_in_group;
            current.rerendered.replace(tx)
        };
        if let Some(stale) = stale {
            _ = stale.send(());
        }
        async move { rx.await.map_err(|_| RouterError::BarrierDropped) }
            .boxed_local()
    }
}

impl<V: 'static> Drop for RouteBinding<V> {
    fn drop(&mut self) {
        self.did_unload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryHistory, RouterOptions};

    fn router_at(path: &str) -> ActiveRouter {
        ActiveRouter::new(
            Rc::new(MemoryHistory::new(path).unwrap()),
            RouterOptions::default(),
        )
    }

    fn route(url: &str) -> RouteProps<String> {
        RouteProps::builder().url(url).component("page").build()
    }

    #[test]
    fn unbound_route_is_hidden_and_renders_nothing() {
        let binding = RouteBinding::new(None, route("/"));
        binding.will_load().unwrap();
        assert_eq!(binding.compute_match(Some("/")), Ok(None));
        assert_eq!(binding.host_data(), Some(HostData::hidden()));
        let components =
            ComponentRegistry::new().register("page", |_| "page".to_string());
        assert_eq!(binding.render(&components), None);
    }

    #[test]
    fn compute_match_is_strict() {
        let binding = RouteBinding::new(Some(router_at("/")), route("/users/"));
        assert_eq!(binding.compute_match(Some("/users")), Ok(None));
        assert!(binding.compute_match(Some("/users/1")).unwrap().is_some());
    }

    #[test]
    fn will_load_subscribes_once() {
        let binding = RouteBinding::new(Some(router_at("/")), route("/"));
        binding.will_load().unwrap();
        binding.will_load().unwrap();
        assert!(binding.matched().is_some());
        assert!(binding.is_pending());
        binding.did_unload();
        binding.did_unload();
        assert!(!binding.is_pending());
    }

    #[test]
    fn unknown_component_renders_nothing() {
        let binding = RouteBinding::new(Some(router_at("/")), route("/"));
        binding.will_load().unwrap();
        let components: ComponentRegistry<String> = ComponentRegistry::new();
        assert_eq!(binding.render(&components), None);
    }

    #[test]
    fn hidden_data_is_display_none() {
        assert!(HostData::hidden().is_hidden());
    }
}
