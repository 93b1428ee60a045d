//! Interface registration and proxy lifecycle.
//!
//! The registry maps interface names to descriptors and factories, and
//! host object identities to their live proxy. The identity map holds
//! only weak references: a proxy stays alive because callers hold it, and
//! removes its own entry when it is released or dropped.
//!
//! The map is the one process-wide mutable structure and sits behind a
//! single mutex. No proxy is ever dropped while that mutex is held, since
//! dropping a proxy takes the mutex to prune its entry.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock, const_rwlock};

use hybrid_abi::{
    HandleId, HostContext, HostError, HostHandle, HostObject, InlineContext, MarshalError,
    Marshaler, ObjectBridge, ObjectRef, run_blocking,
};
use hybrid_spec::InterfaceDescriptor;

use crate::config::BridgeConfig;
use crate::error::{BindingCause, BridgeError, Result};
use crate::logging::{debug, info};
use crate::proxy::ProxyInstance;

/// Creates a new host object for an interface.
pub type Factory = dyn Fn() -> std::result::Result<Arc<dyn HostObject>, HostError> + Send + Sync;

struct Registration {
    descriptor: Arc<InterfaceDescriptor>,
    factory: Option<Arc<Factory>>,
}

pub(crate) struct RegistryInner {
    this: Weak<RegistryInner>,
    interfaces: RwLock<HashMap<String, Registration>>,
    live: Mutex<HashMap<HandleId, Weak<ProxyInstance>>>,
    context: Arc<dyn HostContext>,
    cache_member_handles: bool,
}

impl RegistryInner {
    fn descriptor(&self, interface: &str) -> Result<Arc<InterfaceDescriptor>> {
        self.interfaces
            .read()
            .get(interface)
            .map(|r| Arc::clone(&r.descriptor))
            .ok_or_else(|| BridgeError::UnknownInterface(interface.to_string()))
    }

    fn bind(&self, interface: &str, handle: &HostHandle) -> Result<Arc<ProxyInstance>> {
        let descriptor = self.descriptor(interface)?;
        let registry = self
            .this
            .upgrade()
            .ok_or_else(|| BridgeError::UnknownInterface(interface.to_string()))?;
        let id = handle.id();

        let (proxy, created) = {
            let mut live = self.live.lock();
            match live.get(&id).and_then(Weak::upgrade) {
                Some(existing) => (existing, false),
                None => {
                    let proxy = Arc::new(ProxyInstance::new(
                        descriptor,
                        handle.clone(),
                        registry,
                        self.cache_member_handles,
                    ));
                    live.insert(id, Arc::downgrade(&proxy));
                    (proxy, true)
                }
            }
        };

        if proxy.interface_name() != interface {
            let cause = MarshalError::TypeMismatch {
                expected: interface.to_string(),
                got: format!("object bound as {}", proxy.interface_name()),
            };
            return Err(BridgeError::Binding {
                interface: interface.to_string(),
                member: "<bind>".to_string(),
                cause: BindingCause::Marshal(cause),
            });
        }
        if created {
            debug!(interface, handle = %id, class = handle.class_name(), "proxy created");
        }
        Ok(proxy)
    }

    /// Remove the entry for `id` if it still belongs to `proxy`.
    pub(crate) fn forget(&self, id: HandleId, proxy: &ProxyInstance) {
        let mut live = self.live.lock();
        if live
            .get(&id)
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), proxy))
        {
            live.remove(&id);
        }
    }
}

impl ObjectBridge for RegistryInner {
    fn wrap(&self, interface: &str, handle: &HostHandle) -> std::result::Result<ObjectRef, MarshalError> {
        match self.bind(interface, handle) {
            Ok(proxy) => Ok(proxy as ObjectRef),
            Err(BridgeError::UnknownInterface(name)) => Err(MarshalError::UnknownInterface(name)),
            Err(BridgeError::Binding {
                cause: BindingCause::Marshal(e),
                ..
            }) => Err(e),
            Err(other) => Err(MarshalError::Wrap {
                interface: interface.to_string(),
                reason: other.to_string(),
            }),
        }
    }
}

/// The interface registry and identity map.
///
/// Cloning is cheap and shares the same registry.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry running factory-created objects inline, with member caching.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// A registry set up from configuration.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        Ok(Self::builder()
            .context(config.context.build()?)
            .cache_member_handles(config.proxy.cache_member_handles)
            .build())
    }

    /// Register an interface together with a factory for its host objects.
    pub fn register<F>(&self, descriptor: InterfaceDescriptor, factory: F) -> Result<()>
    where
        F: Fn() -> std::result::Result<Arc<dyn HostObject>, HostError> + Send + Sync + 'static,
    {
        self.insert(descriptor, Some(Arc::new(factory)))
    }

    /// Register an interface whose host objects are created by the host.
    pub fn register_descriptor(&self, descriptor: InterfaceDescriptor) -> Result<()> {
        self.insert(descriptor, None)
    }

    fn insert(&self, descriptor: InterfaceDescriptor, factory: Option<Arc<Factory>>) -> Result<()> {
        let mut interfaces = self.inner.interfaces.write();
        let name = descriptor.name().to_string();
        if interfaces.contains_key(&name) {
            return Err(BridgeError::DuplicateRegistration { interface: name });
        }
        info!(
            interface = %name,
            properties = descriptor.properties().len(),
            methods = descriptor.methods().len(),
            factory = factory.is_some(),
            "interface registered"
        );
        interfaces.insert(
            name,
            Registration {
                descriptor: Arc::new(descriptor),
                factory,
            },
        );
        Ok(())
    }

    /// Instantiate a new host object through the interface's factory and
    /// bind it to a proxy.
    pub fn create(&self, interface: &str) -> Result<Arc<ProxyInstance>> {
        let factory = {
            let interfaces = self.inner.interfaces.read();
            let registration = interfaces
                .get(interface)
                .ok_or_else(|| BridgeError::UnknownInterface(interface.to_string()))?;
            registration
                .factory
                .clone()
                .ok_or_else(|| BridgeError::NoFactory(interface.to_string()))?
        };

        let context = Arc::clone(&self.inner.context);
        let object = run_blocking(context.as_ref(), move || factory())
            .map_err(|e| BridgeError::binding(interface, "<create>", e))?
            .map_err(|e| BridgeError::binding(interface, "<create>", e))?;

        self.get_or_create(interface, &HostHandle::with_context(object, context))
    }

    /// The live proxy for `handle`, or a new one bound as `interface`.
    ///
    /// One host object maps to at most one live proxy. Asking for an
    /// object already bound under another interface fails with a
    /// [`BindingCause::Marshal`] type mismatch.
    pub fn get_or_create(&self, interface: &str, handle: &HostHandle) -> Result<Arc<ProxyInstance>> {
        self.inner.bind(interface, handle)
    }

    /// Release a proxy: drop its host handle and forget its identity.
    ///
    /// Releasing twice fails with [`BridgeError::AlreadyReleased`].
    pub fn release(&self, proxy: &ProxyInstance) -> Result<()> {
        proxy.release()
    }

    /// Release every live proxy. Returns how many were released.
    pub fn release_all(&self) -> usize {
        let weaks: Vec<Weak<ProxyInstance>> = self.inner.live.lock().values().cloned().collect();
        // upgrade and release outside the lock
        weaks
            .into_iter()
            .filter_map(|weak| weak.upgrade())
            .filter(|proxy| proxy.release().is_ok())
            .count()
    }

    pub fn descriptor(&self, interface: &str) -> Result<Arc<InterfaceDescriptor>> {
        self.inner.descriptor(interface)
    }

    /// Registered interface names, sorted.
    pub fn interfaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.interfaces.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of live proxies.
    pub fn live_count(&self) -> usize {
        self.inner
            .live
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// The live proxy for a host object identity.
    pub fn lookup(&self, id: HandleId) -> Option<Arc<ProxyInstance>> {
        let weak = self.inner.live.lock().get(&id).cloned();
        weak.and_then(|w| w.upgrade())
    }

    /// This registry as the object bridge used for marshaling.
    pub fn bridge(&self) -> Arc<dyn ObjectBridge> {
        self.inner.clone()
    }

    /// A marshaler that wraps host objects through this registry.
    pub fn marshaler(&self) -> Marshaler {
        Marshaler::new(self.bridge(), Arc::clone(&self.inner.context))
    }

    /// The context factory-created objects run on.
    pub fn context(&self) -> &Arc<dyn HostContext> {
        &self.inner.context
    }
}

impl ObjectBridge for Registry {
    fn wrap(&self, interface: &str, handle: &HostHandle) -> std::result::Result<ObjectRef, MarshalError> {
        self.inner.wrap(interface, handle)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("interfaces", &self.interfaces())
            .field("live", &self.live_count())
            .field("context", &self.inner.context.name())
            .finish()
    }
}

/// Builder for [`Registry`].
pub struct RegistryBuilder {
    context: Arc<dyn HostContext>,
    cache_member_handles: bool,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            context: Arc::new(InlineContext),
            cache_member_handles: true,
        }
    }
}

impl RegistryBuilder {
    /// Context that objects created through factories run on.
    pub fn context(mut self, context: Arc<dyn HostContext>) -> Self {
        self.context = context;
        self
    }

    /// Whether proxies memoize resolved member handles.
    pub fn cache_member_handles(mut self, enabled: bool) -> Self {
        self.cache_member_handles = enabled;
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            inner: Arc::new_cyclic(|this| RegistryInner {
                this: this.clone(),
                interfaces: RwLock::new(HashMap::new()),
                live: Mutex::new(HashMap::new()),
                context: self.context,
                cache_member_handles: self.cache_member_handles,
            }),
        }
    }
}

static GLOBAL: RwLock<Option<Registry>> = const_rwlock(None);

/// Install the process-wide registry.
pub fn install(config: &BridgeConfig) -> Result<Registry> {
    install_registry(Registry::from_config(config)?)
}

/// Install an already built registry as the process-wide one.
pub fn install_registry(registry: Registry) -> Result<Registry> {
    let mut global = GLOBAL.write();
    if global.is_some() {
        return Err(BridgeError::AlreadyInstalled);
    }
    *global = Some(registry.clone());
    info!(context = registry.context().name(), "global registry installed");
    Ok(registry)
}

/// The process-wide registry.
pub fn global() -> Result<Registry> {
    GLOBAL.read().clone().ok_or(BridgeError::NotInstalled)
}

/// Uninstall the process-wide registry and release its live proxies.
pub fn teardown() -> Result<usize> {
    let registry = GLOBAL.write().take().ok_or(BridgeError::NotInstalled)?;
    let released = registry.release_all();
    info!(released, "global registry torn down");
    Ok(released)
}
