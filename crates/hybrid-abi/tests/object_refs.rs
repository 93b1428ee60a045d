//! Interface references and callbacks through a custom object bridge.

#![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hybrid_abi::{
    DynamicObject, HostFunction, HostHandle, HostValue, Marshaler, MarshalError, NativeCallback,
    NativeObject, NativeValue, ObjectBridge, ObjectRef,
};
use hybrid_spec::{MethodDescriptor, ValueKind};
use parking_lot::Mutex;

#[derive(Debug)]
struct FakeProxy {
    interface: String,
    handle: HostHandle,
    released: AtomicBool,
}

impl NativeObject for FakeProxy {
    fn interface_name(&self) -> &str {
        &self.interface
    }

    fn host_handle(&self) -> Result<HostHandle, MarshalError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(MarshalError::UseAfterRelease {
                interface: self.interface.clone(),
            });
        }
        Ok(self.handle.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Keeps one proxy per host object, like a registry would.
#[derive(Default)]
struct FakeBridge {
    live: Mutex<Vec<Arc<FakeProxy>>>,
}

impl ObjectBridge for FakeBridge {
    fn wrap(&self, interface: &str, handle: &HostHandle) -> Result<ObjectRef, MarshalError> {
        if interface != "Person" {
            return Err(MarshalError::UnknownInterface(interface.to_string()));
        }
        let mut live = self.live.lock();
        if let Some(existing) = live.iter().find(|p| p.handle.same_object(handle)) {
            return Ok(existing.clone());
        }
        let proxy = Arc::new(FakeProxy {
            interface: interface.to_string(),
            handle: handle.clone(),
            released: AtomicBool::new(false),
        });
        live.push(proxy.clone());
        Ok(proxy)
    }
}

fn person() -> HostHandle {
    HostHandle::new(DynamicObject::builder("Person").build())
}

#[test]
fn same_host_object_maps_to_same_native_object() {
    let bridge = Arc::new(FakeBridge::default());
    let m = Marshaler::new(bridge.clone(), Arc::new(hybrid_abi::InlineContext));
    let kind = ValueKind::interface("Person");
    let host = person();

    let a = m.to_native(&kind, &HostValue::Object(host.clone())).unwrap();
    let b = m.to_native(&kind, &HostValue::Object(host.clone())).unwrap();
    assert_eq!(a, b);
    assert_eq!(bridge.live.lock().len(), 1);

    let back = m.to_host(&kind, &a).unwrap();
    assert_eq!(back, HostValue::Object(host));
}

#[test]
fn unknown_interface_and_wrong_interface() {
    let bridge = Arc::new(FakeBridge::default());
    let m = Marshaler::new(bridge, Arc::new(hybrid_abi::InlineContext));

    let err = m.to_native(&ValueKind::interface("Car"), &HostValue::Object(person()));
    assert_eq!(err, Err(MarshalError::UnknownInterface("Car".to_string())));

    let proxy = m.to_native(&ValueKind::interface("Person"), &HostValue::Object(person())).unwrap();
    let err = m.to_host(&ValueKind::interface("Image"), &proxy).unwrap_err();
    assert!(matches!(err, MarshalError::TypeMismatch { .. }));
}

#[test]
fn released_object_cannot_be_passed() {
    let bridge = Arc::new(FakeBridge::default());
    let m = Marshaler::new(bridge.clone(), Arc::new(hybrid_abi::InlineContext));
    let kind = ValueKind::optional(ValueKind::interface("Person"));

    let value = m.to_native(&kind, &HostValue::Object(person())).unwrap();
    bridge.live.lock()[0].released.store(true, Ordering::SeqCst);

    let err = m.to_host(&kind, &value).unwrap_err();
    assert_eq!(
        err,
        MarshalError::UseAfterRelease {
            interface: "Person".to_string()
        }
    );
    assert_eq!(m.to_host(&kind, &NativeValue::none()), Ok(HostValue::Null));
}

#[test]
fn callbacks_roundtrip_to_the_original() {
    let m = Marshaler::detached();
    let kind = ValueKind::callback(MethodDescriptor::callback().param("path", ValueKind::String));

    let host_fn = HostFunction::new("onFinished", |_| Ok(HostValue::Null));
    let native = m.to_native(&kind, &HostValue::Callable(host_fn.clone())).unwrap();
    let back = m.to_host(&kind, &native).unwrap();
    assert_eq!(back, HostValue::Callable(host_fn));

    let signature = MethodDescriptor::callback().param("path", ValueKind::String);
    let cb = NativeCallback::from_fn(signature, |_| Ok(NativeValue::Void));
    let host = m.to_host(&kind, &NativeValue::Callback(cb.clone())).unwrap();
    let again = m.to_native(&kind, &host).unwrap();
    match again {
        NativeValue::Callback(c) => assert!(c.ptr_eq(&cb)),
        other => panic!("expected callback, got {other:?}"),
    }
}

#[test]
fn host_callback_arguments_are_marshaled() {
    let m = Marshaler::detached();
    let kind = ValueKind::callback(
        MethodDescriptor::callback()
            .param("a", ValueKind::Int)
            .param("b", ValueKind::Int)
            .returns(ValueKind::Int),
    );
    let add = HostFunction::new("add", |args| match args.as_slice() {
        [HostValue::Int(a), HostValue::Int(b)] => Ok(HostValue::Int(a + b)),
        _ => Ok(HostValue::Null),
    });
    let native = m.to_native(&kind, &HostValue::Callable(add)).unwrap();
    let cb = native.as_callback().unwrap();
    assert!(cb.is_host());
    assert_eq!(cb.invoke(vec![NativeValue::Int(2), NativeValue::Int(3)]), Ok(NativeValue::Int(5)));

    // an argument of the wrong kind fails before reaching the host
    let err = cb.invoke(vec![NativeValue::Int(2), NativeValue::Double(3.0)]);
    assert!(err.is_err());
}
