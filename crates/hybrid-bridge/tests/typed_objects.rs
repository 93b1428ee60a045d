//! Typed wrappers and interface references marshaled through the registry.

#![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

mod common;

use std::sync::Arc;

use common::{
    garage_descriptor, host_garage, host_image, host_person, image_descriptor, person_descriptor,
};
use hybrid_abi::{HostHandle, HostObject, NativeObject};
use hybrid_bridge::prelude::*;
use proptest::prelude::*;

// =============================================================================
// Typed wrappers
// =============================================================================

struct HybridImage(Arc<ProxyInstance>);

impl TypedProxy for HybridImage {
    const INTERFACE: &'static str = "Image";

    fn from_proxy(proxy: Arc<ProxyInstance>) -> Self {
        Self(proxy)
    }

    fn proxy(&self) -> &Arc<ProxyInstance> {
        &self.0
    }
}

impl HybridImage {
    fn size(&self) -> Result<(i64, i64)> {
        let size: NativeRecord = self.proxy().get_as("size")?;
        let width = size.get("width").and_then(NativeValue::as_int).unwrap_or_default();
        let height = size.get("height").and_then(NativeValue::as_int).unwrap_or_default();
        Ok((width, height))
    }

    fn some_settable_prop(&self) -> Result<f64> {
        self.proxy().get_as("someSettableProp")
    }

    fn set_some_settable_prop(&self, value: f64) -> Result<()> {
        self.proxy().set("someSettableProp", value.into_native())
    }

    fn to_array_buffer(&self, format: &str) -> Result<SharedBuffer> {
        let format = match format {
            "jpg" => 0,
            _ => 1,
        };
        self.proxy().call_as("toArrayBuffer", vec![NativeValue::Enum(format)])
    }
}

struct HybridPerson(Arc<ProxyInstance>);

impl TypedProxy for HybridPerson {
    const INTERFACE: &'static str = "Person";

    fn from_proxy(proxy: Arc<ProxyInstance>) -> Self {
        Self(proxy)
    }

    fn proxy(&self) -> &Arc<ProxyInstance> {
        &self.0
    }
}

impl HybridPerson {
    fn name(&self) -> Result<String> {
        self.proxy().get_as("name")
    }
}

fn registry() -> Registry {
    let registry = Registry::new();
    registry
        .register(image_descriptor(), || Ok(host_image() as Arc<dyn HostObject>))
        .unwrap();
    registry
        .register(person_descriptor(), || Ok(host_person("Ada", 36) as Arc<dyn HostObject>))
        .unwrap();
    registry
        .register(garage_descriptor(), || Ok(host_garage() as Arc<dyn HostObject>))
        .unwrap();
    registry
}

#[test]
fn test_typed_wrapper() {
    let image: HybridImage = registry().create_typed().unwrap();
    assert_eq!(image.size().unwrap(), (100, 50));

    image.set_some_settable_prop(0.75).unwrap();
    assert_eq!(image.some_settable_prop().unwrap(), 0.75);

    let err = image.to_array_buffer("png").unwrap_err();
    assert!(err.is_not_implemented());
    assert_eq!(err.to_string(), "Image.toArrayBuffer(...) is not yet implemented!");
}

#[test]
fn test_capabilities_through_wrapper() {
    let image: HybridImage = registry().create_typed().unwrap();
    assert_eq!(image.get_property("pixelFormat").unwrap(), NativeValue::Enum(1));
    assert!(image.call_method("toArrayBuffer", vec![NativeValue::Enum(0)]).is_err());
    assert_eq!(image.external_memory_size(), 20_000);

    HasLifecycle::release(&image).unwrap();
    assert!(HasLifecycle::is_released(&image));
    assert!(image.get_property("size").unwrap_err().is_use_after_release());
}

#[test]
fn test_wrap_typed_preserves_identity() {
    let registry = registry();
    let handle = HostHandle::new(host_image());
    let a: HybridImage = registry.wrap_typed(&handle).unwrap();
    let b: HybridImage = registry.wrap_typed(&handle).unwrap();
    assert!(Arc::ptr_eq(a.proxy(), b.proxy()));
}

#[test]
fn test_from_value_checks_interface() {
    let registry = registry();
    let person: HybridPerson = registry.create_typed().unwrap();
    let value = person.to_value();

    assert!(HybridImage::from_value(value.clone()).is_none());
    let again = HybridPerson::from_value(value).unwrap();
    assert!(Arc::ptr_eq(again.proxy(), person.proxy()));
    assert!(HybridPerson::from_value(NativeValue::Int(1)).is_none());
}

// =============================================================================
// Interface references
// =============================================================================

fn car(driver: NativeValue) -> NativeRecord {
    NativeRecord::new("Car")
        .with("make", NativeValue::string("Volvo"))
        .with("year", NativeValue::Int(2019))
        .with("power", NativeValue::Double(180.5))
        .with("powertrain", NativeValue::Enum(2))
        .with("driver", driver)
}

#[test]
fn test_record_with_object_roundtrip() {
    let registry = registry();
    let garage = registry.create("Garage").unwrap();
    let person: HybridPerson = registry.create_typed().unwrap();

    let parked = car(NativeValue::some(person.to_value()));
    garage.set("car", NativeValue::Record(parked.clone())).unwrap();
    let back = garage.get("car").unwrap();
    assert_eq!(back, NativeValue::Record(parked));

    // the host handed back the same object, so the same proxy comes out
    let driver = garage
        .call("driverOf", vec![back])
        .unwrap();
    let NativeValue::Optional(Some(driver)) = driver else {
        panic!("expected a driver");
    };
    let driver = HybridPerson::from_value(*driver).unwrap();
    assert!(Arc::ptr_eq(driver.proxy(), person.proxy()));
    assert_eq!(driver.name().unwrap(), "Ada");
}

#[test]
fn test_record_without_driver() {
    let registry = registry();
    let garage = registry.create("Garage").unwrap();
    let parked = car(NativeValue::none());

    garage.set("car", NativeValue::Record(parked.clone())).unwrap();
    assert_eq!(garage.get("car").unwrap(), NativeValue::Record(parked.clone()));
    assert_eq!(
        garage.call("driverOf", vec![NativeValue::Record(parked)]).unwrap(),
        NativeValue::none()
    );
}

#[test]
fn test_released_object_cannot_be_passed() {
    let registry = registry();
    let garage = registry.create("Garage").unwrap();
    let person: HybridPerson = registry.create_typed().unwrap();
    let value = person.to_value();
    person.proxy().release().unwrap();

    let err = garage
        .set("car", NativeValue::Record(car(NativeValue::some(value))))
        .unwrap_err();
    assert!(err.is_use_after_release());
}

#[test]
fn test_wrong_interface_cannot_be_passed() {
    let registry = registry();
    let garage = registry.create("Garage").unwrap();
    let image = registry.create("Image").unwrap();

    let err = garage
        .set("car", NativeValue::Record(car(NativeValue::some(NativeValue::Object(image)))))
        .unwrap_err();
    assert!(err.is_type_mismatch());
}

#[test]
fn test_marshaler_wraps_through_registry() {
    let registry = registry();
    let marshaler = registry.marshaler();
    let handle = HostHandle::new(host_person("Lin", 29));

    let kind = ValueKind::interface("Person");
    let native = marshaler.to_native(&kind, &HostValue::Object(handle.clone())).unwrap();
    let object = native.as_object().unwrap();
    assert_eq!(object.interface_name(), "Person");
    assert!(Arc::ptr_eq(
        &(registry.lookup(handle.id()).unwrap() as Arc<dyn NativeObject>),
        object
    ));

    let host = marshaler.to_host(&kind, &native).unwrap();
    assert_eq!(host, HostValue::Object(handle));

    let unknown = marshaler
        .to_native(&ValueKind::interface("Robot"), &HostValue::Object(HostHandle::new(host_person("R", 1))))
        .unwrap_err();
    assert!(matches!(unknown, hybrid_abi::MarshalError::UnknownInterface(ref name) if name == "Robot"));
}

proptest! {
    #[test]
    fn prop_car_roundtrip_through_host(
        make in "[A-Za-z ]{0,16}",
        year in 1900i64..2100,
        power in proptest::num::f64::NORMAL,
        powertrain in 0i32..3,
        with_driver in any::<bool>(),
    ) {
        let registry = registry();
        let garage = registry.create("Garage").unwrap();
        let person: HybridPerson = registry.create_typed().unwrap();
        let driver = if with_driver {
            NativeValue::some(person.to_value())
        } else {
            NativeValue::none()
        };
        let record = NativeRecord::new("Car")
            .with("make", NativeValue::string(make))
            .with("year", NativeValue::Int(year))
            .with("power", NativeValue::Double(power))
            .with("powertrain", NativeValue::Enum(powertrain))
            .with("driver", driver);

        garage.set("car", NativeValue::Record(record.clone())).unwrap();
        prop_assert_eq!(garage.get("car").unwrap(), NativeValue::Record(record));
    }
}
