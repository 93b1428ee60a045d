//! Common test utilities and fixtures.
//!
//! Interface descriptors and host objects shared by the bridge
//! integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;

use hybrid_abi::{DynamicObject, HostError, HostValue};
use hybrid_spec::{EnumDescriptor, InterfaceDescriptor, MethodDescriptor, RecordDescriptor, ValueKind};

// =============================================================================
// Image
// =============================================================================

pub fn size_record() -> RecordDescriptor {
    RecordDescriptor::new("Size")
        .field("width", ValueKind::Int)
        .field("height", ValueKind::Int)
}

pub fn pixel_format() -> EnumDescriptor {
    EnumDescriptor::numeric("PixelFormat", [("rgb", 0), ("rgba", 1), ("yuv", 2)])
}

pub fn image_format() -> EnumDescriptor {
    EnumDescriptor::text("ImageFormat", ["jpg", "png"])
}

pub fn on_finished() -> MethodDescriptor {
    MethodDescriptor::callback().param("path", ValueKind::String)
}

pub fn image_descriptor() -> InterfaceDescriptor {
    InterfaceDescriptor::builder("Image")
        .readonly("size", ValueKind::Record(size_record()))
        .readonly("pixelFormat", ValueKind::Enum(pixel_format()))
        .property("someSettableProp", ValueKind::Double)
        .method(
            MethodDescriptor::new("toArrayBuffer")
                .param("format", ValueKind::Enum(image_format()))
                .returns(ValueKind::Buffer),
        )
        .method(
            MethodDescriptor::new("saveToFile")
                .param("path", ValueKind::String)
                .param("onFinished", ValueKind::callback(on_finished())),
        )
        .build()
        .unwrap()
}

/// A host image implementing everything except `toArrayBuffer`.
pub fn host_image() -> Arc<DynamicObject> {
    let prop = Arc::new(parking_lot::Mutex::new(HostValue::Double(0.0)));
    let read = Arc::clone(&prop);
    let write = Arc::clone(&prop);
    DynamicObject::builder("NativeImage")
        .method("getSize", |_| {
            Ok(HostValue::record([
                ("width", HostValue::Int(100)),
                ("height", HostValue::Int(50)),
            ]))
        })
        .method("getPixelFormat", |_| Ok(HostValue::Int(1)))
        .method("getSomeSettableProp", move |_| Ok(read.lock().clone()))
        .method("setSomeSettableProp", move |args| {
            let value = args.into_iter().next().unwrap_or(HostValue::Null);
            *write.lock() = value;
            Ok(HostValue::Null)
        })
        .method("saveToFile", |args| {
            let mut args = args.into_iter();
            let path = args.next().unwrap_or(HostValue::Null);
            match args.next() {
                Some(HostValue::Callable(on_finished)) => {
                    on_finished.call(vec![path])?;
                    Ok(HostValue::Null)
                }
                _ => Err(HostError::with_class("TypeError", "onFinished is not a function")),
            }
        })
        .memory_size(100 * 50 * 4)
        .build()
}

// =============================================================================
// Car / Person
// =============================================================================

pub fn person_descriptor() -> InterfaceDescriptor {
    InterfaceDescriptor::builder("Person")
        .readonly("name", ValueKind::String)
        .property("age", ValueKind::Int)
        .build()
        .unwrap()
}

pub fn car_record() -> RecordDescriptor {
    RecordDescriptor::new("Car")
        .field("make", ValueKind::String)
        .field("year", ValueKind::Int)
        .field("power", ValueKind::Double)
        .field("powertrain", ValueKind::Enum(EnumDescriptor::text("Powertrain", ["electric", "gas", "hybrid"])))
        .field("driver", ValueKind::optional(ValueKind::interface("Person")))
}

pub fn garage_descriptor() -> InterfaceDescriptor {
    InterfaceDescriptor::builder("Garage")
        .property("car", ValueKind::Record(car_record()))
        .method(
            MethodDescriptor::new("driverOf")
                .param("car", ValueKind::Record(car_record()))
                .returns(ValueKind::optional(ValueKind::interface("Person"))),
        )
        .build()
        .unwrap()
}

pub fn host_person(name: &str, age: i64) -> Arc<DynamicObject> {
    let name = name.to_string();
    let age = Arc::new(parking_lot::Mutex::new(age));
    let read = Arc::clone(&age);
    DynamicObject::builder("NativePerson")
        .method("getName", move |_| Ok(HostValue::string(&name)))
        .method("getAge", move |_| Ok(HostValue::Int(*read.lock())))
        .method("setAge", move |args| match args.first() {
            Some(HostValue::Int(v)) => {
                *age.lock() = *v;
                Ok(HostValue::Null)
            }
            _ => Err(HostError::new("age must be an int")),
        })
        .build()
}

/// A garage storing whatever car record it is given.
pub fn host_garage() -> Arc<DynamicObject> {
    let car = Arc::new(parking_lot::Mutex::new(HostValue::Null));
    let read = Arc::clone(&car);
    DynamicObject::builder("NativeGarage")
        .method("getCar", move |_| Ok(read.lock().clone()))
        .method("setCar", move |args| {
            *car.lock() = args.into_iter().next().unwrap_or(HostValue::Null);
            Ok(HostValue::Null)
        })
        .method("driverOf", |args| match args.into_iter().next() {
            Some(HostValue::Record(fields)) => Ok(fields.get("driver").cloned().unwrap_or(HostValue::Null)),
            _ => Err(HostError::new("driverOf expects a car")),
        })
        .build()
}
