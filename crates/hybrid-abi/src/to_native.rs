//! Host to native conversion.

use hybrid_spec::{EnumDescriptor, EnumRepr, MethodDescriptor, RecordDescriptor, ValueKind};

use crate::callback::{NativeCallable, NativeCallback};
use crate::host::{HostCallableRef, HostValue};
use crate::logging::trace;
use crate::value::{NativeRecord, NativeValue};
use crate::{Marshaler, MarshalError};

use std::collections::BTreeMap;

impl Marshaler {
    /// Convert a host value into the native representation of `kind`.
    pub fn to_native(&self, kind: &ValueKind, value: &HostValue) -> Result<NativeValue, MarshalError> {
        trace!(kind = %kind, got = value.type_name(), "to_native");
        let native = match (kind, value) {
            (ValueKind::Void, HostValue::Null) => NativeValue::Void,
            (ValueKind::Int, HostValue::Int(i)) => NativeValue::Int(*i),
            (ValueKind::Double, HostValue::Double(d)) => NativeValue::Double(*d),
            (ValueKind::Bool, HostValue::Bool(b)) => NativeValue::Bool(*b),
            (ValueKind::String, HostValue::String(s)) => NativeValue::String(s.decode()?),
            (ValueKind::Buffer, HostValue::Buffer(b)) => NativeValue::Buffer(b.clone()),
            (ValueKind::Enum(e), v) => NativeValue::Enum(enum_to_native(e, v)?),
            (ValueKind::Optional { .. }, HostValue::Null) => NativeValue::Optional(None),
            (ValueKind::Optional { of }, v) => NativeValue::some(self.to_native(of, v)?),
            (ValueKind::Array { of }, HostValue::Array(items)) => NativeValue::Array(
                items
                    .iter()
                    .map(|item| self.to_native(of, item))
                    .collect::<Result<_, _>>()?,
            ),
            (ValueKind::Map { of }, HostValue::Record(entries)) => NativeValue::Map(
                entries
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), self.to_native(of, value)?)))
                    .collect::<Result<_, MarshalError>>()?,
            ),
            (ValueKind::Record(r), HostValue::Record(fields)) => {
                NativeValue::Record(self.record_to_native(r, fields)?)
            }
            (ValueKind::Callback(signature), HostValue::Callable(callable)) => {
                NativeValue::Callback(self.callback_to_native(signature, callable))
            }
            (ValueKind::InterfaceRef { name }, HostValue::Object(handle)) => {
                NativeValue::Object(self.bridge.wrap(name, handle)?)
            }
            (kind, value) => return Err(MarshalError::mismatch(kind, value.type_name())),
        };
        Ok(native)
    }

    fn record_to_native(
        &self,
        descriptor: &RecordDescriptor,
        fields: &BTreeMap<String, HostValue>,
    ) -> Result<NativeRecord, MarshalError> {
        let mut record = NativeRecord::new(descriptor.name.clone());
        for field in &descriptor.fields {
            let value = match fields.get(&field.name) {
                Some(value) => self.to_native(&field.kind, value)?,
                None if field.kind.is_optional() => NativeValue::Optional(None),
                None => {
                    return Err(MarshalError::MissingField {
                        record: descriptor.name.clone(),
                        field: field.name.clone(),
                    });
                }
            };
            record.fields.push((field.name.clone(), value));
        }
        Ok(record)
    }

    fn callback_to_native(&self, signature: &MethodDescriptor, callable: &HostCallableRef) -> NativeCallback {
        // a native callback that went to the host and came back is unwrapped
        if let Some(adapter) = callable.as_any().downcast_ref::<NativeCallable>() {
            return adapter.callback().clone();
        }
        NativeCallback::from_host(signature.clone(), callable.clone(), self.clone())
    }
}

fn enum_to_native(descriptor: &EnumDescriptor, value: &HostValue) -> Result<i32, MarshalError> {
    let member = match (descriptor.repr, value) {
        (EnumRepr::Numeric, HostValue::Int(i)) => i32::try_from(*i)
            .ok()
            .and_then(|v| descriptor.by_value(v))
            .ok_or_else(|| MarshalError::mismatch(&descriptor.name, format!("int {}", i)))?,
        (EnumRepr::Text, HostValue::String(s)) => {
            let text = s.decode()?;
            descriptor
                .by_name(&text)
                .ok_or_else(|| MarshalError::mismatch(&descriptor.name, format!("string \"{}\"", text)))?
        }
        (_, value) => return Err(MarshalError::mismatch(&descriptor.name, value.type_name())),
    };
    Ok(member.value)
}
