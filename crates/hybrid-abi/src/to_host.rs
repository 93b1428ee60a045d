//! Native to host conversion.

use std::collections::BTreeMap;
use std::sync::Arc;

use hybrid_spec::{EnumDescriptor, EnumRepr, RecordDescriptor, ValueKind};

use crate::callback::{NativeCallable, NativeCallback};
use crate::host::{HostCallableRef, HostValue};
use crate::logging::trace;
use crate::text::HostString;
use crate::value::{NativeRecord, NativeValue};
use crate::{Marshaler, MarshalError};

impl Marshaler {
    /// Convert a native value into the host representation of `kind`.
    pub fn to_host(&self, kind: &ValueKind, value: &NativeValue) -> Result<HostValue, MarshalError> {
        trace!(kind = %kind, got = value.type_name(), "to_host");
        let host = match (kind, value) {
            (ValueKind::Void, NativeValue::Void) => HostValue::Null,
            (ValueKind::Int, NativeValue::Int(i)) => HostValue::Int(*i),
            (ValueKind::Double, NativeValue::Double(d)) => HostValue::Double(*d),
            (ValueKind::Bool, NativeValue::Bool(b)) => HostValue::Bool(*b),
            (ValueKind::String, NativeValue::String(s)) => HostValue::String(HostString::from(s.as_str())),
            (ValueKind::Buffer, NativeValue::Buffer(b)) => HostValue::Buffer(b.clone()),
            (ValueKind::Enum(e), NativeValue::Enum(v)) => enum_to_host(e, *v)?,
            (ValueKind::Optional { .. }, NativeValue::Optional(None)) => HostValue::Null,
            (ValueKind::Optional { of }, NativeValue::Optional(Some(inner))) => self.to_host(of, inner)?,
            (ValueKind::Array { of }, NativeValue::Array(items)) => HostValue::Array(
                items
                    .iter()
                    .map(|item| self.to_host(of, item))
                    .collect::<Result<_, _>>()?,
            ),
            (ValueKind::Map { of }, NativeValue::Map(entries)) => HostValue::Record(
                entries
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), self.to_host(of, value)?)))
                    .collect::<Result<_, MarshalError>>()?,
            ),
            (ValueKind::Record(r), NativeValue::Record(record)) => self.record_to_host(r, record)?,
            (ValueKind::Callback(_), NativeValue::Callback(callback)) => {
                HostValue::Callable(self.callback_to_host(callback))
            }
            (ValueKind::InterfaceRef { name }, NativeValue::Object(object)) => {
                if object.interface_name() != name {
                    return Err(MarshalError::mismatch(
                        name,
                        format!("object of interface {}", object.interface_name()),
                    ));
                }
                HostValue::Object(object.host_handle()?)
            }
            (kind, value) => return Err(MarshalError::mismatch(kind, value.type_name())),
        };
        Ok(host)
    }

    fn record_to_host(
        &self,
        descriptor: &RecordDescriptor,
        record: &NativeRecord,
    ) -> Result<HostValue, MarshalError> {
        if record.name != descriptor.name {
            return Err(MarshalError::mismatch(&descriptor.name, format!("record {}", record.name)));
        }
        let mut fields = BTreeMap::new();
        for field in &descriptor.fields {
            let value = match record.get(&field.name) {
                Some(value) => self.to_host(&field.kind, value)?,
                None if field.kind.is_optional() => HostValue::Null,
                None => {
                    return Err(MarshalError::MissingField {
                        record: descriptor.name.clone(),
                        field: field.name.clone(),
                    });
                }
            };
            fields.insert(field.name.clone(), value);
        }
        Ok(HostValue::Record(fields))
    }

    fn callback_to_host(&self, callback: &NativeCallback) -> HostCallableRef {
        // a host callable that came to native and goes back is passed through
        if let Some(callable) = callback.host_callable() {
            return callable.clone();
        }
        Arc::new(NativeCallable::new(callback.clone(), self.clone()))
    }
}

fn enum_to_host(descriptor: &EnumDescriptor, value: i32) -> Result<HostValue, MarshalError> {
    let member = descriptor
        .by_value(value)
        .ok_or_else(|| MarshalError::mismatch(&descriptor.name, format!("enum value {}", value)))?;
    Ok(match descriptor.repr {
        EnumRepr::Numeric => HostValue::Int(i64::from(member.value)),
        EnumRepr::Text => HostValue::string(&member.name),
    })
}
