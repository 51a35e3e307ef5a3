//! Per-object property store.
//!
//! A [`PropertyStore`] is a cheap, cloneable handle over a lock-guarded map
//! of named, typed slots. The UI thread owns every mutation; other threads
//! may hold a clone and read concurrently (e.g. a background task deciding
//! whether to request a redraw).

use std::collections::HashMap;
use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::RwLock;

use super::value::{PropertyType, PropertyValue, ValueParseError};
use crate::logging::targets;

bitflags! {
    /// Access flags of a property slot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u8 {
        /// May be changed through the public setter after installation.
        const WRITABLE = 1 << 0;
        /// May be set from markup text (builder, stylesheet).
        const BUILDABLE = 1 << 1;
        const DEFAULT = Self::WRITABLE.bits() | Self::BUILDABLE.bits();
    }
}

/// Errors from property declaration and access.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    #[error("no property named '{0}'")]
    NotFound(String),
    #[error("property '{0}' is already installed")]
    DuplicateProperty(String),
    #[error("property '{name}' expects {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: PropertyType,
        found: PropertyType,
    },
    #[error("property '{0}' is read-only")]
    ReadOnly(String),
    #[error("cannot parse value for property '{name}'")]
    ParseError {
        name: String,
        #[source]
        source: ValueParseError,
    },
    #[error("unsupported property type tag '{0}'")]
    UnsupportedType(String),
    #[error("property '{0}' cannot be set from text")]
    UnsupportedForBuilder(String),
}

#[derive(Debug, Clone)]
struct Slot {
    ty: PropertyType,
    flags: PropertyFlags,
    default: PropertyValue,
    value: Option<PropertyValue>,
}

impl Slot {
    fn current(&self) -> &PropertyValue {
        self.value.as_ref().unwrap_or(&self.default)
    }
}

/// Shared handle to an object's property slots.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    slots: Arc<RwLock<HashMap<String, Slot>>>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property. The default must satisfy `ty`.
    pub fn install(
        &self,
        name: &str,
        ty: PropertyType,
        flags: PropertyFlags,
        default: PropertyValue,
    ) -> Result<(), PropertyError> {
        check_type(name, ty, &default)?;
        let mut slots = self.slots.write();
        if slots.contains_key(name) {
            return Err(PropertyError::DuplicateProperty(name.to_owned()));
        }
        slots.insert(
            name.to_owned(),
            Slot {
                ty,
                flags,
                default,
                value: None,
            },
        );
        tracing::trace!(target: targets::PROPERTY, name, ty = %ty, "installed property");
        Ok(())
    }

    /// Declare a property from a textual type tag.
    pub fn install_tagged(
        &self,
        name: &str,
        tag: &str,
        flags: PropertyFlags,
        default: PropertyValue,
    ) -> Result<(), PropertyError> {
        let ty = PropertyType::from_tag(tag)
            .ok_or_else(|| PropertyError::UnsupportedType(tag.to_owned()))?;
        self.install(name, ty, flags, default)
    }

    /// Current value, or the default if never set.
    pub fn get(&self, name: &str) -> Result<PropertyValue, PropertyError> {
        self.slots
            .read()
            .get(name)
            .map(|slot| slot.current().clone())
            .ok_or_else(|| PropertyError::NotFound(name.to_owned()))
    }

    /// Store `value` verbatim. Fails on read-only slots and type mismatches,
    /// leaving the stored value untouched.
    pub fn set(&self, name: &str, value: PropertyValue) -> Result<(), PropertyError> {
        self.store(name, value, false)
    }

    /// Whether [`set`](Self::set) would accept `value`, without storing it.
    pub fn check(&self, name: &str, value: &PropertyValue) -> Result<(), PropertyError> {
        let slots = self.slots.read();
        let slot = slots
            .get(name)
            .ok_or_else(|| PropertyError::NotFound(name.to_owned()))?;
        if !slot.flags.contains(PropertyFlags::WRITABLE) {
            return Err(PropertyError::ReadOnly(name.to_owned()));
        }
        check_type(name, slot.ty, value)
    }

    /// Like [`set`](Self::set) but ignores the writable flag. Used by the
    /// owning widget to update its own read-only state.
    pub fn set_internal(&self, name: &str, value: PropertyValue) -> Result<(), PropertyError> {
        self.store(name, value, true)
    }

    /// Parse `text` according to the slot's type without storing it.
    pub fn parse_value(&self, name: &str, text: &str) -> Result<PropertyValue, PropertyError> {
        let slots = self.slots.read();
        let slot = slots
            .get(name)
            .ok_or_else(|| PropertyError::NotFound(name.to_owned()))?;
        if !slot.flags.contains(PropertyFlags::BUILDABLE) || !slot.ty.is_buildable() {
            return Err(PropertyError::UnsupportedForBuilder(name.to_owned()));
        }
        slot.ty.parse(text).map_err(|source| PropertyError::ParseError {
            name: name.to_owned(),
            source,
        })
    }

    /// Type-directed parse followed by [`set`](Self::set).
    pub fn set_from_string(&self, name: &str, text: &str) -> Result<(), PropertyError> {
        let value = self.parse_value(name, text)?;
        self.set(name, value)
    }

    /// Drop any stored value so the default shows through again.
    pub fn reset(&self, name: &str) -> Result<(), PropertyError> {
        let mut slots = self.slots.write();
        let slot = slots
            .get_mut(name)
            .ok_or_else(|| PropertyError::NotFound(name.to_owned()))?;
        slot.value = None;
        Ok(())
    }

    /// Whether the property has been explicitly set since install or reset.
    pub fn is_set(&self, name: &str) -> bool {
        self.slots
            .read()
            .get(name)
            .is_some_and(|slot| slot.value.is_some())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.read().contains_key(name)
    }

    pub fn property_type(&self, name: &str) -> Option<PropertyType> {
        self.slots.read().get(name).map(|slot| slot.ty)
    }

    pub fn flags(&self, name: &str) -> Option<PropertyFlags> {
        self.slots.read().get(name).map(|slot| slot.flags)
    }

    /// Number of installed properties.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Installed property names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.slots.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn store(&self, name: &str, value: PropertyValue, internal: bool) -> Result<(), PropertyError> {
        let mut slots = self.slots.write();
        let slot = slots
            .get_mut(name)
            .ok_or_else(|| PropertyError::NotFound(name.to_owned()))?;
        if !internal && !slot.flags.contains(PropertyFlags::WRITABLE) {
            return Err(PropertyError::ReadOnly(name.to_owned()));
        }
        check_type(name, slot.ty, &value)?;
        slot.value = Some(value);
        Ok(())
    }
}

fn check_type(name: &str, expected: PropertyType, value: &PropertyValue) -> Result<(), PropertyError> {
    let found = value.property_type();
    if found != expected {
        return Err(PropertyError::TypeMismatch {
            name: name.to_owned(),
            expected,
            found,
        });
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
