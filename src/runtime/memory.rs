use super::{ManagerService, ShowRequest};
use crate::binding::{DynamicObject, PropertyTarget, TypeDescriptor};
use crate::error::DocumentError;
use crate::value::{ManagerHandle, ObjectHandle};
use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::any::Any;

/// A property target the in-memory manager can also hand back by concrete type.
pub trait ManagedObject: PropertyTarget {
    fn as_any(&self) -> &dyn Any;
    fn as_target_mut(&mut self) -> &mut dyn PropertyTarget;
}

impl<T: PropertyTarget + Any> ManagedObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_target_mut(&mut self) -> &mut dyn PropertyTarget {
        self
    }
}

/// One creatable item in a catalog file: where it lives and what it looks like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub path: String,
    pub item_id: String,
    #[serde(rename = "type")]
    pub descriptor: TypeDescriptor,
}

type Factory = Box<dyn Fn() -> Box<dyn ManagedObject>>;

struct Entry {
    key: (String, String),
    priority: i64,
    object: Box<dyn ManagedObject>,
}

/// An in-process manager service.
///
/// Objects are created from factories registered per `(path, item_id)`. Asking for
/// the same key again shows the existing object instead of creating a second one;
/// unknown keys yield the invalid handle.
#[derive(Default)]
pub struct MemoryManager {
    factories: AHashMap<(String, String), Factory>,
    entries: Vec<Entry>,
    locates: usize,
    requests: Vec<ShowRequest>,
}

const MANAGER: ManagerHandle = ManagerHandle(1);

impl MemoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, T>(&mut self, path: &str, item_id: &str, factory: F)
    where
        F: Fn() -> T + 'static,
        T: ManagedObject + 'static,
    {
        self.factories.insert(
            (path.to_string(), item_id.to_string()),
            Box::new(move || Box::new(factory()) as Box<dyn ManagedObject>),
        );
    }

    /// Registers a [`DynamicObject`] factory for the described type.
    pub fn register_descriptor(&mut self, path: &str, item_id: &str, descriptor: TypeDescriptor) {
        self.register(path, item_id, move || DynamicObject::new(descriptor.clone()));
    }

    /// Builds a manager that creates a [`DynamicObject`] for every catalog entry.
    pub fn from_catalog(entries: Vec<CatalogEntry>) -> Self {
        let mut manager = Self::new();
        for entry in entries {
            manager.register_descriptor(&entry.path, &entry.item_id, entry.descriptor);
        }
        manager
    }

    pub fn from_catalog_json(json: &str) -> Result<Self, DocumentError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Ok(Self::from_catalog(entries))
    }

    pub fn object<T: 'static>(&self, handle: ObjectHandle) -> Option<&T> {
        self.entry(handle)?.object.as_any().downcast_ref::<T>()
    }

    /// The priority of the most recent request that showed this object.
    pub fn priority(&self, handle: ObjectHandle) -> Option<i64> {
        self.entry(handle).map(|e| e.priority)
    }

    pub fn live_objects(&self) -> usize {
        self.entries.len()
    }

    pub fn locate_count(&self) -> usize {
        self.locates
    }

    /// Every `CreateOrShow` request received, in order.
    pub fn requests(&self) -> &[ShowRequest] {
        &self.requests
    }

    fn entry(&self, handle: ObjectHandle) -> Option<&Entry> {
        let index = handle.raw()?.checked_sub(1)?;
        self.entries.get(usize::try_from(index).ok()?)
    }

    fn handle_for(index: usize) -> ObjectHandle {
        ObjectHandle::new(index as u64 + 1)
    }
}

impl ManagerService for MemoryManager {
    fn locate(&mut self, _context: ObjectHandle) -> ManagerHandle {
        self.locates += 1;
        MANAGER
    }

    fn create_or_show(&mut self, manager: ManagerHandle, request: &ShowRequest) -> ObjectHandle {
        self.requests.push(request.clone());
        if manager != MANAGER {
            return ObjectHandle::INVALID;
        }

        let key = (request.path.clone(), request.item_id.clone());
        if let Some(index) = self.entries.iter().position(|e| e.key == key) {
            self.entries[index].priority = request.priority;
            debug!("Showing existing {}/{}", request.path, request.item_id);
            return Self::handle_for(index);
        }

        let Some(factory) = self.factories.get(&key) else {
            debug!("No factory registered for {}/{}", request.path, request.item_id);
            return ObjectHandle::INVALID;
        };
        let object = factory();
        self.entries.push(Entry {
            key,
            priority: request.priority,
            object,
        });
        Self::handle_for(self.entries.len() - 1)
    }

    fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut dyn PropertyTarget> {
        let index = usize::try_from(handle.raw()?.checked_sub(1)?).ok()?;
        let entry = self.entries.get_mut(index)?;
        Some(entry.object.as_target_mut())
    }
}
