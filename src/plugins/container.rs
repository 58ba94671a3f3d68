use std::slice;

use super::descriptor::PluginDescriptor;
use super::error::{PluginError, PluginResult};

/// Insertion-ordered owner of every loaded plugin.
///
/// No two descriptors share an identity. Only the loader inserts; everyone
/// else gets a read-only view.
#[derive(Debug, Default)]
pub struct PluginContainer {
    descriptors: Vec<PluginDescriptor>,
}

impl PluginContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, descriptor: PluginDescriptor) -> PluginResult<()> {
        if self.contains(descriptor.id()) {
            return Err(PluginError::DuplicateIdentity(descriptor.id().to_string()));
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.descriptors.iter().any(|d| d.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&PluginDescriptor> {
        self.descriptors.iter().find(|d| d.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut PluginDescriptor> {
        self.descriptors.iter_mut().find(|d| d.id() == id)
    }

    pub fn iter(&self) -> slice::Iter<'_, PluginDescriptor> {
        self.descriptors.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> slice::IterMut<'_, PluginDescriptor> {
        self.descriptors.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(PluginDescriptor::id)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl<'a> IntoIterator for &'a PluginContainer {
    type Item = &'a PluginDescriptor;
    type IntoIter = slice::Iter<'a, PluginDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
