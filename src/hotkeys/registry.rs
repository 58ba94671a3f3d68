//! Script and action hotkey registries.
//!
//! Both maps share one namespace: a hotkey is bound to at most one script or
//! one action across the whole registry. The first binding wins; later
//! attempts are refused and leave the registry untouched.

use std::collections::BTreeMap;
use std::fmt;

use super::{Hotkey, HotkeyError, HotkeyOwner};

/// Callable bound to a hotkey.
pub type HotkeyAction = Box<dyn FnMut() -> anyhow::Result<()>>;

/// An action plus the name of whoever registered it.
pub struct BoundAction {
    owner: String,
    action: HotkeyAction,
}

impl BoundAction {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub(crate) fn invoke(&mut self) -> anyhow::Result<()> {
        (self.action)()
    }
}

impl fmt::Debug for BoundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundAction")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct HotkeyRegistry {
    scripts: BTreeMap<Hotkey, String>,
    actions: BTreeMap<Hotkey, BoundAction>,
}

impl HotkeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Who currently owns `hotkey`, in either map.
    pub fn owner_of(&self, hotkey: &Hotkey) -> Option<HotkeyOwner> {
        if let Some(script) = self.scripts.get(hotkey) {
            return Some(HotkeyOwner::Script(script.clone()));
        }
        self.actions.get(hotkey).map(|bound| HotkeyOwner::Action {
            owner: bound.owner.clone(),
        })
    }

    pub fn contains(&self, hotkey: &Hotkey) -> bool {
        self.scripts.contains_key(hotkey) || self.actions.contains_key(hotkey)
    }

    /// Bind `hotkey` to a script identifier.
    pub fn bind_script(
        &mut self,
        hotkey: Hotkey,
        script_id: impl Into<String>,
    ) -> Result<(), HotkeyError> {
        self.ensure_free(&hotkey)?;
        self.scripts.insert(hotkey, script_id.into());
        Ok(())
    }

    /// Bind `hotkey` to an action registered by `owner`.
    pub fn bind_action(
        &mut self,
        hotkey: Hotkey,
        owner: impl Into<String>,
        action: HotkeyAction,
    ) -> Result<(), HotkeyError> {
        self.ensure_free(&hotkey)?;
        self.actions.insert(
            hotkey,
            BoundAction {
                owner: owner.into(),
                action,
            },
        );
        Ok(())
    }

    fn ensure_free(&self, hotkey: &Hotkey) -> Result<(), HotkeyError> {
        match self.owner_of(hotkey) {
            Some(owner) => Err(HotkeyError::Conflict {
                hotkey: *hotkey,
                owner,
            }),
            None => Ok(()),
        }
    }

    pub fn script_for(&self, hotkey: &Hotkey) -> Option<&str> {
        self.scripts.get(hotkey).map(String::as_str)
    }

    pub fn scripts(&self) -> impl Iterator<Item = (&Hotkey, &str)> {
        self.scripts.iter().map(|(hotkey, id)| (hotkey, id.as_str()))
    }

    pub fn actions(&self) -> impl Iterator<Item = (&Hotkey, &BoundAction)> {
        self.actions.iter()
    }

    pub(crate) fn actions_mut(&mut self) -> impl Iterator<Item = (&Hotkey, &mut BoundAction)> {
        self.actions.iter_mut()
    }

    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.actions.is_empty()
    }
}
