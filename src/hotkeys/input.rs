use std::collections::HashSet;

use super::Hotkey;

/// Host input system, queried once per hotkey per tick.
pub trait InputSource {
    fn is_pressed(&self, hotkey: &Hotkey) -> bool;
}

impl<F> InputSource for F
where
    F: Fn(&Hotkey) -> bool,
{
    fn is_pressed(&self, hotkey: &Hotkey) -> bool {
        self(hotkey)
    }
}

/// Set of hotkeys the host marks as pressed for the current tick.
#[derive(Debug, Clone, Default)]
pub struct PressedKeys {
    pressed: HashSet<Hotkey>,
}

impl PressedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, hotkey: Hotkey) {
        self.pressed.insert(hotkey);
    }

    pub fn release(&mut self, hotkey: &Hotkey) {
        self.pressed.remove(hotkey);
    }

    /// Forget every pressed hotkey, typically at the end of a tick.
    pub fn clear(&mut self) {
        self.pressed.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }
}

impl InputSource for PressedKeys {
    fn is_pressed(&self, hotkey: &Hotkey) -> bool {
        self.pressed.contains(hotkey)
    }
}

impl FromIterator<Hotkey> for PressedKeys {
    fn from_iter<T: IntoIterator<Item = Hotkey>>(iter: T) -> Self {
        Self {
            pressed: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let f1 = Hotkey::parse("F1").unwrap();
        let mut keys = PressedKeys::new();
        assert!(!f1.is_pressed(&keys));

        keys.press(f1);
        assert!(f1.is_pressed(&keys));
        assert!(!Hotkey::parse("Ctrl+F1").unwrap().is_pressed(&keys));

        keys.release(&f1);
        assert!(keys.is_empty());
    }

    #[test]
    fn test_closure_input_source() {
        let f2 = Hotkey::parse("F2").unwrap();
        let only_f2 = move |hotkey: &Hotkey| *hotkey == f2;

        assert!(f2.is_pressed(&only_f2));
        assert!(!Hotkey::parse("F3").unwrap().is_pressed(&only_f2));
    }
}
