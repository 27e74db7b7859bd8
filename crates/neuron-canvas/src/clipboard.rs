//! Single-slot layer clipboard.

use crate::factory::regenerate_ids;
use crate::model::Layer;

pub const COPY_SUFFIX: &str = " 副本";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    layer: Option<Layer>,
}

impl Clipboard {
    /// Stores a fresh copy of `layer`: new ids throughout and the copy marker on its name.
    pub fn copy(&mut self, layer: &Layer) {
        let mut copy = layer.clone();
        regenerate_ids(&mut copy);
        copy.name.push_str(COPY_SUFFIX);
        self.layer = Some(copy);
    }

    pub fn peek(&self) -> Option<&Layer> {
        self.layer.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.layer.is_none()
    }

    pub fn clear(&mut self) {
        self.layer = None;
    }

    /// A pasteable instance; every call yields distinct ids.
    pub fn instantiate(&self) -> Option<Layer> {
        let mut layer = self.layer.clone()?;
        regenerate_ids(&mut layer);
        Some(layer)
    }
}
