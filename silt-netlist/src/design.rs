use crate::Module;
use linked_hash_map::LinkedHashMap;
use silt_utils::Id;
use std::collections::HashSet;

/// A complete design: named modules in insertion order, an optional
/// designated top module, and a command selection.
///
/// The selection is either full (the default) or an explicit module subset
/// left behind by an earlier command; backends that rewrite the whole design
/// refuse to run on a partial selection.
#[derive(Debug, Default)]
pub struct Design {
    modules: LinkedHashMap<Id, Module>,
    top: Option<Id>,
    selection: Option<HashSet<Id>>,
}

impl Design {
    pub fn new() -> Self {
        Design::default()
    }

    pub fn add_module(&mut self, module: Module) -> Id {
        let name = module.name;
        self.modules.insert(name, module);
        name
    }

    pub fn module(&self, name: Id) -> Option<&Module> {
        self.modules.get(&name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn set_top(&mut self, name: Id) {
        self.top = Some(name);
    }

    /// The designated top module, if one was set and still exists.
    pub fn top_module(&self) -> Option<&Module> {
        self.top.and_then(|name| self.modules.get(&name))
    }

    /// Restrict the selection to the given modules.
    pub fn select(&mut self, modules: HashSet<Id>) {
        self.selection = Some(modules);
    }

    pub fn select_all(&mut self) {
        self.selection = None;
    }

    pub fn is_fully_selected(&self) -> bool {
        match &self.selection {
            None => true,
            Some(set) => self.modules.keys().all(|name| set.contains(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_defaults_to_full() {
        let mut design = Design::new();
        design.add_module(Module::new("a"));
        design.add_module(Module::new("b"));
        assert!(design.is_fully_selected());

        design.select([Id::new("a")].into_iter().collect());
        assert!(!design.is_fully_selected());

        design.select_all();
        assert!(design.is_fully_selected());
    }

    #[test]
    fn top_must_exist() {
        let mut design = Design::new();
        design.add_module(Module::new("a"));
        design.set_top(Id::new("zz"));
        assert!(design.top_module().is_none());
        design.set_top(Id::new("a"));
        assert_eq!(design.top_module().unwrap().name, Id::new("a"));
    }
}
