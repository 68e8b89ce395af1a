//! Identifier sanitization and allocation for one emission run.
use silt_utils::Id;
use std::collections::{HashMap, HashSet};

/// The namespace of one emission run: a stable cache from source identifiers
/// to emitted identifiers, the set of names already taken, and the counter
/// behind anonymous `_N` ids.
///
/// Sanitized and anonymous names draw from the same used-name set, so the
/// two can never collide. Created at the start of a run and dropped at its
/// end; repeated runs over the same design produce identical names.
#[derive(Default)]
pub struct Namespace {
    cache: HashMap<Id, String>,
    used: HashSet<String>,
    counter: u32,
}

impl Namespace {
    pub fn new() -> Self {
        Namespace::default()
    }

    /// Map a source identifier to a FIRRTL-legal one. The first call fixes
    /// the mapping for the rest of the run.
    pub fn sanitize(&mut self, id: Id) -> String {
        if let Some(cached) = self.cache.get(&id) {
            return cached.clone();
        }

        let spelled = id.as_str();
        let spelled = spelled.strip_prefix('\\').unwrap_or(spelled);
        let mut candidate: String = spelled
            .chars()
            .enumerate()
            .map(|(i, ch)| match ch {
                'a'..='z' | 'A'..='Z' | '_' => ch,
                '0'..='9' if i != 0 => ch,
                _ => '_',
            })
            .collect();
        if candidate.is_empty() {
            candidate.push('_');
        }

        while self.used.contains(&candidate) {
            candidate.push('_');
        }

        self.cache.insert(id, candidate.clone());
        self.used.insert(candidate.clone());
        candidate
    }

    /// Allocate a fresh anonymous identifier `_N`. `N` only ever grows, so
    /// allocation order is observable and deterministic.
    pub fn fresh(&mut self) -> String {
        loop {
            let candidate = format!("_{}", self.counter);
            self.counter += 1;
            if !self.used.contains(&candidate) {
                self.used.insert(candidate.clone());
                return candidate;
            }
        }
    }
}
