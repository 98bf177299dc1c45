//! Event catalog: stable small-integer ids for log statement locations
//!
//! Every distinct source location seen during a run gets the next integer
//! from a monotonic counter starting at 0. Ids are never reassigned or freed,
//! so the catalog is a pure lookup/allocation table.
//!
//! The catalog is explicit state owned by the caller and passed into the
//! parsing routines. Two independent runs (e.g. two projects processed in
//! parallel) each own their own catalog and never share id allocation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of one log statement, unique within a run
pub type EventId = u32;

/// Source location of a log call site: file name plus line number
///
/// The file name is the bare name (`Foo.java`), not a path, because that is
/// all a log locator carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub file_name: String,
    pub line_number: u32,
}

impl Location {
    pub fn new(file_name: impl Into<String>, line_number: u32) -> Self {
        Self {
            file_name: file_name.into(),
            line_number,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_name, self.line_number)
    }
}

/// Location → EventId table
///
/// # Example
/// ```
/// use loggraph::catalog::{EventCatalog, Location};
///
/// let mut catalog = EventCatalog::new();
/// let a = catalog.id_of(Location::new("Foo.java", 10));
/// let b = catalog.id_of(Location::new("Bar.java", 3));
/// assert_eq!((a, b), (Some(0), Some(1)));
/// assert_eq!(catalog.id_of(Location::new("Foo.java", 10)), Some(0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    ids: HashMap<Location, EventId>,
    // wider than EventId so the counter can step past EventId::MAX
    next_id: u64,
}

impl EventCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from pre-assigned ids (e.g. the event ids of a source log graph)
    ///
    /// The allocation counter continues after the largest id seen, so later
    /// calls to [`EventCatalog::id_of`] never collide with a pre-assigned id.
    pub fn from_assigned<I>(assigned: I) -> Self
    where
        I: IntoIterator<Item = (Location, EventId)>,
    {
        let mut catalog = Self::new();
        for (location, id) in assigned {
            catalog.next_id = catalog.next_id.max(u64::from(id) + 1);
            catalog.ids.entry(location).or_insert(id);
        }
        catalog
    }

    /// Id for `location`, allocating the next integer on first sight
    ///
    /// Returns `None` for a new location once every id up to
    /// `EventId::MAX` has been handed out.
    pub fn id_of(&mut self, location: Location) -> Option<EventId> {
        if let Some(&id) = self.ids.get(&location) {
            return Some(id);
        }
        let id = EventId::try_from(self.next_id).ok()?;
        self.next_id += 1;
        self.ids.insert(location, id);
        Some(id)
    }

    /// Id for `location` without allocating
    pub fn get(&self, location: &Location) -> Option<EventId> {
        self.ids.get(location).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
