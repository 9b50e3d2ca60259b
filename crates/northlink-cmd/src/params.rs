//! Local copy of the vehicle's parameter table.

use bytes::Bytes;

/// One parameter as seen by the commander.
pub trait ParameterEntry {
    /// Position in the table, as used on the wire.
    fn index(&self) -> u8;

    /// Replace the current value with a received payload.
    fn set_value(&mut self, value: &[u8]);
}

/// Storage the commander fills during synchronization.
pub trait ParameterStore: Send + 'static {
    type Entry: ParameterEntry;

    /// Append the raw description of the next parameter.
    fn append(&mut self, raw: &[u8]);

    /// Entry at `index`, if the table has one.
    fn get_mut(&mut self, index: u8) -> Option<&mut Self::Entry>;

    /// Number of entries.
    fn len(&self) -> usize;

    /// Returns true if no entry has been received.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry before a fresh synchronization.
    fn clear(&mut self);
}

/// A received parameter: its description and current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamEntry {
    index: u8,
    raw: Bytes,
    value: Bytes,
    updates: u32,
}

impl ParamEntry {
    fn new(index: u8, raw: &[u8]) -> Self {
        Self {
            index,
            raw: Bytes::copy_from_slice(raw),
            value: Bytes::new(),
            updates: 0,
        }
    }

    /// Content received during synchronization.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Raw content as text, without trailing NUL padding.
    pub fn label(&self) -> String {
        let end = self
            .raw
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |pos| pos + 1);
        String::from_utf8_lossy(&self.raw[..end]).into_owned()
    }

    /// Most recent value; empty until the vehicle reports one.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// How many times the value has been set.
    pub fn updates(&self) -> u32 {
        self.updates
    }
}

impl ParameterEntry for ParamEntry {
    fn index(&self) -> u8 {
        self.index
    }

    fn set_value(&mut self, value: &[u8]) {
        self.value = Bytes::copy_from_slice(value);
        self.updates = self.updates.saturating_add(1);
    }
}

/// In-memory parameter table indexed in arrival order.
#[derive(Debug, Default, Clone)]
pub struct ParamTable {
    entries: Vec<ParamEntry>,
}

impl ParamTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry at `index`.
    pub fn get(&self, index: u8) -> Option<&ParamEntry> {
        self.entries.get(usize::from(index))
    }

    /// All entries in index order.
    pub fn entries(&self) -> &[ParamEntry] {
        &self.entries
    }
}

impl ParameterStore for ParamTable {
    type Entry = ParamEntry;

    fn append(&mut self, raw: &[u8]) {
        // Indices past u8::MAX cannot be addressed; the commander stops first.
        let index = u8::try_from(self.entries.len()).unwrap_or(u8::MAX);
        self.entries.push(ParamEntry::new(index, raw));
    }

    fn get_mut(&mut self, index: u8) -> Option<&mut ParamEntry> {
        self.entries.get_mut(usize::from(index))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
