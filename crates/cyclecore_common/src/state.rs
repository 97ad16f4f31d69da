//! State save/restore.
//!
//! A device describes its mutable state once, in `Saveable::save_state`, by
//! visiting every field with a stable name. The same description drives
//! layout enumeration, serialisation, restore and debugger inspection, so
//! the saved set cannot drift from what is restored.
//!
//! Blob layout: magic `CCSV`, u32 version, then for each item a u16 name
//! length, the name, a u8 kind, a u32 element count and the little-endian
//! payload.

use std::collections::HashSet;
use std::fmt;

use crate::error::{EmuError, Result};
use crate::lines::LineState;
use crate::time::Attotime;

pub const STATE_MAGIC: [u8; 4] = *b"CCSV";
pub const STATE_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateKind {
    U8,
    U16,
    U32,
    U64,
    Bool,
}

impl StateKind {
    pub const fn size(self) -> usize {
        match self {
            StateKind::U8 | StateKind::Bool => 1,
            StateKind::U16 => 2,
            StateKind::U32 => 4,
            StateKind::U64 => 8,
        }
    }

    fn code(self) -> u8 {
        match self {
            StateKind::U8 => 0,
            StateKind::U16 => 1,
            StateKind::U32 => 2,
            StateKind::U64 => 3,
            StateKind::Bool => 4,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => StateKind::U8,
            1 => StateKind::U16,
            2 => StateKind::U32,
            3 => StateKind::U64,
            4 => StateKind::Bool,
            _ => return None,
        })
    }
}

/// A borrowed state field handed to a visitor.
pub enum StateItem<'a> {
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    Bool(&'a mut bool),
    Bytes(&'a mut [u8]),
    Words(&'a mut [u16]),
}

impl StateItem<'_> {
    pub fn kind(&self) -> StateKind {
        match self {
            StateItem::U8(_) | StateItem::Bytes(_) => StateKind::U8,
            StateItem::U16(_) | StateItem::Words(_) => StateKind::U16,
            StateItem::U32(_) => StateKind::U32,
            StateItem::U64(_) => StateKind::U64,
            StateItem::Bool(_) => StateKind::Bool,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            StateItem::Bytes(v) => v.len(),
            StateItem::Words(v) => v.len(),
            _ => 1,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            StateItem::U8(v) => out.push(**v),
            StateItem::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
            StateItem::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
            StateItem::U64(v) => out.extend_from_slice(&v.to_le_bytes()),
            StateItem::Bool(v) => out.push(u8::from(**v)),
            StateItem::Bytes(v) => out.extend_from_slice(v),
            StateItem::Words(v) => v.iter().for_each(|w| out.extend_from_slice(&w.to_le_bytes())),
        }
    }

    /// `data` is exactly `kind().size() * count()` bytes.
    fn read_from(&mut self, data: &[u8]) {
        match self {
            StateItem::U8(v) => **v = data[0],
            StateItem::U16(v) => **v = u16::from_le_bytes([data[0], data[1]]),
            StateItem::U32(v) => {
                **v = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
            }
            StateItem::U64(v) => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&data[..8]);
                **v = u64::from_le_bytes(bytes);
            }
            StateItem::Bool(v) => **v = data[0] != 0,
            StateItem::Bytes(v) => v.copy_from_slice(data),
            StateItem::Words(v) => {
                for (word, chunk) in v.iter_mut().zip(data.chunks_exact(2)) {
                    *word = u16::from_le_bytes([chunk[0], chunk[1]]);
                }
            }
        }
    }

    fn value(&self) -> StateValue {
        match self {
            StateItem::U8(v) => StateValue::U8(**v),
            StateItem::U16(v) => StateValue::U16(**v),
            StateItem::U32(v) => StateValue::U32(**v),
            StateItem::U64(v) => StateValue::U64(**v),
            StateItem::Bool(v) => StateValue::Bool(**v),
            StateItem::Bytes(v) => StateValue::Bytes(v.to_vec()),
            StateItem::Words(v) => StateValue::Words(v.to_vec()),
        }
    }
}

pub trait StateVisitor {
    fn visit(&mut self, name: &str, item: StateItem<'_>);
}

impl dyn StateVisitor + '_ {
    pub fn u8(&mut self, name: &str, value: &mut u8) {
        self.visit(name, StateItem::U8(value));
    }

    pub fn u16(&mut self, name: &str, value: &mut u16) {
        self.visit(name, StateItem::U16(value));
    }

    pub fn u32(&mut self, name: &str, value: &mut u32) {
        self.visit(name, StateItem::U32(value));
    }

    pub fn u64(&mut self, name: &str, value: &mut u64) {
        self.visit(name, StateItem::U64(value));
    }

    pub fn bool(&mut self, name: &str, value: &mut bool) {
        self.visit(name, StateItem::Bool(value));
    }

    pub fn bytes(&mut self, name: &str, value: &mut [u8]) {
        self.visit(name, StateItem::Bytes(value));
    }

    pub fn words(&mut self, name: &str, value: &mut [u16]) {
        self.visit(name, StateItem::Words(value));
    }

    /// Times are stored as the high and low halves of the raw attosecond
    /// count so `NEVER` survives a round trip.
    pub fn time(&mut self, name: &str, value: &mut Attotime) {
        let raw = value.as_attoseconds();
        let mut hi = (raw >> 64) as u64;
        let mut lo = raw as u64;
        self.u64(&format!("{name}.hi"), &mut hi);
        self.u64(&format!("{name}.lo"), &mut lo);
        *value = Attotime::from_attoseconds((u128::from(hi) << 64) | u128::from(lo));
    }

    pub fn line(&mut self, name: &str, value: &mut LineState) {
        let mut asserted = value.is_asserted();
        self.bool(name, &mut asserted);
        *value = LineState::from(asserted);
    }
}

/// Anything with mutable emulation state.
pub trait Saveable {
    fn save_state(&mut self, state: &mut dyn StateVisitor);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateEntry {
    pub name: String,
    pub kind: StateKind,
    pub count: usize,
}

impl fmt::Display for StateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}x{}", self.name, self.kind, self.count)
    }
}

/// Enumerates the registered items without touching their values.
#[derive(Default)]
pub struct StateLayout {
    entries: Vec<StateEntry>,
    seen: HashSet<String>,
    duplicate: Option<String>,
}

impl StateLayout {
    pub fn collect(target: &mut dyn Saveable) -> Result<Vec<StateEntry>> {
        let mut layout = StateLayout::default();
        target.save_state(&mut layout);
        match layout.duplicate {
            Some(name) => Err(EmuError::StateCorrupt(format!(
                "state item '{name}' registered twice"
            ))),
            None => Ok(layout.entries),
        }
    }
}

impl StateVisitor for StateLayout {
    fn visit(&mut self, name: &str, item: StateItem<'_>) {
        if !self.seen.insert(name.to_string()) && self.duplicate.is_none() {
            self.duplicate = Some(name.to_string());
        }
        self.entries.push(StateEntry {
            name: name.to_string(),
            kind: item.kind(),
            count: item.count(),
        });
    }
}

/// Serialises every visited item.
pub struct StateWriter {
    out: Vec<u8>,
}

impl StateWriter {
    pub fn save(target: &mut dyn Saveable) -> Vec<u8> {
        let mut writer = StateWriter {
            out: Vec::with_capacity(4096),
        };
        writer.out.extend_from_slice(&STATE_MAGIC);
        writer.out.extend_from_slice(&STATE_VERSION.to_le_bytes());
        target.save_state(&mut writer);
        writer.out
    }
}

impl StateVisitor for StateWriter {
    fn visit(&mut self, name: &str, item: StateItem<'_>) {
        let name_bytes = name.as_bytes();
        let name_len = u16::try_from(name_bytes.len()).unwrap_or(u16::MAX);
        self.out.extend_from_slice(&name_len.to_le_bytes());
        self.out
            .extend_from_slice(&name_bytes[..usize::from(name_len)]);
        self.out.push(item.kind().code());
        let count = u32::try_from(item.count()).unwrap_or(u32::MAX);
        self.out.extend_from_slice(&count.to_le_bytes());
        item.write_to(&mut self.out);
    }
}

struct ParsedItem<'a> {
    entry: StateEntry,
    data: &'a [u8],
}

fn parse_blob(blob: &[u8]) -> Result<Vec<ParsedItem<'_>>> {
    fn take<'a>(blob: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8]> {
        let end = pos
            .checked_add(len)
            .filter(|end| *end <= blob.len())
            .ok_or_else(|| EmuError::StateCorrupt(format!("truncated at byte {pos}")))?;
        let slice = &blob[*pos..end];
        *pos = end;
        Ok(slice)
    }

    let mut pos = 0;
    if take(blob, &mut pos, 4)? != STATE_MAGIC {
        return Err(EmuError::StateCorrupt("bad magic".to_string()));
    }
    let version = take(blob, &mut pos, 4)?;
    let version = u32::from_le_bytes([version[0], version[1], version[2], version[3]]);
    if version != STATE_VERSION {
        return Err(EmuError::StateCorrupt(format!(
            "unsupported version {version}"
        )));
    }

    let mut items = Vec::new();
    while pos < blob.len() {
        let len = take(blob, &mut pos, 2)?;
        let len = usize::from(u16::from_le_bytes([len[0], len[1]]));
        let name = String::from_utf8_lossy(take(blob, &mut pos, len)?).into_owned();
        let code = take(blob, &mut pos, 1)?[0];
        let kind = StateKind::from_code(code)
            .ok_or_else(|| EmuError::StateCorrupt(format!("item '{name}': bad kind {code}")))?;
        let count = take(blob, &mut pos, 4)?;
        let count = u32::from_le_bytes([count[0], count[1], count[2], count[3]]) as usize;
        let data = take(blob, &mut pos, kind.size() * count)?;
        items.push(ParsedItem {
            entry: StateEntry { name, kind, count },
            data,
        });
    }
    Ok(items)
}

/// Restores a blob produced by `StateWriter`.
///
/// The blob's layout is checked against the target's before anything is
/// written, so a mismatched blob leaves the target untouched.
pub struct StateReader<'a> {
    items: std::vec::IntoIter<ParsedItem<'a>>,
}

impl<'a> StateReader<'a> {
    pub fn load(target: &mut dyn Saveable, blob: &'a [u8]) -> Result<()> {
        let items = parse_blob(blob)?;
        let layout = StateLayout::collect(target)?;
        if layout.len() != items.len() {
            return Err(EmuError::StateMismatch {
                index: layout.len().min(items.len()),
                expected: format!("{} items", layout.len()),
                found: format!("{} items", items.len()),
            });
        }
        for (index, (expected, found)) in layout.iter().zip(items.iter()).enumerate() {
            if *expected != found.entry {
                return Err(EmuError::StateMismatch {
                    index,
                    expected: expected.to_string(),
                    found: found.entry.to_string(),
                });
            }
        }

        let mut reader = StateReader {
            items: items.into_iter(),
        };
        target.save_state(&mut reader);
        Ok(())
    }
}

impl StateVisitor for StateReader<'_> {
    fn visit(&mut self, _name: &str, mut item: StateItem<'_>) {
        // Layout was verified in `load`, so items line up one to one.
        if let Some(parsed) = self.items.next() {
            item.read_from(parsed.data);
        }
    }
}

/// Value snapshot used by debugger queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Bool(bool),
    Bytes(Vec<u8>),
    Words(Vec<u16>),
}

impl StateValue {
    /// Scalar view, if the value is a single number or flag.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            StateValue::U8(v) => Some(v.into()),
            StateValue::U16(v) => Some(v.into()),
            StateValue::U32(v) => Some(v.into()),
            StateValue::U64(v) => Some(v),
            StateValue::Bool(v) => Some(v.into()),
            StateValue::Bytes(_) | StateValue::Words(_) => None,
        }
    }
}

/// Collects current values by name.
#[derive(Default)]
pub struct StateInspector {
    values: Vec<(String, StateValue)>,
    only: Option<String>,
}

impl StateInspector {
    pub fn inspect(target: &mut dyn Saveable) -> Vec<(String, StateValue)> {
        let mut inspector = StateInspector::default();
        target.save_state(&mut inspector);
        inspector.values
    }

    pub fn query(target: &mut dyn Saveable, name: &str) -> Option<StateValue> {
        let mut inspector = StateInspector {
            values: Vec::new(),
            only: Some(name.to_string()),
        };
        target.save_state(&mut inspector);
        inspector.values.pop().map(|(_, value)| value)
    }
}

impl StateVisitor for StateInspector {
    fn visit(&mut self, name: &str, item: StateItem<'_>) {
        if self.only.as_deref().is_some_and(|only| only != name) {
            return;
        }
        self.values.push((name.to_string(), item.value()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample {
        pc: u16,
        flag: bool,
        ram: [u8; 4],
        when: Attotime,
    }

    impl Saveable for Sample {
        fn save_state(&mut self, state: &mut dyn StateVisitor) {
            state.u16("pc", &mut self.pc);
            state.bool("flag", &mut self.flag);
            state.bytes("ram", &mut self.ram);
            state.time("when", &mut self.when);
        }
    }

    struct Twice(u8);

    impl Saveable for Twice {
        fn save_state(&mut self, state: &mut dyn StateVisitor) {
            state.u8("x", &mut self.0);
            state.u8("x", &mut self.0);
        }
    }

    #[test]
    fn layout_lists_every_item_in_order() {
        let layout = StateLayout::collect(&mut Sample::default()).unwrap();
        let names: Vec<_> = layout.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["pc", "flag", "ram", "when.hi", "when.lo"]);
        assert_eq!(layout[2].count, 4);
        assert_eq!(layout[0].kind, StateKind::U16);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        assert!(StateLayout::collect(&mut Twice(0)).is_err());
    }

    #[test]
    fn restore_reproduces_saved_values() {
        let mut original = Sample {
            pc: 0x2080,
            flag: true,
            ram: [1, 2, 3, 4],
            when: Attotime::NEVER,
        };
        let blob = StateWriter::save(&mut original);

        let mut restored = Sample::default();
        StateReader::load(&mut restored, &blob).unwrap();
        assert_eq!(restored.pc, 0x2080);
        assert!(restored.flag);
        assert_eq!(restored.ram, [1, 2, 3, 4]);
        assert!(restored.when.is_never());
    }

    #[test]
    fn mismatched_layout_leaves_target_untouched() {
        let blob = StateWriter::save(&mut Twice(7));
        let mut target = Sample {
            pc: 0x1234,
            ..Default::default()
        };
        let err = StateReader::load(&mut target, &blob).unwrap_err();
        assert!(matches!(err, EmuError::StateMismatch { .. }));
        assert_eq!(target.pc, 0x1234);
    }

    #[test]
    fn truncated_blob_is_corrupt() {
        let blob = StateWriter::save(&mut Sample::default());
        let err = StateReader::load(&mut Sample::default(), &blob[..blob.len() - 3]).unwrap_err();
        assert!(matches!(err, EmuError::StateCorrupt(_)));
    }

    #[test]
    fn inspector_queries_by_name() {
        let mut sample = Sample {
            pc: 0x42,
            ..Default::default()
        };
        assert_eq!(
            StateInspector::query(&mut sample, "pc"),
            Some(StateValue::U16(0x42))
        );
        assert_eq!(StateInspector::query(&mut sample, "missing"), None);
    }
}
