//! Named binary tag codec.
//!
//! Recipe files are stored as a tree of typed tags:
//! - Big-endian scalars (byte, short, int, long, float, double)
//! - Length-prefixed strings (modified UTF-8) and arrays
//! - Homogeneous lists and insertion-ordered compounds
//! - A gzip envelope around the whole document
//!
//! # Example
//!
//! ```
//! use scroller_common::nbt::{self, Compound};
//!
//! let mut root = Compound::new();
//! root.put_byte("Selected", 3);
//!
//! let bytes = nbt::encode_compressed(&root).unwrap();
//! let decoded = nbt::decode_compressed(&bytes).unwrap();
//! assert_eq!(decoded.get_byte("Selected"), Some(3));
//! ```

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use tracing::debug;

use crate::error::{NbtError, NbtResult};
use crate::mutf8;

/// Maximum nesting of lists and compounds accepted when reading.
pub const MAX_DEPTH: usize = 512;

/// Tag kind, as written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagType {
    /// End of a compound, or the element kind of an empty list.
    End = 0,
    /// Signed 8-bit integer.
    Byte = 1,
    /// Signed 16-bit integer.
    Short = 2,
    /// Signed 32-bit integer.
    Int = 3,
    /// Signed 64-bit integer.
    Long = 4,
    /// 32-bit float.
    Float = 5,
    /// 64-bit float.
    Double = 6,
    /// Length-prefixed bytes.
    ByteArray = 7,
    /// Length-prefixed UTF-8 text.
    String = 8,
    /// Homogeneous list.
    List = 9,
    /// Named map of tags.
    Compound = 10,
    /// Length-prefixed 32-bit integers.
    IntArray = 11,
    /// Length-prefixed 64-bit integers.
    LongArray = 12,
}

impl TagType {
    /// Convert from the wire byte.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::End),
            1 => Some(Self::Byte),
            2 => Some(Self::Short),
            3 => Some(Self::Int),
            4 => Some(Self::Long),
            5 => Some(Self::Float),
            6 => Some(Self::Double),
            7 => Some(Self::ByteArray),
            8 => Some(Self::String),
            9 => Some(Self::List),
            10 => Some(Self::Compound),
            11 => Some(Self::IntArray),
            12 => Some(Self::LongArray),
            _ => None,
        }
    }

    /// Get display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::End => "End",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::Int => "Int",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::ByteArray => "ByteArray",
            Self::String => "String",
            Self::List => "List",
            Self::Compound => "Compound",
            Self::IntArray => "IntArray",
            Self::LongArray => "LongArray",
        }
    }
}

/// A single tag value.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// Signed byte.
    Byte(i8),
    /// Signed short.
    Short(i16),
    /// Signed int.
    Int(i32),
    /// Signed long.
    Long(i64),
    /// Float.
    Float(f32),
    /// Double.
    Double(f64),
    /// Byte array.
    ByteArray(Vec<i8>),
    /// String.
    String(String),
    /// List.
    List(List),
    /// Compound.
    Compound(Compound),
    /// Int array.
    IntArray(Vec<i32>),
    /// Long array.
    LongArray(Vec<i64>),
}

impl Tag {
    /// Returns the wire kind of this tag.
    #[must_use]
    pub const fn id(&self) -> TagType {
        match self {
            Self::Byte(_) => TagType::Byte,
            Self::Short(_) => TagType::Short,
            Self::Int(_) => TagType::Int,
            Self::Long(_) => TagType::Long,
            Self::Float(_) => TagType::Float,
            Self::Double(_) => TagType::Double,
            Self::ByteArray(_) => TagType::ByteArray,
            Self::String(_) => TagType::String,
            Self::List(_) => TagType::List,
            Self::Compound(_) => TagType::Compound,
            Self::IntArray(_) => TagType::IntArray,
            Self::LongArray(_) => TagType::LongArray,
        }
    }

    /// Returns the compound payload, if this is a compound.
    #[must_use]
    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Self::Compound(c) => Some(c),
            _ => None,
        }
    }
}

impl From<i8> for Tag {
    fn from(value: i8) -> Self {
        Self::Byte(value)
    }
}

impl From<i16> for Tag {
    fn from(value: i16) -> Self {
        Self::Short(value)
    }
}

impl From<i32> for Tag {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Tag {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f32> for Tag {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Tag {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Compound> for Tag {
    fn from(value: Compound) -> Self {
        Self::Compound(value)
    }
}

impl From<List> for Tag {
    fn from(value: List) -> Self {
        Self::List(value)
    }
}

/// A list of tags sharing one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    /// Element kind (`End` while empty).
    element: TagType,
    /// Elements in order.
    items: Vec<Tag>,
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl List {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            element: TagType::End,
            items: Vec::new(),
        }
    }

    /// Build a list of compounds.
    #[must_use]
    pub fn from_compounds(compounds: impl IntoIterator<Item = Compound>) -> Self {
        let items: Vec<Tag> = compounds.into_iter().map(Tag::Compound).collect();
        let element = if items.is_empty() {
            TagType::End
        } else {
            TagType::Compound
        };
        Self { element, items }
    }

    /// Appends a tag. The first element fixes the list kind.
    pub fn push(&mut self, tag: Tag) -> NbtResult<()> {
        if self.items.is_empty() {
            self.element = tag.id();
        } else if tag.id() != self.element {
            return Err(NbtError::MixedList);
        }
        self.items.push(tag);
        Ok(())
    }

    /// Element kind.
    #[must_use]
    pub const fn element_type(&self) -> TagType {
        self.element
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    /// Iterates over elements.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.items.iter()
    }

    /// Iterates over the compound elements, skipping anything else.
    pub fn compounds(&self) -> impl Iterator<Item = &Compound> {
        self.items.iter().filter_map(Tag::as_compound)
    }
}

/// Insertion-ordered map of named tags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    entries: Vec<(String, Tag)>,
}

impl Compound {
    /// Create an empty compound.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the compound has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a tag, replacing an existing entry of the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, tag: impl Into<Tag>) -> Option<Tag> {
        let name = name.into();
        let tag = tag.into();
        if let Some((_, existing)) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            return Some(std::mem::replace(existing, tag));
        }
        self.entries.push((name, tag));
        None
    }

    /// Removes an entry.
    pub fn remove(&mut self, name: &str) -> Option<Tag> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, tag)| tag)
    }

    /// Whether an entry of the given kind exists.
    #[must_use]
    pub fn contains(&self, name: &str, kind: TagType) -> bool {
        self.get(name).is_some_and(|tag| tag.id() == kind)
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    /// Stores a byte.
    pub fn put_byte(&mut self, name: impl Into<String>, value: i8) {
        self.insert(name, Tag::Byte(value));
    }

    /// Stores an int.
    pub fn put_int(&mut self, name: impl Into<String>, value: i32) {
        self.insert(name, Tag::Int(value));
    }

    /// Stores a string.
    pub fn put_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.insert(name, Tag::String(value.into()));
    }

    /// Reads a byte entry.
    #[must_use]
    pub fn get_byte(&self, name: &str) -> Option<i8> {
        match self.get(name)? {
            Tag::Byte(v) => Some(*v),
            _ => None,
        }
    }

    /// Reads an int entry.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            Tag::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Reads a string entry.
    #[must_use]
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Tag::String(v) => Some(v),
            _ => None,
        }
    }

    /// Reads a nested compound entry.
    #[must_use]
    pub fn get_compound(&self, name: &str) -> Option<&Compound> {
        self.get(name)?.as_compound()
    }

    /// Reads a list entry.
    #[must_use]
    pub fn get_list(&self, name: &str) -> Option<&List> {
        match self.get(name)? {
            Tag::List(v) => Some(v),
            _ => None,
        }
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Writes an unnamed root compound.
pub fn write_root<W: Write>(root: &Compound, w: &mut W) -> NbtResult<()> {
    w.write_all(&[TagType::Compound as u8])?;
    write_string(w, "")?;
    write_compound(w, root)
}

/// Writes a gzip-compressed root compound.
pub fn write_compressed<W: Write>(root: &Compound, w: W) -> NbtResult<()> {
    let mut encoder = GzEncoder::new(w, Compression::default());
    write_root(root, &mut encoder)?;
    encoder.finish()?;
    Ok(())
}

/// Encodes a root compound into a gzip-compressed buffer.
pub fn encode_compressed(root: &Compound) -> NbtResult<Vec<u8>> {
    let mut out = Vec::new();
    write_compressed(root, &mut out)?;
    Ok(out)
}

fn write_string<W: Write>(w: &mut W, value: &str) -> NbtResult<()> {
    let bytes = mutf8::encode(value);
    let len = u16::try_from(bytes.len()).map_err(|_| NbtError::StringTooLong(bytes.len()))?;
    w.write_all(&len.to_be_bytes())?;
    w.write_all(&bytes)?;
    Ok(())
}

fn write_len<W: Write>(w: &mut W, len: usize) -> NbtResult<()> {
    let len = i32::try_from(len).map_err(|_| NbtError::LengthOverflow(len))?;
    w.write_all(&len.to_be_bytes())?;
    Ok(())
}

fn write_compound<W: Write>(w: &mut W, compound: &Compound) -> NbtResult<()> {
    for (name, tag) in compound.iter() {
        w.write_all(&[tag.id() as u8])?;
        write_string(w, name)?;
        write_payload(w, tag)?;
    }
    w.write_all(&[TagType::End as u8])?;
    Ok(())
}

fn write_payload<W: Write>(w: &mut W, tag: &Tag) -> NbtResult<()> {
    match tag {
        Tag::Byte(v) => w.write_all(&v.to_be_bytes())?,
        Tag::Short(v) => w.write_all(&v.to_be_bytes())?,
        Tag::Int(v) => w.write_all(&v.to_be_bytes())?,
        Tag::Long(v) => w.write_all(&v.to_be_bytes())?,
        Tag::Float(v) => w.write_all(&v.to_be_bytes())?,
        Tag::Double(v) => w.write_all(&v.to_be_bytes())?,
        Tag::ByteArray(v) => {
            write_len(w, v.len())?;
            let bytes: Vec<u8> = v.iter().map(|b| *b as u8).collect();
            w.write_all(&bytes)?;
        }
        Tag::String(v) => write_string(w, v)?,
        Tag::List(list) => {
            w.write_all(&[list.element_type() as u8])?;
            write_len(w, list.len())?;
            for item in list.iter() {
                write_payload(w, item)?;
            }
        }
        Tag::Compound(c) => write_compound(w, c)?,
        Tag::IntArray(v) => {
            write_len(w, v.len())?;
            for x in v {
                w.write_all(&x.to_be_bytes())?;
            }
        }
        Tag::LongArray(v) => {
            write_len(w, v.len())?;
            for x in v {
                w.write_all(&x.to_be_bytes())?;
            }
        }
    }
    Ok(())
}

// ============================================================================
// Reading
// ============================================================================

/// Reads an unnamed root compound.
pub fn read_root<R: Read>(r: &mut R) -> NbtResult<Compound> {
    let kind = read_array::<_, 1>(r)?[0];
    if kind != TagType::Compound as u8 {
        return Err(NbtError::InvalidRoot(kind));
    }
    let _name = read_string(r)?;
    read_compound(r, 1)
}

/// Reads a gzip-compressed root compound.
pub fn read_compressed<R: Read>(r: R) -> NbtResult<Compound> {
    let mut decoder = GzDecoder::new(r);
    read_root(&mut decoder)
}

/// Decodes a gzip-compressed buffer into its root compound.
pub fn decode_compressed(bytes: &[u8]) -> NbtResult<Compound> {
    read_compressed(bytes)
}

fn read_array<R: Read, const N: usize>(r: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_len<R: Read>(r: &mut R) -> NbtResult<usize> {
    let len = i32::from_be_bytes(read_array(r)?);
    usize::try_from(len).map_err(|_| NbtError::NegativeLength(len))
}

fn read_bytes<R: Read>(r: &mut R, len: usize) -> NbtResult<Vec<u8>> {
    // Read through `take` so a corrupt length cannot force a huge allocation.
    let mut buf = Vec::new();
    r.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }
    Ok(buf)
}

fn read_string<R: Read>(r: &mut R) -> NbtResult<String> {
    let len = u16::from_be_bytes(read_array(r)?) as usize;
    let bytes = read_bytes(r, len)?;
    mutf8::decode(&bytes).ok_or(NbtError::InvalidString)
}

fn read_compound<R: Read>(r: &mut R, depth: usize) -> NbtResult<Compound> {
    if depth > MAX_DEPTH {
        debug!("Rejecting compound nested deeper than {} levels", MAX_DEPTH);
        return Err(NbtError::DepthLimit(MAX_DEPTH));
    }

    let mut compound = Compound::new();
    loop {
        let byte = read_array::<_, 1>(r)?[0];
        let kind = TagType::from_u8(byte).ok_or(NbtError::UnknownTagType(byte))?;
        if kind == TagType::End {
            return Ok(compound);
        }
        let name = read_string(r)?;
        let tag = read_payload(r, kind, depth)?;
        compound.insert(name, tag);
    }
}

fn read_payload<R: Read>(r: &mut R, kind: TagType, depth: usize) -> NbtResult<Tag> {
    let tag = match kind {
        TagType::End => return Err(NbtError::UnknownTagType(0)),
        TagType::Byte => Tag::Byte(i8::from_be_bytes(read_array(r)?)),
        TagType::Short => Tag::Short(i16::from_be_bytes(read_array(r)?)),
        TagType::Int => Tag::Int(i32::from_be_bytes(read_array(r)?)),
        TagType::Long => Tag::Long(i64::from_be_bytes(read_array(r)?)),
        TagType::Float => Tag::Float(f32::from_be_bytes(read_array(r)?)),
        TagType::Double => Tag::Double(f64::from_be_bytes(read_array(r)?)),
        TagType::ByteArray => {
            let len = read_len(r)?;
            Tag::ByteArray(read_bytes(r, len)?.into_iter().map(|b| b as i8).collect())
        }
        TagType::String => Tag::String(read_string(r)?),
        TagType::List => {
            if depth >= MAX_DEPTH {
                debug!("Rejecting list nested deeper than {} levels", MAX_DEPTH);
                return Err(NbtError::DepthLimit(MAX_DEPTH));
            }
            let byte = read_array::<_, 1>(r)?[0];
            let element = TagType::from_u8(byte).ok_or(NbtError::UnknownTagType(byte))?;
            let len = read_len(r)?;
            let mut list = List::new();
            for _ in 0..len {
                list.push(read_payload(r, element, depth + 1)?)?;
            }
            Tag::List(list)
        }
        TagType::Compound => Tag::Compound(read_compound(r, depth + 1)?),
        TagType::IntArray => {
            let len = read_len(r)?;
            let bytes = read_bytes(r, len.saturating_mul(4))?;
            Tag::IntArray(
                bytes
                    .chunks_exact(4)
                    .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            )
        }
        TagType::LongArray => {
            let len = read_len(r)?;
            let bytes = read_bytes(r, len.saturating_mul(8))?;
            Tag::LongArray(
                bytes
                    .chunks_exact(8)
                    .map(|c| {
                        i64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
                    })
                    .collect(),
            )
        }
    };
    Ok(tag)
}
