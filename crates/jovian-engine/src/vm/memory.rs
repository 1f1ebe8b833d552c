//! Segmented byte memory
//!
//! An address is `(segment + 1) << 32 | offset`, so zero is always null.
//! Function pointers are tagged with the top bit and never point into a
//! segment.

use super::{VmError, VmResult};
use crate::compiler::ir::FunctionId;

const SEGMENT_SHIFT: u32 = 32;
const OFFSET_MASK: u64 = (1 << SEGMENT_SHIFT) - 1;

/// Tag bit marking a function handle
pub const FUNCTION_TAG: u64 = 1 << 63;

pub fn function_address(id: FunctionId) -> u64 {
    FUNCTION_TAG | id.0 as u64
}

pub fn function_id(address: u64) -> Option<FunctionId> {
    if address & FUNCTION_TAG != 0 {
        u32::try_from(address & !FUNCTION_TAG).ok().map(FunctionId)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Global,
    Heap,
    Stack,
}

#[derive(Debug)]
struct Segment {
    kind: SegmentKind,
    bytes: Vec<u8>,
    live: bool,
}

#[derive(Debug, Default)]
pub struct Memory {
    segments: Vec<Segment>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a zeroed segment and return its base address
    pub fn allocate(&mut self, kind: SegmentKind, size: usize) -> u64 {
        let index = self.segments.len() as u64;
        self.segments.push(Segment {
            kind,
            bytes: vec![0; size],
            live: true,
        });
        (index + 1) << SEGMENT_SHIFT
    }

    /// Release a segment; later accesses through it fail
    pub fn free(&mut self, address: u64) -> VmResult<()> {
        let index = self.segment_index(address)?;
        let segment = &mut self.segments[index];
        segment.live = false;
        segment.bytes = Vec::new();
        Ok(())
    }

    fn segment_index(&self, address: u64) -> VmResult<usize> {
        if address & FUNCTION_TAG != 0 {
            return Err(VmError::InvalidAddress(address));
        }
        let segment = address >> SEGMENT_SHIFT;
        if segment == 0 {
            return Err(VmError::NullPointer);
        }
        let index = (segment - 1) as usize;
        match self.segments.get(index) {
            Some(s) if s.live => Ok(index),
            _ => Err(VmError::InvalidAddress(address)),
        }
    }

    fn locate(&self, address: u64, len: usize) -> VmResult<(usize, usize)> {
        let index = self.segment_index(address)?;
        let offset = (address & OFFSET_MASK) as usize;
        if offset + len > self.segments[index].bytes.len() {
            return Err(VmError::OutOfBounds { address, len });
        }
        Ok((index, offset))
    }

    pub fn read(&self, address: u64, len: usize) -> VmResult<&[u8]> {
        let (index, offset) = self.locate(address, len)?;
        Ok(&self.segments[index].bytes[offset..offset + len])
    }

    pub fn write(&mut self, address: u64, data: &[u8]) -> VmResult<()> {
        let (index, offset) = self.locate(address, data.len())?;
        self.segments[index].bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Little-endian unsigned integer of `size` bytes (1..=8)
    pub fn read_uint(&self, address: u64, size: usize) -> VmResult<u64> {
        let bytes = self.read(address, size)?;
        let mut buf = [0u8; 8];
        buf[..size].copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn write_uint(&mut self, address: u64, size: usize, value: u64) -> VmResult<()> {
        let bytes = value.to_le_bytes();
        self.write(address, &bytes[..size])
    }

    /// Bytes up to (not including) the first NUL
    pub fn read_c_string(&self, address: u64) -> VmResult<Vec<u8>> {
        let (index, offset) = self.locate(address, 0)?;
        let bytes = &self.segments[index].bytes[offset..];
        match bytes.iter().position(|&b| b == 0) {
            Some(end) => Ok(bytes[..end].to_vec()),
            None => Err(VmError::OutOfBounds {
                address,
                len: bytes.len() + 1,
            }),
        }
    }

    pub fn kind_of(&self, address: u64) -> Option<SegmentKind> {
        self.segment_index(address)
            .ok()
            .map(|index| self.segments[index].kind)
    }

    pub fn live_segments(&self, kind: SegmentKind) -> usize {
        self.segments
            .iter()
            .filter(|s| s.live && s.kind == kind)
            .count()
    }

    /// Base address and contents of every live heap block, in allocation order
    pub fn heap_blocks(&self) -> impl Iterator<Item = (u64, &[u8])> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.live && s.kind == SegmentKind::Heap)
            .map(|(i, s)| (((i as u64) + 1) << SEGMENT_SHIFT, s.bytes.as_slice()))
    }
}
