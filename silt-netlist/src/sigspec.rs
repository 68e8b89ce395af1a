//! Signal references: LSB-first concatenations of wire slices and literals.
use crate::{Const, State};
use silt_utils::Id;

/// One chunk of a [`SigSpec`]: either a literal bit vector or a slice of a
/// wire (`offset + width` never exceeds the wire's width in a valid design).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SigChunk {
    Const(Const),
    Slice { wire: Id, offset: usize, width: usize },
}

impl SigChunk {
    pub fn width(&self) -> usize {
        match self {
            SigChunk::Const(c) => c.len(),
            SigChunk::Slice { width, .. } => *width,
        }
    }
}

/// A single bit of a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SigBit {
    Const(State),
    Wire { wire: Id, index: usize },
}

/// An ordered, LSB-first concatenation of [`SigChunk`]s.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SigSpec {
    chunks: Vec<SigChunk>,
}

impl SigSpec {
    pub fn new(chunks: Vec<SigChunk>) -> Self {
        SigSpec { chunks }
    }

    /// A slice of a single wire.
    pub fn slice(wire: Id, offset: usize, width: usize) -> Self {
        SigSpec {
            chunks: vec![SigChunk::Slice { wire, offset, width }],
        }
    }

    /// A whole named wire of the given width.
    pub fn wire(wire: Id, width: usize) -> Self {
        SigSpec::slice(wire, 0, width)
    }

    pub fn chunks(&self) -> &[SigChunk] {
        &self.chunks
    }

    pub fn width(&self) -> usize {
        self.chunks.iter().map(SigChunk::width).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0
    }

    pub fn is_fully_const(&self) -> bool {
        self.chunks
            .iter()
            .all(|chunk| matches!(chunk, SigChunk::Const(_)))
    }

    /// The signal's value as an unsigned integer, when it is fully constant
    /// and every bit is defined.
    pub fn try_as_u64(&self) -> Option<u64> {
        let mut bits = Vec::with_capacity(self.width());
        for chunk in &self.chunks {
            match chunk {
                SigChunk::Const(c) => bits.extend_from_slice(c.bits()),
                SigChunk::Slice { .. } => return None,
            }
        }
        Const::new(bits).try_as_u64()
    }

    /// Bit `index` of the concatenation.
    pub fn bit(&self, index: usize) -> Option<SigBit> {
        let mut cursor = index;
        for chunk in &self.chunks {
            let w = chunk.width();
            if cursor < w {
                return Some(match chunk {
                    SigChunk::Const(c) => SigBit::Const(c.get(cursor)),
                    SigChunk::Slice { wire, offset, .. } => SigBit::Wire {
                        wire: *wire,
                        index: offset + cursor,
                    },
                });
            }
            cursor -= w;
        }
        None
    }

    /// Iterate over all bits, LSB first.
    pub fn bits(&self) -> impl Iterator<Item = SigBit> + '_ {
        self.chunks.iter().flat_map(|chunk| {
            (0..chunk.width()).map(move |i| match chunk {
                SigChunk::Const(c) => SigBit::Const(c.get(i)),
                SigChunk::Slice { wire, offset, .. } => SigBit::Wire {
                    wire: *wire,
                    index: offset + i,
                },
            })
        })
    }

    /// The sub-signal starting at bit `offset`, `width` bits long. Chunks are
    /// split as needed; runs that stay inside one chunk stay one chunk.
    pub fn extract(&self, offset: usize, width: usize) -> SigSpec {
        let mut out: Vec<SigChunk> = Vec::new();
        let mut skip = offset;
        let mut want = width;
        for chunk in &self.chunks {
            let w = chunk.width();
            if skip >= w {
                skip -= w;
                continue;
            }
            if want == 0 {
                break;
            }
            let take = (w - skip).min(want);
            match chunk {
                SigChunk::Const(c) => {
                    let bits = (skip..skip + take).map(|i| c.get(i)).collect();
                    out.push(SigChunk::Const(Const::new(bits)));
                }
                SigChunk::Slice { wire, offset: o, .. } => {
                    out.push(SigChunk::Slice {
                        wire: *wire,
                        offset: o + skip,
                        width: take,
                    });
                }
            }
            skip = 0;
            want -= take;
        }
        SigSpec::new(out)
    }
}

impl From<Const> for SigSpec {
    fn from(c: Const) -> Self {
        SigSpec {
            chunks: vec![SigChunk::Const(c)],
        }
    }
}

impl From<SigBit> for SigSpec {
    fn from(bit: SigBit) -> Self {
        match bit {
            SigBit::Const(state) => Const::new(vec![state]).into(),
            SigBit::Wire { wire, index } => SigSpec::slice(wire, index, 1),
        }
    }
}
