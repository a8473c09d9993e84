//! Word-addressed chip memory bus.

/// Memory as seen by DMA channels.
///
/// DMA on this class of hardware moves whole 16-bit words. Addresses are byte
/// addresses; bit 0 is ignored and the implementation wraps at its own size.
pub trait ChipBus {
    /// Read a big-endian word.
    fn read_word(&self, addr: u32) -> u16;

    /// Write a big-endian word.
    fn write_word(&mut self, addr: u32, value: u16);
}

/// Flat RAM that wraps on a power-of-two size.
///
/// Useful on its own for component tests and as the backing store for a
/// machine's chip RAM.
#[derive(Debug, Clone)]
pub struct WordRam {
    bytes: Vec<u8>,
    mask: u32,
}

impl WordRam {
    /// Create zeroed RAM. `size` is rounded up to a power of two.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(2).next_power_of_two();
        Self {
            bytes: vec![0; size],
            mask: (size - 1) as u32,
        }
    }

    /// Address mask for this RAM (size - 1).
    #[must_use]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Copy big-endian words into RAM starting at `addr`.
    pub fn load_words(&mut self, addr: u32, words: &[u16]) {
        for (i, &w) in words.iter().enumerate() {
            self.write_word(addr.wrapping_add(2 * i as u32), w);
        }
    }
}

impl ChipBus for WordRam {
    fn read_word(&self, addr: u32) -> u16 {
        let a = (addr & self.mask & !1) as usize;
        u16::from_be_bytes([self.bytes[a], self.bytes[a + 1]])
    }

    fn write_word(&mut self, addr: u32, value: u16) {
        let a = (addr & self.mask & !1) as usize;
        let [hi, lo] = value.to_be_bytes();
        self.bytes[a] = hi;
        self.bytes[a + 1] = lo;
    }
}
