//! Quality masking via bit-field extraction.
//!
//! Quality-control bands pack several independent flags into one integer.
//! A flag occupies a contiguous bit range `[from, to]` and is read with
//! `(value >> from) & ((1 << (to - from + 1)) - 1)`. Ranges that no
//! condition mentions are ignored.
//!
//! An incorrect range silently selects the wrong pixels: there is no way to
//! check a range against the producer's documented layout here.

use crate::expr::Image;
use crate::local::{LocalImage, RasterError};

use super::ImageTransform;

/// Extracts bits `from..=to` of `value`; [`BitRange`] guarantees `from <= to < 64`.
#[inline]
fn extract_bits(value: u64, from: u32, to: u32) -> u64 {
    debug_assert!(from <= to && to < 64);
    let width = to - from + 1;
    let mask = if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    };
    (value >> from) & mask
}

/// An inclusive bit range within a packed integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    from: u32,
    to: u32,
}

impl BitRange {
    /// Returns `None` unless `from <= to < 64`.
    pub fn new(from: u32, to: u32) -> Option<Self> {
        (from <= to && to < 64).then_some(Self { from, to })
    }

    /// A single bit.
    pub fn bit(bit: u32) -> Option<Self> {
        Self::new(bit, bit)
    }

    pub fn from(&self) -> u32 {
        self.from
    }

    pub fn to(&self) -> u32 {
        self.to
    }

    pub fn width(&self) -> u32 {
        self.to - self.from + 1
    }

    /// `(1 << width) - 1`
    pub fn mask(&self) -> u64 {
        extract_bits(u64::MAX, 0, self.width() - 1)
    }

    pub fn extract(&self, value: u64) -> u64 {
        extract_bits(value, self.from, self.to)
    }
}

/// How an extracted field is compared to its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Lte,
    Gte,
}

/// One accept condition on a bit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitCondition {
    pub range: BitRange,
    pub comparison: Comparison,
    pub threshold: u64,
}

impl BitCondition {
    pub fn new(range: BitRange, comparison: Comparison, threshold: u64) -> Self {
        Self {
            range,
            comparison,
            threshold,
        }
    }

    pub fn accepts(&self, value: u64) -> bool {
        let field = self.range.extract(value);
        match self.comparison {
            Comparison::Eq => field == self.threshold,
            Comparison::Lte => field <= self.threshold,
            Comparison::Gte => field >= self.threshold,
        }
    }

    /// Remote 0/1 image: `extract(qa) <op> threshold`.
    fn to_mask(&self, qa: &Image) -> Image {
        let field = qa
            .right_shift(self.range.from())
            .bitwise_and(self.range.mask() as i64);
        let threshold = self.threshold as f64;
        match self.comparison {
            Comparison::Eq => field.eq(threshold),
            Comparison::Lte => field.lte(threshold),
            Comparison::Gte => field.gte(threshold),
        }
    }
}

/// Masks pixels whose quality band fails any condition.
#[derive(Debug, Clone, PartialEq)]
pub struct QaMask {
    name: String,
    qa_band: String,
    /// When set, only this band is kept (the QA band is dropped).
    keep_band: Option<String>,
    conditions: Vec<BitCondition>,
}

// Ranges below are compile-time constants well inside 0..64.
fn range(from: u32, to: u32) -> BitRange {
    BitRange { from, to }
}

impl QaMask {
    pub fn new(name: &str, qa_band: &str, conditions: Vec<BitCondition>) -> Self {
        Self {
            name: name.to_string(),
            qa_band: qa_band.to_string(),
            keep_band: None,
            conditions,
        }
    }

    /// Keeps only `band` in the output, as `select(band).updateMask(...)` does.
    pub fn keeping_only(mut self, band: &str) -> Self {
        self.keep_band = Some(band.to_string());
        self
    }

    /// MODIS daytime LST: mandatory QA bits 0-1 <= 1, data quality bits
    /// 2-3 == 0, LST error bits 6-7 == 0. Bits 4-5 (emissivity) ignored.
    pub fn modis_lst_day() -> Self {
        Self::new(
            "modis_lst_day_qa",
            "QC_Day",
            vec![
                BitCondition::new(range(0, 1), Comparison::Lte, 1),
                BitCondition::new(range(2, 3), Comparison::Eq, 0),
                BitCondition::new(range(6, 7), Comparison::Eq, 0),
            ],
        )
        .keeping_only("LST_Day_1km")
    }

    /// MODIS night-time LST: only mandatory QA bits 0-1 == 0 are checked.
    pub fn modis_lst_night() -> Self {
        Self::new(
            "modis_lst_night_qa",
            "QC_Night",
            vec![BitCondition::new(range(0, 1), Comparison::Eq, 0)],
        )
        .keeping_only("LST_Night_1km")
    }

    /// Sentinel-2 `QA60`: opaque cloud bit 10 and cirrus bit 11 both clear.
    pub fn sentinel2_clouds() -> Self {
        Self::new(
            "sentinel2_cloud_mask",
            "QA60",
            vec![
                BitCondition::new(range(10, 10), Comparison::Eq, 0),
                BitCondition::new(range(11, 11), Comparison::Eq, 0),
            ],
        )
    }

    pub fn conditions(&self) -> &[BitCondition] {
        &self.conditions
    }

    /// True when the packed QA value passes every condition.
    pub fn accepts(&self, qa: u64) -> bool {
        self.conditions.iter().all(|c| c.accepts(qa))
    }
}

impl ImageTransform for QaMask {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, image: &Image) -> Image {
        let qa = image.select(&[self.qa_band.as_str()]);
        let mask = self
            .conditions
            .iter()
            .map(|c| c.to_mask(&qa))
            .reduce(|acc, m| acc.and(&m));

        let target = match &self.keep_band {
            Some(band) => image.select(&[band.as_str()]),
            None => image.clone(),
        };
        match mask {
            Some(mask) => target.update_mask(&mask),
            None => target,
        }
    }

    fn apply_local(&self, image: &LocalImage) -> Result<LocalImage, RasterError> {
        let qa = image.band(&self.qa_band)?;
        // Masked or negative QA values never pass.
        let keep: Vec<bool> = qa
            .values
            .iter()
            .zip(&qa.valid)
            .map(|(v, valid)| *valid && *v >= 0.0 && self.accepts(*v as u64))
            .collect();

        let mut out = match &self.keep_band {
            Some(band) => image.select(&[band.as_str()])?,
            None => image.clone(),
        };
        out.update_mask(&keep);
        Ok(out)
    }
}
