/// Per-pixel class labels produced by region segmentation.
///
/// Same shape as the source image; every label lies in `[0, classes)`.
#[derive(Clone, Debug)]
pub struct LabelMap {
    pub width: usize,
    pub height: usize,
    /// Number of classes the labels were produced for.
    pub classes: u8,
    pub data: Vec<u8>,
}

impl LabelMap {
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Label at `(x, y)`; `None` outside the map.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Pixel count per class, indexed by label.
    ///
    /// Labels outside `[0, classes)` are ignored; a well-formed map has
    /// none.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes as usize];
        for &label in &self.data {
            if let Some(slot) = counts.get_mut(label as usize) {
                *slot += 1;
            }
        }
        counts
    }
}
