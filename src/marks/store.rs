use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_MARK_SIZE, MARK_SIZE_MAX, MARK_SIZE_MIN};
use crate::models::{BorderColor, Mark};

/// Rendered bounding box of the image in client coordinates, after any
/// viewport zoom/pan has been applied by the presentation layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ImageRect {
    fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Ordered marks on the current image plus the defaults for the next one.
#[derive(Debug, Clone)]
pub struct MarkStore {
    marks: Vec<Mark>,
    mark_size: f64,
    border_color: BorderColor,
    pixels_per_unit: f64,
}

impl MarkStore {
    pub fn new(pixels_per_unit: f64) -> Self {
        Self {
            marks: Vec::new(),
            mark_size: DEFAULT_MARK_SIZE,
            border_color: BorderColor::default(),
            pixels_per_unit,
        }
    }

    pub fn restore(&mut self, marks: Vec<Mark>, mark_size: f64) {
        self.marks = marks;
        self.resize(mark_size);
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn mark_size(&self) -> f64 {
        self.mark_size
    }

    pub fn border_color(&self) -> BorderColor {
        self.border_color
    }

    /// Places a mark centred on the click point. Returns `None` without a usable
    /// image box.
    pub fn place_mark(
        &mut self,
        client_x: f64,
        client_y: f64,
        image: Option<ImageRect>,
        now_ms: i64,
    ) -> Option<Mark> {
        let rect = image.filter(ImageRect::is_usable)?;
        if !client_x.is_finite() || !client_y.is_finite() {
            return None;
        }

        let half = self.mark_size * self.pixels_per_unit / 2.0;
        let x_percent = ((client_x - rect.left) - half) / rect.width * 100.0;
        let y_percent = ((client_y - rect.top) - half) / rect.height * 100.0;

        // Two clicks inside the same millisecond still need distinct ids.
        let id = match self.marks.last() {
            Some(last) if last.id >= now_ms => last.id + 1,
            _ => now_ms,
        };

        let mark = Mark {
            id,
            x_percent,
            y_percent,
            size_units: self.mark_size,
            border_color: self.border_color,
        };
        self.marks.push(mark.clone());
        Some(mark)
    }

    pub fn undo_last(&mut self) -> Option<Mark> {
        self.marks.pop()
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }

    /// Changes the size used for marks placed from now on.
    pub fn resize(&mut self, size_units: f64) {
        if size_units.is_finite() {
            self.mark_size = size_units.clamp(MARK_SIZE_MIN, MARK_SIZE_MAX);
        }
    }

    pub fn set_border_color(&mut self, color: BorderColor) {
        self.border_color = color;
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> Option<ImageRect> {
        Some(ImageRect {
            left: 100.0,
            top: 50.0,
            width: 800.0,
            height: 400.0,
        })
    }

    #[test]
    fn place_mark_compensates_for_half_size() {
        let mut store = MarkStore::new(16.0);
        let mark = store.place_mark(532.0, 282.0, rect(), 1_000).unwrap();
        // size 4 -> 64px -> half 32px
        assert!((mark.x_percent - 50.0).abs() < 1e-9);
        assert!((mark.y_percent - 50.0).abs() < 1e-9);
        assert_eq!(mark.size_units, 4.0);
        assert_eq!(mark.border_color, BorderColor::Orange);
        assert_eq!(mark.id, 1_000);
    }

    #[test]
    fn place_mark_without_image_box_is_noop() {
        let mut store = MarkStore::new(16.0);
        assert!(store.place_mark(10.0, 10.0, None, 1).is_none());
        let degenerate = Some(ImageRect {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 10.0,
        });
        assert!(store.place_mark(10.0, 10.0, degenerate, 1).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut store = MarkStore::new(16.0);
        let a = store.place_mark(200.0, 200.0, rect(), 5).unwrap();
        let b = store.place_mark(300.0, 200.0, rect(), 5).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn undo_removes_only_latest_and_keeps_earlier_sizes() {
        let mut store = MarkStore::new(16.0);
        store.place_mark(200.0, 200.0, rect(), 1).unwrap();
        store.resize(10.0);
        store.set_border_color(BorderColor::Red);
        store.place_mark(300.0, 200.0, rect(), 2).unwrap();
        store.resize(12.0);
        let third = store.place_mark(400.0, 200.0, rect(), 3).unwrap();

        let popped = store.undo_last().unwrap();
        assert_eq!(popped, third);
        assert_eq!(store.len(), 2);
        assert_eq!(store.marks()[0].size_units, 4.0);
        assert_eq!(store.marks()[0].border_color, BorderColor::Orange);
        assert_eq!(store.marks()[1].size_units, 10.0);
        assert_eq!(store.marks()[1].border_color, BorderColor::Red);
    }

    #[test]
    fn undo_pops_marks_in_reverse_for_any_sequence() {
        for count in 1..=8 {
            let mut store = MarkStore::new(16.0);
            let mut placed = Vec::new();
            for i in 0..count {
                store.resize(4.0 + (i * 3 % 14) as f64);
                store.set_border_color(if i % 2 == 0 {
                    BorderColor::Orange
                } else {
                    BorderColor::Red
                });
                let x = 150.0 + 80.0 * i as f64;
                placed.push(store.place_mark(x, 250.0, rect(), 10).unwrap());
            }
            // Changing the size after placement never touches existing marks.
            store.resize(17.0);

            while let Some(expected) = placed.pop() {
                assert_eq!(store.undo_last(), Some(expected));
                assert_eq!(store.marks(), placed.as_slice(), "after undo with {count} marks");
            }
            assert!(store.is_empty());
            assert!(store.undo_last().is_none());
        }
    }

    #[test]
    fn undo_on_empty_store_is_noop() {
        let mut store = MarkStore::new(16.0);
        assert!(store.undo_last().is_none());
    }

    #[test]
    fn resize_clamps_to_slider_range() {
        let mut store = MarkStore::new(16.0);
        store.resize(1.0);
        assert_eq!(store.mark_size(), 4.0);
        store.resize(40.0);
        assert_eq!(store.mark_size(), 17.0);
    }
}
