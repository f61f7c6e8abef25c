//! Widgets the overlay offers to mods. The renderer sits on the other side
//! of the `Ui` trait.

pub trait Ui {
    /// Returns whether the section is open.
    fn collapsing_header(&mut self, label: &str) -> bool;
    fn checkbox(&mut self, label: &str, value: &mut bool) -> bool;
    fn button(&mut self, label: &str) -> bool;
    fn slider_float(&mut self, label: &str, value: &mut f32, min: f32, max: f32) -> bool;
    fn slider_float3(&mut self, label: &str, value: &mut [f32; 3], min: f32, max: f32) -> bool;
    /// Read-only value display.
    fn value_float(&mut self, label: &str, value: f32);
    fn input_text(&mut self, label: &str, buffer: &mut String) -> bool;
    fn list_box(&mut self, label: &str, selected: &mut usize, items: &[String]) -> bool;
}

/// Float slider with a fixed range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slider {
    pub min: f32,
    pub max: f32,
    pub value: f32,
}

impl Slider {
    pub fn new(min: f32, max: f32, value: f32) -> Self {
        Self {
            min,
            max,
            value: value.clamp(min, max),
        }
    }

    /// Only user edits are clamped. Values pushed past the range by code
    /// (FOV compensation) are left alone.
    pub fn draw(&mut self, ui: &mut dyn Ui, label: &str) -> bool {
        let changed = ui.slider_float(label, &mut self.value, self.min, self.max);
        if changed {
            self.value = self.value.clamp(self.min, self.max);
        }
        changed
    }
}
