use crate::ui::Slider;

/// Blends the game's base FOV with the user's offset and multiplier.
#[derive(Debug, Clone)]
pub struct FovBlender {
    pub offset: Slider,
    pub multiplier: Slider,
    last_multiplier: f32,
}

impl FovBlender {
    pub fn new(offset: f32, multiplier: f32) -> Self {
        let multiplier = Slider::new(0.0, 2.0, multiplier);

        Self {
            offset: Slider::new(-100.0, 100.0, offset),
            last_multiplier: multiplier.value,
            multiplier,
        }
    }

    /// FOV to apply on top of `base_fov`.
    ///
    /// A multiplier change would make the view jump, so the difference
    /// between the old and the new result is folded into the offset first.
    pub fn blend(&mut self, base_fov: f32) -> f32 {
        let new_value = base_fov * self.multiplier.value + self.offset.value;

        if self.multiplier.value != self.last_multiplier {
            let prev_value = base_fov * self.last_multiplier + self.offset.value;
            self.offset.value += prev_value - new_value;

            return base_fov * self.multiplier.value + self.offset.value;
        }

        new_value
    }

    pub fn last_multiplier(&self) -> f32 {
        self.last_multiplier
    }

    /// Marks the current multiplier as the one already compensated for.
    pub fn commit_multiplier(&mut self) {
        self.last_multiplier = self.multiplier.value;
    }
}
