use imgui::{Condition, SliderFlags, Ui};

const PANEL_TITLE: &str = "Control properties";
const PANEL_LABEL: &str = "Flash Model of Color";
const PANEL_SIZE: [f32; 2] = [320.0, 120.0];
const INITIAL_PARAMS: ColorParams = ColorParams { red: 0.1, green: 0.5, blue: 0.0 };

/// Slider values, each kept within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorParams {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Default for ColorParams {
    fn default() -> Self {
        INITIAL_PARAMS
    }
}

impl ColorParams {
    pub fn clamped(self) -> Self {
        Self {
            red: unit(self.red),
            green: unit(self.green),
            blue: unit(self.blue),
        }
    }
}

fn unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

#[derive(Debug, Default)]
pub struct ColorControls {
    params: ColorParams,
}

impl ColorControls {
    pub fn new(params: ColorParams) -> Self {
        Self { params: params.clamped() }
    }

    pub fn params(&self) -> ColorParams {
        self.params
    }

    /// Declares the panel for this frame. Returns whether any slider moved.
    pub fn build(&mut self, ui: &Ui) -> bool {
        let mut params = self.params;

        let changed = ui.window(PANEL_TITLE)
            .size(PANEL_SIZE, Condition::FirstUseEver)
            .position([10.0, 10.0], Condition::FirstUseEver)
            .build(|| {
                ui.text(PANEL_LABEL);

                let mut changed = false;
                for (label, value) in [
                    ("Red", &mut params.red),
                    ("Green", &mut params.green),
                    ("Blue", &mut params.blue),
                ] {
                    changed |= ui.slider_config(label, 0.0f32, 1.0f32)
                        .flags(SliderFlags::ALWAYS_CLAMP)
                        .build(value);
                }
                changed
            }).unwrap_or(false);

        self.params = params.clamped();

        if changed {
            tracing::trace!(params = ?self.params, "color sliders moved");
        }

        changed
    }
}
