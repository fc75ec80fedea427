//! Slider-driven preview model.
//!
//! This is the state behind the interactive window, kept free of any GUI
//! types so it can be tested directly. A [`PreviewSession`] owns two buffers:
//!
//! - `original`: the baseline the sliders are applied to
//! - `display`: `original` with the current slider deltas applied
//!
//! Moving a slider re-renders `display` from `original`, so repeating a
//! slider value always gives the same pixels. One-shot actions (denoise,
//! region edits, overlay) run on `display`, then become the new `original`
//! with the sliders reset to neutral.
//!
//! Slider positions are unsigned and biased; the delta is `position - bias`:
//!
//! | Slider | Range | Bias |
//! |---|---|---|
//! | brightness | 0..=200 | 100 |
//! | hue | 0..=360 | 180 |
//! | saturation | 0..=200 | 100 |
//! | light | 0..=200 | 100 |
//!
//! [`Browser`] walks a whole catalogue with one preview at a time.

use crate::catalogue::Catalogue;
use crate::config::Config;
use crate::imaging::{ImageBackend, OperationError, Rect, operations};
use crate::preset::{self, Preset, PresetError};
use image::RgbImage;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error(transparent)]
    Preset(#[from] PresetError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slider {
    Brightness,
    Hue,
    Saturation,
    Light,
}

impl Slider {
    pub const ALL: [Slider; 4] = [
        Slider::Brightness,
        Slider::Hue,
        Slider::Saturation,
        Slider::Light,
    ];

    pub fn bias(self) -> u32 {
        match self {
            Slider::Hue => 180,
            _ => 100,
        }
    }

    pub fn range(self) -> RangeInclusive<u32> {
        0..=self.bias() * 2
    }

    pub fn label(self) -> &'static str {
        match self {
            Slider::Brightness => "Brightness",
            Slider::Hue => "Hue",
            Slider::Saturation => "Saturation",
            Slider::Light => "Light",
        }
    }
}

/// Biased slider positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sliders {
    brightness: u32,
    hue: u32,
    saturation: u32,
    light: u32,
}

impl Default for Sliders {
    fn default() -> Self {
        Self {
            brightness: Slider::Brightness.bias(),
            hue: Slider::Hue.bias(),
            saturation: Slider::Saturation.bias(),
            light: Slider::Light.bias(),
        }
    }
}

impl Sliders {
    pub fn get(&self, slider: Slider) -> u32 {
        match slider {
            Slider::Brightness => self.brightness,
            Slider::Hue => self.hue,
            Slider::Saturation => self.saturation,
            Slider::Light => self.light,
        }
    }

    /// Move a slider, clamping to its range.
    pub fn set(&mut self, slider: Slider, position: u32) {
        let position = position.min(*slider.range().end());
        match slider {
            Slider::Brightness => self.brightness = position,
            Slider::Hue => self.hue = position,
            Slider::Saturation => self.saturation = position,
            Slider::Light => self.light = position,
        }
    }

    /// Signed deltas for the current positions.
    pub fn to_preset(&self) -> Preset {
        let delta = |s: Slider| self.get(s) as i32 - s.bias() as i32;
        Preset::new(
            delta(Slider::Brightness),
            delta(Slider::Hue),
            delta(Slider::Saturation),
            delta(Slider::Light),
        )
    }

    /// Positions for `preset`, clamped to each slider's range.
    ///
    /// ```
    /// # use darkroom::preset::Preset;
    /// # use darkroom::preview::{Slider, Sliders};
    /// let s = Sliders::from_preset(&Preset::new(12, -500, 0, 150));
    /// assert_eq!(s.get(Slider::Brightness), 112);
    /// assert_eq!(s.get(Slider::Hue), 0);
    /// assert_eq!(s.get(Slider::Light), 200);
    /// ```
    pub fn from_preset(preset: &Preset) -> Self {
        let position = |s: Slider, delta: i32| {
            let max = *s.range().end() as i64;
            (i64::from(delta) + i64::from(s.bias())).clamp(0, max) as u32
        };
        Self {
            brightness: position(Slider::Brightness, preset.brightness),
            hue: position(Slider::Hue, preset.hue),
            saturation: position(Slider::Saturation, preset.saturation),
            light: position(Slider::Light, preset.light),
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

/// Apply slider deltas to a copy of `original`: brightness, then HSL.
pub fn rerender(original: &RgbImage, deltas: &Preset) -> RgbImage {
    let mut out = original.clone();
    if deltas.brightness != 0 {
        operations::brighten(&mut out, deltas.brightness);
    }
    if deltas.hue != 0 || deltas.saturation != 0 || deltas.light != 0 {
        operations::shift_hsl(&mut out, deltas.hue, deltas.saturation, deltas.light);
    }
    out
}

/// Input to the preview model.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    SliderChanged(Slider, u32),
    Denoise,
    WriteMetadata,
    Overlay(String),
    Remove(Rect),
    Brighten(Rect, i32),
    SavePreset,
    LoadPreset,
    Cull,
    Next,
    Quit,
}

/// What the caller should do after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Stay on this image.
    Continue,
    /// Stay, and show this status line.
    Notice(String),
    Culled,
    Advanced,
    Quit,
}

/// Preview state for one image.
#[derive(Debug, Clone)]
pub struct PreviewSession {
    source: PathBuf,
    original: RgbImage,
    display: RgbImage,
    sliders: Sliders,
}

impl PreviewSession {
    pub fn new(source: impl Into<PathBuf>, original: RgbImage) -> Self {
        Self {
            source: source.into(),
            display: original.clone(),
            original,
            sliders: Sliders::default(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn original(&self) -> &RgbImage {
        &self.original
    }

    pub fn display(&self) -> &RgbImage {
        &self.display
    }

    pub fn sliders(&self) -> &Sliders {
        &self.sliders
    }

    /// The buffer to commit back to the catalogue.
    pub fn into_display(self) -> RgbImage {
        self.display
    }

    fn set_sliders(&mut self, sliders: Sliders) {
        self.sliders = sliders;
        self.display = rerender(&self.original, &sliders.to_preset());
    }

    /// Run an action on the displayed buffer and make the result the new
    /// baseline.
    fn rebase(
        &mut self,
        op: impl FnOnce(&mut RgbImage) -> Result<(), OperationError>,
    ) -> Result<(), PreviewError> {
        let mut edited = self.display.clone();
        op(&mut edited)?;
        self.original = edited.clone();
        self.display = edited;
        self.sliders = Sliders::default();
        Ok(())
    }

    pub fn update(
        &mut self,
        message: Message,
        backend: &impl ImageBackend,
        config: &Config,
    ) -> Result<Outcome, PreviewError> {
        match message {
            Message::SliderChanged(slider, position) => {
                let mut sliders = self.sliders;
                sliders.set(slider, position);
                self.set_sliders(sliders);
            }
            Message::Denoise => {
                let params = config.denoise_params();
                self.rebase(|px| operations::denoise(backend, px, params))?;
            }
            Message::WriteMetadata => {
                let sidecar = operations::write_metadata(&self.display, &self.source)?;
                return Ok(Outcome::Notice(format!("Wrote {}", sidecar.display())));
            }
            Message::Overlay(text) => {
                let style = config.text_style();
                self.rebase(|px| operations::overlay_text(backend, px, &text, &style))?;
            }
            Message::Remove(rect) => {
                let params = config.inpaint_params();
                self.rebase(|px| operations::remove_region(backend, px, rect, params))?;
            }
            Message::Brighten(rect, delta) => {
                self.rebase(|px| operations::brighten_region(px, rect, delta))?;
            }
            Message::SavePreset => {
                let deltas = self.sliders.to_preset();
                preset::save(&deltas, &config.preset.path)?;
                return Ok(Outcome::Notice(format!("Saved preset {deltas}")));
            }
            Message::LoadPreset => {
                let loaded = preset::load(&config.preset.path)?;
                self.set_sliders(Sliders::from_preset(&loaded));
                return Ok(Outcome::Notice(format!("Loaded preset {loaded}")));
            }
            Message::Cull => return Ok(Outcome::Culled),
            Message::Next => return Ok(Outcome::Advanced),
            Message::Quit => return Ok(Outcome::Quit),
        }
        Ok(Outcome::Continue)
    }
}

/// Walks a catalogue one preview at a time.
///
/// `Next` commits the displayed buffer to the handle (marking it edited),
/// `Cull` marks it culled, and both move on. Handles that failed to decode
/// have no preview; only `Cull`, `Next` and `Quit` do anything for them.
pub struct Browser<B> {
    backend: B,
    config: Config,
    catalogue: Catalogue,
    index: usize,
    preview: Option<PreviewSession>,
    finished: bool,
    status: Option<String>,
}

impl<B: ImageBackend> Browser<B> {
    pub fn new(backend: B, config: Config, catalogue: Catalogue) -> Self {
        let mut browser = Self {
            backend,
            config,
            catalogue,
            index: 0,
            preview: None,
            finished: false,
            status: None,
        };
        browser.enter(0);
        browser
    }

    fn enter(&mut self, index: usize) {
        self.index = index;
        self.preview = None;
        match self.catalogue.get(index) {
            Some(handle) => {
                self.preview = handle
                    .pixels()
                    .map(|px| PreviewSession::new(handle.path(), px.clone()));
            }
            None => self.finished = true,
        }
    }

    fn advance(&mut self) {
        self.enter(self.index + 1);
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn into_catalogue(self) -> Catalogue {
        self.catalogue
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn preview(&self) -> Option<&PreviewSession> {
        self.preview.as_ref()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.catalogue.get(self.index).map(|h| h.path())
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// True once the walk has passed the last image or the user quit.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn update(&mut self, message: Message) {
        if self.finished {
            return;
        }
        self.status = None;

        let outcome = match self.preview.as_mut() {
            Some(preview) => match preview.update(message, &self.backend, &self.config) {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::warn!("{e}");
                    Outcome::Notice(e.to_string())
                }
            },
            None => match message {
                Message::Cull => Outcome::Culled,
                Message::Next => Outcome::Advanced,
                Message::Quit => Outcome::Quit,
                _ => Outcome::Notice("Image is not loaded".to_string()),
            },
        };

        match outcome {
            Outcome::Continue => {}
            Outcome::Notice(text) => self.status = Some(text),
            Outcome::Culled => {
                if let Some(handle) = self.catalogue.get_mut(self.index) {
                    handle.cull();
                }
                self.advance();
            }
            Outcome::Advanced => {
                if let (Some(preview), Some(handle)) =
                    (self.preview.take(), self.catalogue.get_mut(self.index))
                {
                    handle.commit(preview.into_display());
                }
                self.advance();
            }
            Outcome::Quit => self.finished = true,
        }
    }
}
