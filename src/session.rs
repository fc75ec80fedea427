//! Text-driven editing session.
//!
//! The session walks the catalogue one handle at a time. Each handle goes
//! through a small state machine:
//!
//! ```text
//! Ready(i) ──▶ Interacting(i) ──┬─ c ──▶ Culled(i)   ──▶ Ready(i+1) | Finished
//!                 ▲      │      ├─ n ──▶ Advanced(i) ──▶ Ready(i+1) | Finished
//!                 └──────┘      └─ q ──▶ Quit
//!              b h m s l d i g r
//! ```
//!
//! Commands are single characters read like a C++ `cin >>` stream: tokens are
//! whitespace separated and may share a line, so `b 20` and `b` followed by
//! `20` on the next line are equivalent. End of input counts as `q`.
//!
//! | Key | Prompt | Effect |
//! |---|---|---|
//! | `b` | `delta` | brightness shift |
//! | `h` | `h s l` | hue/saturation/lightness shift |
//! | `m` | `x y w h delta` | brighten a rectangle |
//! | `r` | `x y w h` | inpaint a rectangle away |
//! | `g` | `text` | overlay text |
//! | `d` | | denoise |
//! | `i` | | write `<file>.meta` channel means |
//! | `s` | | save this image's accumulated deltas as the preset |
//! | `l` | | load the preset and apply brightness then HSL |
//! | `c` | | cull and move on |
//! | `n` | | move on |
//! | `q` | | stop; remaining images are left untouched |

use crate::catalogue::{Catalogue, ImageHandle};
use crate::config::Config;
use crate::imaging::{ImageBackend, OperationError, Rect, operations};
use crate::input::clamp_delta;
use crate::output;
use crate::preset::{self, Preset, PresetError};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// One user command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Brightness,
    Hsl,
    Region,
    Remove,
    Overlay,
    Denoise,
    Metadata,
    SavePreset,
    LoadPreset,
    Cull,
    Next,
    Quit,
}

impl Command {
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'b' => Self::Brightness,
            'h' => Self::Hsl,
            'm' => Self::Region,
            'r' => Self::Remove,
            'g' => Self::Overlay,
            'd' => Self::Denoise,
            'i' => Self::Metadata,
            's' => Self::SavePreset,
            'l' => Self::LoadPreset,
            'c' => Self::Cull,
            'n' => Self::Next,
            'q' => Self::Quit,
            _ => return None,
        })
    }
}

/// Where the session is in its walk over the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Ready(usize),
    Interacting(usize),
    Culled(usize),
    Advanced(usize),
    Quit,
    Finished,
}

/// How the interaction with one image ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    Culled,
    Advanced,
    Quit,
}

/// Tally of a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Images that reached `Interacting`.
    pub visited: usize,
    pub culled: usize,
    /// True when the session ended with `q` or end of input.
    pub quit: bool,
}

/// Whitespace token reader over a line-oriented input.
///
/// Holds the current line and a cursor into it, so commands, numbers and
/// free text can all be taken from the same line.
pub struct Prompter<R, W> {
    input: R,
    output: W,
    line: String,
    pos: usize,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            line: String::new(),
            pos: 0,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }

    fn ask(&mut self, prompt: &str) -> io::Result<()> {
        write!(self.output, "{prompt}")?;
        self.output.flush()
    }

    fn rest(&self) -> &str {
        &self.line[self.pos..]
    }

    fn skip_space(&mut self) {
        let rest = self.rest();
        let blank = rest.len() - rest.trim_start().len();
        self.pos += blank;
    }

    fn discard_line(&mut self) {
        self.pos = self.line.len();
    }

    /// Replace the current line with the next one. Returns false at EOF.
    fn fill(&mut self) -> io::Result<bool> {
        self.line.clear();
        self.pos = 0;
        Ok(self.input.read_line(&mut self.line)? != 0)
    }

    /// Move the cursor to the next non-blank character, reading lines as
    /// needed. Returns false at EOF.
    fn next_nonblank(&mut self) -> io::Result<bool> {
        loop {
            self.skip_space();
            if self.pos < self.line.len() {
                return Ok(true);
            }
            if !self.fill()? {
                return Ok(false);
            }
        }
    }

    /// Next whitespace-separated token, or `None` at end of input.
    pub fn token(&mut self) -> io::Result<Option<String>> {
        if !self.next_nonblank()? {
            return Ok(None);
        }
        let rest = self.rest();
        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let token = rest[..len].to_string();
        self.pos += len;
        Ok(Some(token))
    }

    /// Next command character. Only one character is consumed, so `b20`
    /// reads as `b` then `20`.
    pub fn command(&mut self) -> io::Result<Option<char>> {
        if !self.next_nonblank()? {
            return Ok(None);
        }
        let c = self.rest().chars().next();
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        Ok(c)
    }

    /// Read `N` integer tokens. `Ok(None)` at end of input; `Ok(Some(Err))`
    /// when a token is not an integer, in which case the rest of the line is
    /// dropped.
    pub fn ints<const N: usize>(
        &mut self,
        prompt: &str,
    ) -> io::Result<Option<Result<[i64; N], String>>> {
        self.ask(prompt)?;
        let mut values = [0i64; N];
        for value in &mut values {
            let Some(token) = self.token()? else {
                return Ok(None);
            };
            match token.parse() {
                Ok(v) => *value = v,
                Err(_) => {
                    self.discard_line();
                    return Ok(Some(Err(format!("not an integer: {token:?}"))));
                }
            }
        }
        Ok(Some(Ok(values)))
    }

    /// Read free text: whatever is left on the current line, or the next
    /// line when nothing is left. Spacing inside the text is kept as typed.
    pub fn text(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.ask(prompt)?;
        self.skip_space();
        if self.pos >= self.line.len() && !self.fill()? {
            return Ok(None);
        }
        let text = self.rest().trim().to_string();
        self.discard_line();
        Ok(Some(text))
    }
}

/// Drives the text session over a catalogue.
pub struct Session<'a, B> {
    backend: &'a B,
    config: &'a Config,
    /// Last preset read from or written to disk.
    preset: Preset,
    /// Deltas applied to the current image by `b`, `h` and `l`.
    applied: Preset,
}

impl<'a, B: ImageBackend> Session<'a, B> {
    /// Create a session, reading the configured preset file.
    ///
    /// A missing or malformed preset is logged and replaced by zeros.
    pub fn new(backend: &'a B, config: &'a Config) -> Self {
        let preset = match preset::load(&config.preset.path) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Using default preset: {e}");
                Preset::default()
            }
        };
        Self::with_preset(backend, config, preset)
    }

    pub fn with_preset(backend: &'a B, config: &'a Config, preset: Preset) -> Self {
        Self {
            backend,
            config,
            preset,
            applied: Preset::default(),
        }
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    /// Run the whole session, reading commands from `input`.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        catalogue: &mut Catalogue,
        input: R,
        output: W,
    ) -> Result<SessionSummary, SessionError> {
        let mut prompter = Prompter::new(input, output);
        let mut summary = SessionSummary::default();
        let total = catalogue.len();
        let mut state = if total == 0 {
            SessionState::Finished
        } else {
            SessionState::Ready(0)
        };

        loop {
            state = match state {
                SessionState::Ready(i) => {
                    let Some(handle) = catalogue.get(i) else {
                        break;
                    };
                    prompter.say(&output::format_editing_header(i, total, handle))?;
                    self.applied = Preset::default();
                    SessionState::Interacting(i)
                }
                SessionState::Interacting(i) => {
                    let Some(handle) = catalogue.get_mut(i) else {
                        break;
                    };
                    summary.visited += 1;
                    match self.interact(handle, &mut prompter)? {
                        ImageOutcome::Culled => SessionState::Culled(i),
                        ImageOutcome::Advanced => SessionState::Advanced(i),
                        ImageOutcome::Quit => SessionState::Quit,
                    }
                }
                SessionState::Culled(i) | SessionState::Advanced(i) => {
                    if matches!(state, SessionState::Culled(_)) {
                        summary.culled += 1;
                    }
                    if i + 1 < total {
                        SessionState::Ready(i + 1)
                    } else {
                        SessionState::Finished
                    }
                }
                SessionState::Quit => {
                    summary.quit = true;
                    break;
                }
                SessionState::Finished => break,
            };
        }

        Ok(summary)
    }

    /// Accept commands for one handle until it is culled, skipped or the
    /// session is quit.
    pub fn interact<R: BufRead, W: Write>(
        &mut self,
        handle: &mut ImageHandle,
        prompter: &mut Prompter<R, W>,
    ) -> Result<ImageOutcome, SessionError> {
        loop {
            prompter.ask(output::COMMAND_MENU)?;
            let Some(c) = prompter.command()? else {
                return Ok(ImageOutcome::Quit);
            };
            let Some(command) = Command::from_char(c) else {
                continue;
            };
            match self.execute(command, handle, prompter)? {
                Some(outcome) => return Ok(outcome),
                None => continue,
            }
        }
    }

    /// Perform one command. `Some` ends the interaction with this image.
    fn execute<R: BufRead, W: Write>(
        &mut self,
        command: Command,
        handle: &mut ImageHandle,
        prompter: &mut Prompter<R, W>,
    ) -> Result<Option<ImageOutcome>, SessionError> {
        let backend = self.backend;
        let config = self.config;

        match command {
            Command::Brightness => {
                let Some(input) = prompter.ints::<1>("delta: ")? else {
                    return Ok(Some(ImageOutcome::Quit));
                };
                match input {
                    Ok([d]) => {
                        let d = clamp_delta(d);
                        if apply(handle, prompter, "brightness", |px| {
                            operations::brighten(px, d);
                            Ok(())
                        })? {
                            self.applied.brightness = self.applied.brightness.saturating_add(d);
                        }
                    }
                    Err(e) => prompter.say(&output::format_input_error(&e))?,
                }
            }
            Command::Hsl => {
                let Some(input) = prompter.ints::<3>("h s l: ")? else {
                    return Ok(Some(ImageOutcome::Quit));
                };
                match input {
                    Ok([h, s, l]) => {
                        let (h, s, l) = (clamp_delta(h), clamp_delta(s), clamp_delta(l));
                        if apply(handle, prompter, "hsl", |px| {
                            operations::shift_hsl(px, h, s, l);
                            Ok(())
                        })? {
                            self.applied.hue = self.applied.hue.saturating_add(h);
                            self.applied.saturation = self.applied.saturation.saturating_add(s);
                            self.applied.light = self.applied.light.saturating_add(l);
                        }
                    }
                    Err(e) => prompter.say(&output::format_input_error(&e))?,
                }
            }
            Command::Region => {
                let Some(input) = prompter.ints::<5>("x y w h delta: ")? else {
                    return Ok(Some(ImageOutcome::Quit));
                };
                match input {
                    Ok([x, y, w, h, d]) => {
                        let rect = Rect::new(x, y, w, h);
                        apply(handle, prompter, "region", |px| {
                            operations::brighten_region(px, rect, clamp_delta(d))
                        })?;
                    }
                    Err(e) => prompter.say(&output::format_input_error(&e))?,
                }
            }
            Command::Remove => {
                let Some(input) = prompter.ints::<4>("x y w h: ")? else {
                    return Ok(Some(ImageOutcome::Quit));
                };
                match input {
                    Ok([x, y, w, h]) => {
                        let rect = Rect::new(x, y, w, h);
                        apply(handle, prompter, "remove", |px| {
                            operations::remove_region(backend, px, rect, config.inpaint_params())
                        })?;
                    }
                    Err(e) => prompter.say(&output::format_input_error(&e))?,
                }
            }
            Command::Overlay => {
                let Some(text) = prompter.text("text: ")? else {
                    return Ok(Some(ImageOutcome::Quit));
                };
                let style = config.text_style();
                apply(handle, prompter, "overlay", |px| {
                    operations::overlay_text(backend, px, &text, &style)
                })?;
            }
            Command::Denoise => {
                apply(handle, prompter, "denoise", |px| {
                    operations::denoise(backend, px, config.denoise_params())
                })?;
            }
            Command::Metadata => match handle.pixels() {
                Some(px) => match operations::write_metadata(px, handle.path()) {
                    Ok(sidecar) => prompter.say(&output::format_metadata_written(&sidecar))?,
                    Err(e) => report_failure(prompter, "metadata", &e)?,
                },
                None => prompter.say(&output::format_not_loaded(handle))?,
            },
            Command::SavePreset => {
                match preset::save(&self.applied, &config.preset.path) {
                    Ok(()) => {
                        self.preset = self.applied;
                        prompter.say(&output::format_preset_saved(
                            &self.applied,
                            &config.preset.path,
                        ))?;
                    }
                    Err(e) => report_preset_failure(prompter, &e)?,
                }
            }
            Command::LoadPreset => {
                match preset::load(&config.preset.path) {
                    Ok(p) => self.preset = p,
                    Err(e) => report_preset_failure(prompter, &e)?,
                }
                self.apply_preset(handle, prompter)?;
            }
            Command::Cull => {
                handle.cull();
                return Ok(Some(ImageOutcome::Culled));
            }
            Command::Next => return Ok(Some(ImageOutcome::Advanced)),
            Command::Quit => return Ok(Some(ImageOutcome::Quit)),
        }

        Ok(None)
    }

    /// Apply the in-memory preset: brightness first, then HSL.
    ///
    /// A neutral preset is not applied, so it does not mark the image edited.
    fn apply_preset<R: BufRead, W: Write>(
        &mut self,
        handle: &mut ImageHandle,
        prompter: &mut Prompter<R, W>,
    ) -> Result<(), SessionError> {
        let p = self.preset;
        if p.is_neutral() {
            return Ok(());
        }
        if apply(handle, prompter, "preset", |px| {
            operations::brighten(px, p.brightness);
            operations::shift_hsl(px, p.hue, p.saturation, p.light);
            Ok(())
        })? {
            self.applied.brightness = self.applied.brightness.saturating_add(p.brightness);
            self.applied.hue = self.applied.hue.saturating_add(p.hue);
            self.applied.saturation = self.applied.saturation.saturating_add(p.saturation);
            self.applied.light = self.applied.light.saturating_add(p.light);
            prompter.say(&output::format_preset_applied(&p))?;
        }
        Ok(())
    }
}

/// Run an edit on the handle and tell the user when it did not happen.
///
/// Returns whether the edit was applied.
fn apply<R: BufRead, W: Write>(
    handle: &mut ImageHandle,
    prompter: &mut Prompter<R, W>,
    label: &str,
    op: impl FnOnce(&mut image::RgbImage) -> Result<(), OperationError>,
) -> Result<bool, SessionError> {
    match handle.edit(op) {
        Ok(true) => {
            log::debug!("Applied {label} to {}", handle.path().display());
            Ok(true)
        }
        Ok(false) => {
            prompter.say(&output::format_not_loaded(handle))?;
            Ok(false)
        }
        Err(e) => {
            report_failure(prompter, label, &e)?;
            Ok(false)
        }
    }
}

fn report_failure<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    label: &str,
    error: &OperationError,
) -> Result<(), SessionError> {
    log::debug!("{label} failed: {error}");
    prompter.say(&output::format_operation_error(label, error))?;
    Ok(())
}

fn report_preset_failure<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    error: &PresetError,
) -> Result<(), SessionError> {
    log::warn!("{error}");
    prompter.say(&output::format_preset_error(error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use image::{Rgb, RgbImage};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn grey(v: u8) -> RgbImage {
        RgbImage::from_pixel(8, 8, Rgb([v, v, v]))
    }

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.preset.path = dir.join("preset.txt");
        config.export.directory = dir.to_path_buf();
        config
    }

    fn catalogue_of(handles: Vec<ImageHandle>) -> Catalogue {
        let mut catalogue = Catalogue::new();
        for h in handles {
            catalogue.push(h);
        }
        catalogue
    }

    fn run(
        session: &mut Session<'_, MockBackend>,
        catalogue: &mut Catalogue,
        script: &str,
    ) -> (SessionSummary, String) {
        let mut out = Vec::new();
        let summary = session
            .run(catalogue, script.as_bytes(), &mut out)
            .unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    fn sample(catalogue: &Catalogue, i: usize) -> [u8; 3] {
        catalogue.get(i).unwrap().pixels().unwrap().get_pixel(0, 0).0
    }

    #[test]
    fn command_alphabet() {
        assert_eq!(Command::from_char('b'), Some(Command::Brightness));
        assert_eq!(Command::from_char('q'), Some(Command::Quit));
        assert_eq!(Command::from_char('r'), Some(Command::Remove));
        assert_eq!(Command::from_char('x'), None);
    }

    #[test]
    fn prompter_splits_tokens_across_lines() {
        let mut p = Prompter::new("b 20\n  n\n".as_bytes(), Vec::new());
        assert_eq!(p.command().unwrap(), Some('b'));
        assert_eq!(p.token().unwrap().as_deref(), Some("20"));
        assert_eq!(p.command().unwrap(), Some('n'));
        assert_eq!(p.command().unwrap(), None);
    }

    #[test]
    fn prompter_splits_glued_command_and_argument() {
        let mut p = Prompter::new("b20\n".as_bytes(), Vec::new());
        assert_eq!(p.command().unwrap(), Some('b'));
        assert_eq!(p.ints::<1>("").unwrap(), Some(Ok([20])));
    }

    #[test]
    fn prompter_text_takes_rest_of_line_or_next_line() {
        let mut p = Prompter::new("g hello there\ng\nsecond line\n".as_bytes(), Vec::new());
        assert_eq!(p.command().unwrap(), Some('g'));
        assert_eq!(p.text("").unwrap().as_deref(), Some("hello there"));
        assert_eq!(p.command().unwrap(), Some('g'));
        assert_eq!(p.text("").unwrap().as_deref(), Some("second line"));
    }

    #[test]
    fn prompter_text_keeps_inner_spacing() {
        let mut p = Prompter::new("g  Hello   world \n".as_bytes(), Vec::new());
        assert_eq!(p.command().unwrap(), Some('g'));
        assert_eq!(p.text("").unwrap().as_deref(), Some("Hello   world"));
        assert_eq!(p.command().unwrap(), None);
    }

    #[test]
    fn overlay_command_draws_text_as_typed() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![ImageHandle::from_pixels("a.jpg", Some(grey(10)))]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        run(&mut session, &mut catalogue, "g  two  spaces\ng\n  next   line\nn\n");

        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::DrawText("two  spaces".to_string()),
                RecordedOp::DrawText("next   line".to_string()),
            ]
        );
    }

    #[test]
    fn brightness_then_next_marks_edited() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![ImageHandle::from_pixels("a.jpg", Some(grey(100)))]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        let (summary, _) = run(&mut session, &mut catalogue, "b 20\nn\n");

        assert_eq!(sample(&catalogue, 0), [120, 120, 120]);
        assert!(catalogue.get(0).unwrap().is_edited());
        assert_eq!(summary.visited, 1);
        assert!(!summary.quit);
    }

    #[test]
    fn cull_advances_to_next_image() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![
            ImageHandle::from_pixels("a.jpg", Some(grey(10))),
            ImageHandle::from_pixels("b.jpg", Some(grey(10))),
        ]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        let (summary, out) = run(&mut session, &mut catalogue, "c\nb 5\nn\n");

        assert!(catalogue.get(0).unwrap().is_culled());
        assert_eq!(sample(&catalogue, 1), [15, 15, 15]);
        assert_eq!(summary.culled, 1);
        assert_eq!(summary.visited, 2);
        assert!(out.contains("a.jpg"));
        assert!(out.contains("b.jpg"));
    }

    #[test]
    fn quit_leaves_remaining_images_untouched() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![
            ImageHandle::from_pixels("a.jpg", Some(grey(10))),
            ImageHandle::from_pixels("b.jpg", Some(grey(10))),
        ]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        let (summary, out) = run(&mut session, &mut catalogue, "q\nb 50\n");

        assert!(summary.quit);
        assert_eq!(summary.visited, 1);
        assert_eq!(sample(&catalogue, 1), [10, 10, 10]);
        assert!(!out.contains("b.jpg"));
    }

    #[test]
    fn end_of_input_quits() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![ImageHandle::from_pixels("a.jpg", Some(grey(10)))]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        let (summary, _) = run(&mut session, &mut catalogue, "b 5\n");

        assert!(summary.quit);
        assert!(catalogue.get(0).unwrap().is_edited());
    }

    #[test]
    fn unknown_commands_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![ImageHandle::from_pixels("a.jpg", Some(grey(10)))]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        let (summary, _) = run(&mut session, &mut catalogue, "x z\nn\n");

        assert!(!summary.quit);
        assert!(!catalogue.get(0).unwrap().is_edited());
    }

    #[test]
    fn out_of_range_region_is_reported_and_session_continues() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![ImageHandle::from_pixels("a.jpg", Some(grey(10)))]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        let (summary, out) = run(&mut session, &mut catalogue, "m 4 4 10 10 50\nm 0 0 2 2 50\nn\n");

        assert!(out.contains("out of range"));
        assert!(!summary.quit);
        let px = catalogue.get(0).unwrap().pixels().unwrap();
        assert_eq!(px.get_pixel(1, 1).0, [60, 60, 60]);
        assert_eq!(px.get_pixel(2, 2).0, [10, 10, 10]);
    }

    #[test]
    fn region_with_overflowing_coordinates_is_out_of_range() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![ImageHandle::from_pixels("a.jpg", Some(grey(10)))]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        let (summary, out) = run(
            &mut session,
            &mut catalogue,
            "m 9223372036854775807 0 1 1 50\nr 0 9223372036854775807 1 1\nn\n",
        );

        assert_eq!(out.matches("out of range").count(), 2);
        assert!(!summary.quit);
        assert!(!catalogue.get(0).unwrap().is_edited());
        assert!(backend.get_operations().is_empty());
        assert_eq!(catalogue.get(0).unwrap().pixels().unwrap(), &grey(10));
    }

    #[test]
    fn bad_number_is_reported_and_line_dropped() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![ImageHandle::from_pixels("a.jpg", Some(grey(10)))]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        let (summary, out) = run(&mut session, &mut catalogue, "h 1 two 3 q\nn\n");

        assert!(out.contains("not an integer"));
        assert!(!summary.quit);
        assert!(!catalogue.get(0).unwrap().is_edited());
    }

    #[test]
    fn edits_on_undecoded_handle_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![ImageHandle::from_pixels("notes.txt", None)]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        let (_, out) = run(&mut session, &mut catalogue, "b 10\nd\nn\n");

        assert!(!catalogue.get(0).unwrap().is_edited());
        assert!(backend.get_operations().is_empty());
        assert!(out.contains("not loaded"));
    }

    #[test]
    fn backend_commands_use_configured_params() {
        let tmp = TempDir::new().unwrap();
        let mut config = config_in(tmp.path());
        config.denoise.radius = 2;
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![ImageHandle::from_pixels("a.jpg", Some(grey(10)))]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        run(&mut session, &mut catalogue, "d\nr 1 1 2 2\ng Hello world\nn\n");

        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Denoise { radius: 2 },
                RecordedOp::Inpaint {
                    masked: 4,
                    radius: 3
                },
                RecordedOp::DrawText("Hello world".to_string()),
            ]
        );
        assert!(catalogue.get(0).unwrap().is_edited());
    }

    #[test]
    fn metadata_command_writes_sidecar_without_editing() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let source = tmp.path().join("a.jpg");
        let mut catalogue = catalogue_of(vec![ImageHandle::from_pixels(&source, Some(grey(10)))]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        run(&mut session, &mut catalogue, "i\nn\n");

        let meta = std::fs::read_to_string(tmp.path().join("a.jpg.meta")).unwrap();
        assert_eq!(meta, "mean_b=10\nmean_g=10\nmean_r=10\n");
        assert!(!catalogue.get(0).unwrap().is_edited());
    }

    #[test]
    fn save_preset_writes_accumulated_deltas() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![ImageHandle::from_pixels("a.jpg", Some(grey(100)))]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        run(&mut session, &mut catalogue, "b 10\nb 2\nh 0 -30 5\ns\nn\n");

        let saved = preset::load(&config.preset.path).unwrap();
        assert_eq!(saved, Preset::new(12, 0, -30, 5));
        assert_eq!(session.preset(), saved);
    }

    #[test]
    fn load_preset_applies_brightness_then_hsl() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        preset::save(&Preset::new(20, 0, 0, 10), &config.preset.path).unwrap();
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![ImageHandle::from_pixels("a.jpg", Some(grey(100)))]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        run(&mut session, &mut catalogue, "l\nn\n");

        assert_eq!(sample(&catalogue, 0), [130, 130, 130]);
        assert!(catalogue.get(0).unwrap().is_edited());
    }

    #[test]
    fn failed_preset_load_keeps_previous_values() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        std::fs::write(&config.preset.path, "garbage").unwrap();
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![ImageHandle::from_pixels("a.jpg", Some(grey(100)))]);
        let mut session = Session::with_preset(&backend, &config, Preset::new(5, 0, 0, 0));

        let (_, out) = run(&mut session, &mut catalogue, "l\nn\n");

        assert!(out.contains("preset"));
        assert_eq!(session.preset(), Preset::new(5, 0, 0, 0));
        assert_eq!(sample(&catalogue, 0), [105, 105, 105]);
    }

    #[test]
    fn new_session_tolerates_missing_preset_file() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();

        let session = Session::new(&backend, &config);
        assert_eq!(session.preset(), Preset::default());
    }

    #[test]
    fn new_session_reads_preset_file() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        preset::save(&Preset::new(1, 2, 3, 4), &config.preset.path).unwrap();
        let backend = MockBackend::new();

        let session = Session::new(&backend, &config);
        assert_eq!(session.preset(), Preset::new(1, 2, 3, 4));
    }

    #[test]
    fn applied_deltas_reset_per_image() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let mut catalogue = catalogue_of(vec![
            ImageHandle::from_pixels(PathBuf::from("a.jpg"), Some(grey(100))),
            ImageHandle::from_pixels(PathBuf::from("b.jpg"), Some(grey(100))),
        ]);
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        run(&mut session, &mut catalogue, "b 10\nn\nb 3\ns\nn\n");

        assert_eq!(
            preset::load(&config.preset.path).unwrap(),
            Preset::new(3, 0, 0, 0)
        );
    }

    #[test]
    fn empty_catalogue_finishes_immediately() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let backend = MockBackend::new();
        let mut catalogue = Catalogue::new();
        let mut session = Session::with_preset(&backend, &config, Preset::default());

        let (summary, out) = run(&mut session, &mut catalogue, "b 10\n");

        assert_eq!(summary, SessionSummary::default());
        assert!(out.is_empty());
    }
}
