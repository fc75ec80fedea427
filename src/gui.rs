//! Preview window (cargo feature `gui`).
//!
//! A thin iced shell over [`Browser`]: sliders send
//! [`preview::Message::SliderChanged`], single keys trigger the one-shot
//! actions, and `g`/`r`/`m` open a prompt line for their arguments. Escape
//! closes an open prompt and otherwise acts like `n`. When the
//! walk finishes the catalogue is exported and the window closes.
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │ [2/5] shoots/dawn/002.jpg                 │
//! │                                           │
//! │                 (preview)                 │
//! │                                           │
//! │ Brightness ───────●───────                │
//! │ Hue        ───────●───────                │
//! │ Saturation ───────●───────                │
//! │ Light      ───────●───────                │
//! │ [ x y w h        ]                        │
//! │ status                                    │
//! └───────────────────────────────────────────┘
//! ```

use crate::export::{self, ExportOptions};
use crate::imaging::{Rect, RustBackend};
use crate::output;
use crate::preview::{self, Browser, Slider};
use crate::input::{clamp_delta, parse_ints};
use iced::widget::{column, container, row, slider, text, text_input};
use iced::{Element, Length, Subscription, Task, Theme, keyboard};

const KEY_HELP: &str = "[n]ext [c]ull [q]uit [d]enoise [i]nfo [s]ave preset [l]oad preset \
[g] text [r]emove [m]ask";

/// Open the preview window and block until it closes.
pub fn run(browser: Browser<RustBackend>) -> iced::Result {
    iced::application("darkroom", App::update, App::view)
        .subscription(App::subscription)
        .theme(App::theme)
        .centered()
        .run_with(move || App::new(browser))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prompt {
    Overlay,
    Remove,
    Region,
}

impl Prompt {
    fn placeholder(self) -> &'static str {
        match self {
            Prompt::Overlay => "text",
            Prompt::Remove => "x y w h",
            Prompt::Region => "x y w h delta",
        }
    }

    fn parse(self, input: &str) -> Result<preview::Message, String> {
        Ok(match self {
            Prompt::Overlay => preview::Message::Overlay(input.trim().to_string()),
            Prompt::Remove => {
                let [x, y, w, h] = parse_ints::<4>(input)?;
                preview::Message::Remove(Rect::new(x, y, w, h))
            }
            Prompt::Region => {
                let [x, y, w, h, d] = parse_ints::<5>(input)?;
                preview::Message::Brighten(Rect::new(x, y, w, h), clamp_delta(d))
            }
        })
    }
}

#[derive(Debug, Clone)]
enum Message {
    Preview(preview::Message),
    Key(char),
    Escape,
    PromptChanged(String),
    PromptSubmitted,
}

struct App {
    browser: Browser<RustBackend>,
    frame: Option<iced::widget::image::Handle>,
    prompt: Option<Prompt>,
    input: String,
    notice: Option<String>,
}

fn prompt_id() -> text_input::Id {
    text_input::Id::new("prompt")
}

fn frame_of(browser: &Browser<RustBackend>) -> Option<iced::widget::image::Handle> {
    browser.preview().map(|p| {
        let px = p.display();
        let rgba = ::image::DynamicImage::ImageRgb8(px.clone()).to_rgba8();
        iced::widget::image::Handle::from_rgba(px.width(), px.height(), rgba.into_raw())
    })
}

fn on_key(key: keyboard::Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    match key {
        keyboard::Key::Character(c) => c.chars().next().map(Message::Key),
        keyboard::Key::Named(keyboard::key::Named::Escape) => Some(Message::Escape),
        _ => None,
    }
}

impl App {
    fn new(browser: Browser<RustBackend>) -> (Self, Task<Message>) {
        let mut app = Self {
            frame: frame_of(&browser),
            browser,
            prompt: None,
            input: String::new(),
            notice: None,
        };
        let task = app.finish_if_done();
        (app, task)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Preview(msg) => self.dispatch(msg),
            Message::Key(c) => {
                let msg = match c {
                    'n' => preview::Message::Next,
                    'c' => preview::Message::Cull,
                    'q' => preview::Message::Quit,
                    'd' => preview::Message::Denoise,
                    'i' => preview::Message::WriteMetadata,
                    's' => preview::Message::SavePreset,
                    'l' => preview::Message::LoadPreset,
                    'g' | 'r' | 'm' => {
                        self.prompt = Some(match c {
                            'g' => Prompt::Overlay,
                            'r' => Prompt::Remove,
                            _ => Prompt::Region,
                        });
                        self.input.clear();
                        return text_input::focus(prompt_id());
                    }
                    _ => return Task::none(),
                };
                self.dispatch(msg)
            }
            Message::Escape => {
                if self.prompt.take().is_some() {
                    self.input.clear();
                    return Task::none();
                }
                self.dispatch(preview::Message::Next)
            }
            Message::PromptChanged(value) => {
                self.input = value;
                Task::none()
            }
            Message::PromptSubmitted => {
                let Some(prompt) = self.prompt.take() else {
                    return Task::none();
                };
                let input = std::mem::take(&mut self.input);
                match prompt.parse(&input) {
                    Ok(msg) => self.dispatch(msg),
                    Err(e) => {
                        self.notice = Some(output::format_input_error(&e));
                        Task::none()
                    }
                }
            }
        }
    }

    fn dispatch(&mut self, msg: preview::Message) -> Task<Message> {
        self.notice = None;
        self.browser.update(msg);
        self.frame = frame_of(&self.browser);
        self.finish_if_done()
    }

    /// Export and close once the browser has run out of images.
    fn finish_if_done(&mut self) -> Task<Message> {
        if !self.browser.is_finished() {
            return Task::none();
        }
        let options = ExportOptions::from_config(self.browser.config());
        match export::export(self.browser.backend(), self.browser.catalogue(), &options) {
            Ok(report) => {
                output::print_export_report(&report);
                iced::exit()
            }
            Err(e) => {
                log::error!("{e}");
                self.notice = Some(e.to_string());
                Task::none()
            }
        }
    }

    fn view(&self) -> Element<Message> {
        let total = self.browser.catalogue().len();
        let title = match self.browser.current_path() {
            Some(path) => format!(
                "[{}/{}] {}",
                self.browser.index() + 1,
                total,
                path.display()
            ),
            None => "Done".to_string(),
        };

        let picture: Element<Message> = match &self.frame {
            Some(handle) => iced::widget::image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => container(text("Not loaded"))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        };

        let sliders = Slider::ALL
            .iter()
            .fold(column![].spacing(6), |col, &s| {
                let position = self
                    .browser
                    .preview()
                    .map(|p| p.sliders().get(s))
                    .unwrap_or(s.bias());
                col.push(
                    row![
                        text(s.label()).width(Length::Fixed(100.0)),
                        slider(s.range(), position, move |v| {
                            Message::Preview(preview::Message::SliderChanged(s, v))
                        }),
                    ]
                    .spacing(10),
                )
            });

        let prompt = self.prompt.map(|p| {
            text_input(p.placeholder(), &self.input)
                .id(prompt_id())
                .on_input(Message::PromptChanged)
                .on_submit(Message::PromptSubmitted)
        });

        let status = self
            .notice
            .as_deref()
            .or(self.browser.status())
            .unwrap_or("");

        column![
            text(title).size(18),
            picture,
            sliders,
            text(KEY_HELP).size(14),
        ]
        .push_maybe(prompt)
        .push(text(status.to_string()).size(14))
        .spacing(12)
        .padding(16)
        .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        keyboard::on_key_press(on_key)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}
