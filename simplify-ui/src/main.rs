use std::env;
use std::time::Duration;

use eframe::{egui, Frame};
use egui::Context;
use serde::Deserialize;

use reqwest::blocking::Client;
use reqwest::Result;

use simplify_core::presenter::{display, Presenter, OUTPUT_LABEL};
use simplify_core::request::{ControlSpec, LENGTH_RATIO, LEVENSHTEIN_RATIO, VOCAB_SIZE, WORD_RANK_RATIO};
use simplify_core::{SimplificationRequest, Transform};

const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Subset of the `/v1/simplify` response the UI needs.
#[derive(Deserialize)]
struct SimplifyResponse {
    lines: Vec<String>,
}

#[derive(Deserialize)]
struct ModelStatus {
    ready: bool,
    path: String,
}

/// REST context holding a reusable blocking HTTP client.
struct RESTContext {
    client: Client,
    base_url: String,
}

impl RESTContext {
    /// Creates a new REST context with a timeout.
    ///
    /// The first simplification may download the model, so the timeout is
    /// much longer than a plain API call would need.
    fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Sends a POST request to `/v1/simplify` with the request as JSON.
    fn post_simplify(&self, request: &SimplificationRequest) -> Result<Vec<String>> {
        let response: SimplifyResponse = self.client
            .post(format!("{}/v1/simplify", self.base_url))
            .json(request)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(response.lines)
    }

    /// Sends a GET request to `/v1/model`.
    fn get_model(&self) -> Result<ModelStatus> {
        self.client
            .get(format!("{}/v1/model", self.base_url))
            .send()?
            .error_for_status()?
            .json()
    }
}

impl Transform for RESTContext {
    type Error = reqwest::Error;

    fn transform(&self, request: &SimplificationRequest) -> Result<Vec<String>> {
        self.post_simplify(request)
    }
}

/// Global UI state (MUST persist between frames in egui).
struct SimplifierUI {
    presenter: Presenter<RESTContext>,

    /// Text being typed; committed to `request` when the editor loses focus.
    draft: String,
    request: SimplificationRequest,

    /// Request behind `output`, to only render again when a control changed.
    rendered: Option<SimplificationRequest>,
    /// Whether `output` holds an error rather than simplified lines.
    failed: bool,
    output: String,
    model_status: String,
}

impl SimplifierUI {
    /// Initializes the UI with every control at its default.
    fn new(rest: RESTContext) -> Self {
        let mut ui = Self {
            presenter: Presenter::new(rest),
            draft: String::new(),
            request: SimplificationRequest::default(),
            rendered: None,
            failed: false,
            output: String::new(),
            model_status: String::new(),
        };
        ui.get_model();
        ui
    }

    /// Performs the get model request.
    fn get_model(&mut self) {
        self.model_status = match self.presenter.transformer().get_model() {
            Ok(s) if s.ready => format!("Model ready ({})", s.path),
            Ok(s) => format!("Model not prepared yet, first run downloads it to {}", s.path),
            Err(e) => format!("Error: {e}"),
        };
    }

    /// Renders the output for the current controls.
    ///
    /// Identical requests are answered by the presenter cache, so this only
    /// reaches the server once per distinct tuple.
    fn render(&mut self) {
        if self.rendered.as_ref() == Some(&self.request) {
            return;
        }
        match self.presenter.render(&self.request) {
            Ok(lines) => {
                self.output = display(lines);
                self.failed = false;
            }
            Err(e) => {
                self.output = format!("Error: {e}");
                self.failed = true;
            }
        }
        self.rendered = Some(self.request.clone());
    }

    /// Lets the next `render` submit the same request again after a failure.
    fn retry(&mut self) {
        if self.failed {
            self.rendered = None;
        }
    }
}

/// Adds a labelled slider for a ratio control.
fn ratio_slider(ui: &mut egui::Ui, spec: &ControlSpec, value: &mut f64) {
    ui.label(spec.stage);
    ui.add(
        egui::Slider::new(value, spec.min..=spec.max)
            .step_by(spec.step)
            .fixed_decimals(2),
    );
    ui.end_row();
}

impl eframe::App for SimplifierUI {
    /// UI update loop (called every frame).
    fn update(&mut self, ctx: &Context, _: &mut Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("ACCESS simplification");
            ui.label(&*self.model_status);
            ui.separator();

            ui.label("Input text");
            let editor = ui.add(
                egui::TextEdit::multiline(&mut self.draft)
                    .desired_rows(6)
                    .desired_width(f32::INFINITY),
            );
            if editor.lost_focus() {
                self.request.text = self.draft.clone();
                self.retry();
            }

            egui::Grid::new("controls_grid")
                .num_columns(2)
                .spacing([20.0, 6.0])
                .striped(true)
                .show(ui, |ui| {
                    ratio_slider(ui, &LENGTH_RATIO, &mut self.request.length_ratio);
                    ratio_slider(ui, &LEVENSHTEIN_RATIO, &mut self.request.levenshtein_ratio);
                    ratio_slider(ui, &WORD_RANK_RATIO, &mut self.request.word_rank_ratio);

                    ui.label(VOCAB_SIZE.stage);
                    ui.add(
                        egui::Slider::new(
                            &mut self.request.vocab_size,
                            VOCAB_SIZE.min as u32..=VOCAB_SIZE.max as u32,
                        )
                        .step_by(VOCAB_SIZE.step),
                    );
                    ui.end_row();
                });

            if self.failed && ui.button("Retry").clicked() {
                self.retry();
            }

            // Any control change lands here on the same pass
            self.render();

            ui.separator();
            ui.heading(OUTPUT_LABEL);
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.label(&*self.output);
            });
        });
    }
}

/// Application entry point.
fn main() -> eframe::Result {
    env_logger::init();

    let base_url = env::var("SIMPLIFY_SERVER").unwrap_or_else(|_| DEFAULT_SERVER.to_owned());
    let timeout = env::var("SIMPLIFY_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    log::info!("using simplification server {base_url}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 560.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "simplify-ui",
        options,
        Box::new(move |_| {
            let rest = RESTContext::new(base_url, Duration::from_secs(timeout))?;
            Ok(Box::new(SimplifierUI::new(rest)))
        }),
    )
}
